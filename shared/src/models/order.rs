//! Order model and settlement classification

use serde::{Deserialize, Serialize};

/// Order workflow status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OnTheWay,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OnTheWay => "on_the_way",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "on_the_way" => Some(Self::OnTheWay),
            "delivered" => Some(Self::Delivered),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Delivered and cancelled are settled outcomes; completed is terminal.
    pub fn is_settled_outcome(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// Modifier applied to a line item (extras, variantes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineModifier {
    pub name: String,
    /// Price delta per unit, may be negative
    #[serde(default)]
    pub price_delta: f64,
}

/// Canonical line item shape.
///
/// Prices are snapshots captured at order-creation time and are never
/// recomputed from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    /// Unit price at creation time
    pub unit_price: f64,
    /// Optional modifiers list (normalized from legacy field spellings)
    #[serde(default)]
    pub modifiers: Option<Vec<LineModifier>>,
}

impl LineItem {
    /// quantity × (unit_price + Σ modifier deltas)
    pub fn line_total(&self) -> f64 {
        let modifier_sum: f64 = self
            .modifiers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|m| m.price_delta)
            .sum();
        self.quantity * (self.unit_price + modifier_sum)
    }
}

/// Derived settlement state: the single source of truth for every view
/// that lists orders. Re-derived on every read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Settlement {
    /// In the live workflow, not yet delivered or cancelled
    Active,
    /// Delivered/cancelled outcome, not yet folded into a closed session
    PendingSettlement,
    /// Locked inside a closed financial record
    Settled {
        /// Closing session id; None only for pre-migration rows that were
        /// completed without a reference
        settlement_ref: Option<String>,
    },
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    /// Owning session; None only on legacy rows
    pub session_id: Option<String>,
    pub status: OrderStatus,
    /// Monetary snapshot, fixed at creation
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItem>,
    /// Settlement marker: the id of the session whose close settled this order
    pub settlement_ref: Option<String>,
    /// When the settlement marker was stamped (Unix millis)
    pub settled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Classify the order's settlement state.
    ///
    /// `settlement_ref` is the one marker that survives the legacy-schema
    /// migration; a `completed` status without a ref (pre-migration rows that
    /// slipped past it) still counts as settled, falling back to `session_id`
    /// as the reference. NULL and empty-string markers are equivalently absent.
    pub fn settlement(&self) -> Settlement {
        if let Some(reference) = non_empty(self.settlement_ref.as_deref()) {
            return Settlement::Settled {
                settlement_ref: Some(reference.to_string()),
            };
        }
        if self.status == OrderStatus::Completed {
            return Settlement::Settled {
                settlement_ref: non_empty(self.session_id.as_deref()).map(str::to_string),
            };
        }
        if self.status.is_settled_outcome() {
            Settlement::PendingSettlement
        } else {
            Settlement::Active
        }
    }

    /// Owning session reference for a settled order, None otherwise.
    pub fn owning_settlement_ref(&self) -> Option<String> {
        match self.settlement() {
            Settlement::Settled { settlement_ref } => settlement_ref,
            _ => None,
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Create order payload. Item prices are taken as submitted and snapshotted;
/// the server computes line and order totals from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus, settlement_ref: Option<&str>) -> Order {
        Order {
            id: "o1".into(),
            tenant_id: "t1".into(),
            session_id: Some("s1".into()),
            status,
            total: 10.0,
            payment_method: PaymentMethod::Cash,
            items: vec![],
            settlement_ref: settlement_ref.map(str::to_string),
            settled_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn classification_follows_status_then_marker() {
        let mut o = order(OrderStatus::Ready, None);
        assert_eq!(o.settlement(), Settlement::Active);

        o.status = OrderStatus::Delivered;
        assert_eq!(o.settlement(), Settlement::PendingSettlement);

        o.settlement_ref = Some("s1".into());
        assert_eq!(
            o.settlement(),
            Settlement::Settled {
                settlement_ref: Some("s1".into())
            }
        );
    }

    #[test]
    fn classification_is_order_independent() {
        // Marker first, then status change: same terminal classification
        let mut o = order(OrderStatus::Ready, Some("s1"));
        assert!(matches!(o.settlement(), Settlement::Settled { .. }));
        o.status = OrderStatus::Delivered;
        assert!(matches!(o.settlement(), Settlement::Settled { .. }));
    }

    #[test]
    fn empty_marker_is_absent() {
        let o = order(OrderStatus::Delivered, Some("  "));
        assert_eq!(o.settlement(), Settlement::PendingSettlement);
    }

    #[test]
    fn completed_without_ref_falls_back_to_session() {
        let o = order(OrderStatus::Completed, None);
        assert_eq!(
            o.settlement(),
            Settlement::Settled {
                settlement_ref: Some("s1".into())
            }
        );
    }

    #[test]
    fn cancelled_is_pending_settlement() {
        let o = order(OrderStatus::Cancelled, None);
        assert_eq!(o.settlement(), Settlement::PendingSettlement);
    }

    #[test]
    fn line_total_includes_modifiers() {
        let item = LineItem {
            product_id: None,
            name: "Pizza".into(),
            quantity: 2.0,
            unit_price: 10.0,
            modifiers: Some(vec![
                LineModifier {
                    name: "Extra queso".into(),
                    price_delta: 1.5,
                },
                LineModifier {
                    name: "Sin cebolla".into(),
                    price_delta: 0.0,
                },
            ]),
        };
        assert!((item.line_total() - 23.0).abs() < f64::EPSILON);
    }
}

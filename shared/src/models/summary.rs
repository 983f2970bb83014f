//! Financial summary types (derived, never persisted)

use serde::{Deserialize, Serialize};

use super::PaymentMethod;

/// Per-payment-method totals. Every known method is present, defaulting to 0,
/// so downstream formatting never has to null-check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub card: f64,
    #[serde(default)]
    pub transfer: f64,
}

impl PaymentBreakdown {
    pub fn add(&mut self, method: PaymentMethod, amount: f64) {
        match method {
            PaymentMethod::Cash => self.cash += amount,
            PaymentMethod::Card => self.card += amount,
            PaymentMethod::Transfer => self.transfer += amount,
        }
    }

    /// Highest-grossing method; ties broken by declaration order
    /// (cash, card, transfer).
    pub fn top_method(&self) -> PaymentMethod {
        let mut top = (PaymentMethod::Cash, self.cash);
        for candidate in [
            (PaymentMethod::Card, self.card),
            (PaymentMethod::Transfer, self.transfer),
        ] {
            if candidate.1 > top.1 {
                top = candidate;
            }
        }
        top.0
    }
}

/// Aggregated figures for a session or date range. Always recomputed from
/// source rows to avoid drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_sales: f64,
    pub total_expenses: f64,
    pub by_payment: PaymentBreakdown,
    pub order_count: usize,
    pub order_ids: Vec<String>,
    /// total_sales / max(order_count, 1)
    pub avg_ticket: f64,
    pub top_payment_method: PaymentMethod,
}

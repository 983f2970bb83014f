//! Cash session model (turno de caja)

use serde::{Deserialize, Serialize};

/// Session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Cash session: a bounded register shift that orders and expenses bind to.
///
/// `expected_amount`, `declared_amount` and `difference` are set exactly once
/// at close time and are historical facts afterwards: reopening an order never
/// rewrites them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Assigned employee; None means the owner operates the register directly
    pub employee_id: Option<String>,
    /// Session status
    #[serde(default)]
    pub estado: SessionStatus,
    /// Starting cash float, immutable after open
    pub initial_float: f64,
    /// Computed at close: initial_float + cash-relevant sales − expenses
    pub expected_amount: Option<f64>,
    /// Counted by the operator at close
    pub declared_amount: Option<f64>,
    /// declared − expected (negative = shortage, positive = surplus)
    pub difference: Option<f64>,
    /// Open time (Unix millis)
    pub opened_at: i64,
    /// Close time (Unix millis), None while open
    pub closed_at: Option<i64>,
}

impl CashSession {
    pub fn is_open(&self) -> bool {
        self.estado == SessionStatus::Open
    }
}

/// Open session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOpen {
    pub employee_id: Option<String>,
    #[serde(default)]
    pub initial_float: f64,
}

/// Close session payload (operator's counted cash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClose {
    pub declared_amount: f64,
}

//! Domain events for the change-notification seam
//!
//! Events are published best-effort: absence of a subscriber never blocks or
//! fails the operation that produced them.

use serde::{Deserialize, Serialize};

/// Event names emitted by the core
pub const SESSION_OPENED: &str = "session.opened";
pub const SESSION_CLOSED: &str = "session.closed";
pub const ORDER_CREATED: &str = "order.created";
pub const ORDER_REOPENED: &str = "order.reopened";

/// Domain event payload relayed to live dashboards.
///
/// `version` is a per-resource monotonic counter so subscribers can tell
/// stale data from fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event: String,
    pub tenant_id: String,
    pub resource_id: String,
    pub version: u64,
    pub timestamp: i64,
    pub data: Option<serde_json::Value>,
}

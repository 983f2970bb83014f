//! 审计日志
//!
//! Append-only trail of financially relevant actions. Writes flow through
//! an mpsc channel to a background worker, except the order `CREATED` head
//! entry which is written inside the order-creation transaction.

pub mod service;
pub mod types;
pub mod worker;

pub use service::AuditService;
pub use types::{AuditAction, AuditEntry, NewAuditEntry};
pub use worker::spawn_audit_worker;

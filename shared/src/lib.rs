//! Shared types for Caja Server
//!
//! Domain models, domain events and small utilities used by the server
//! and by API consumers. Pure data types, no I/O.

pub mod event;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use event::DomainEvent;

//! Database row models
//!
//! Flat `FromRow` representations of the ledger tables. Enum and JSON columns
//! are stored as TEXT; conversion into the `shared` domain models happens
//! here so repositories always hand typed models to callers.

pub mod expense;
pub mod order;
pub mod session;

pub use expense::ExpenseRow;
pub use order::OrderRow;
pub use session::SessionRow;

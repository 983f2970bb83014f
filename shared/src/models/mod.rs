//! Domain models

pub mod cash_session;
pub mod expense;
pub mod order;
pub mod summary;

pub use cash_session::{CashSession, SessionClose, SessionOpen, SessionStatus};
pub use expense::{Expense, ExpenseCreate};
pub use order::{
    LineItem, LineModifier, Order, OrderCreate, OrderStatus, PaymentMethod, Settlement,
};
pub use summary::{FinancialSummary, PaymentBreakdown};

//! 对账汇总
//!
//! Pure aggregation over already-loaded orders and expenses. The same
//! function backs the session close algorithm, the blind/normal close
//! preview and the date-range reports, so every consumer sees identical
//! figures for the same input set.

use shared::models::{CashSession, Expense, FinancialSummary, Order, PaymentBreakdown};

/// Tolerance for comparing recorded against recomputed cash figures.
const DISCREPANCY_EPSILON: f64 = 0.005;

/// Aggregate a set of orders and expenses into a financial summary.
///
/// Callers choose the input set (delivered orders of a session, or
/// settled-outcome orders of a date range); this function never filters.
pub fn summarize(orders: &[Order], expenses: &[Expense]) -> FinancialSummary {
    let mut by_payment = PaymentBreakdown::default();
    let mut total_sales = 0.0;
    let mut order_ids = Vec::with_capacity(orders.len());

    for order in orders {
        total_sales += order.total;
        by_payment.add(order.payment_method, order.total);
        order_ids.push(order.id.clone());
    }

    let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();
    let order_count = orders.len();
    let avg_ticket = if order_count > 0 {
        total_sales / order_count as f64
    } else {
        0.0
    };
    let top_payment_method = by_payment.top_method();

    FinancialSummary {
        total_sales,
        total_expenses,
        by_payment,
        order_count,
        order_ids,
        avg_ticket,
        top_payment_method,
    }
}

/// Cash expected in the drawer at close time.
///
/// expected = initial float + cash-relevant sales − expenses paid from the
/// drawer. The caller decides which sales are cash-relevant; here the full
/// sales figure is used because card and transfer totals are reported
/// separately in the breakdown.
pub fn expected_amount(initial_float: f64, total_sales: f64, total_expenses: f64) -> f64 {
    initial_float + total_sales - total_expenses
}

/// Whether a closed session's recorded figures no longer match a fresh
/// aggregation over its orders. After an admin reopen followed by edits or
/// cancellations the two diverge; the record is never rewritten, readers get
/// this flag instead.
pub fn close_diverges(session: &CashSession, live: &FinancialSummary) -> bool {
    let Some(recorded) = session.expected_amount else {
        return false;
    };
    let live_expected = expected_amount(session.initial_float, live.total_sales, live.total_expenses);
    (recorded - live_expected).abs() > DISCREPANCY_EPSILON
}

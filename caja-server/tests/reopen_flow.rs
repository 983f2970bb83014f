//! 管理员重开测试
//!
//! 重开只动订单的结算标记，已关班次的记录一个字节都不能变。

use caja_server::{AppError, Config, CurrentUser, ServerState};
use shared::models::{
    LineItem, OrderCreate, OrderStatus, PaymentMethod, SessionClose, SessionOpen, Settlement,
};
use sqlx::sqlite::SqlitePoolOptions;

async fn test_state() -> ServerState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    caja_server::db::MIGRATOR.run(&pool).await.expect("migrations");

    let config = Config {
        work_dir: ".".to_string(),
        http_port: 0,
        timezone: chrono_tz::Europe::Madrid,
        environment: "test".to_string(),
        audit_buffer_size: 64,
        log_to_file: false,
    };
    let state = ServerState::with_pool(config, pool);
    state.start_background_tasks();
    state
}

fn cashier() -> CurrentUser {
    CurrentUser {
        tenant_id: "t1".to_string(),
        id: "emp-1".to_string(),
        display_name: "Ana".to_string(),
        is_admin: false,
    }
}

fn admin() -> CurrentUser {
    CurrentUser {
        tenant_id: "t1".to_string(),
        id: "emp-9".to_string(),
        display_name: "Marta".to_string(),
        is_admin: true,
    }
}

/// Open a session, deliver one 40.0 order, close with the given declaration.
/// Returns (session_id, order_id).
async fn settled_order(state: &ServerState, declared: f64) -> (String, String) {
    let user = cashier();
    let session = state
        .sessions
        .open(
            &user,
            SessionOpen {
                employee_id: None,
                initial_float: 100.0,
            },
        )
        .await
        .unwrap();

    let order = state
        .orders
        .create(
            &user,
            OrderCreate {
                items: vec![LineItem {
                    product_id: None,
                    name: "Menu del dia".to_string(),
                    quantity: 1.0,
                    unit_price: 40.0,
                    modifiers: None,
                }],
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
    state
        .orders
        .update_status(&user, &order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    state
        .sessions
        .close(
            &user,
            SessionClose {
                declared_amount: declared,
            },
        )
        .await
        .unwrap();

    (session.id, order.id)
}

#[tokio::test]
async fn reopen_requires_admin() {
    let state = test_state().await;
    let (_, order_id) = settled_order(&state, 140.0).await;

    let err = state.orders.reopen(&cashier(), &order_id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
}

#[tokio::test]
async fn reopen_of_unsettled_order_is_rejected() {
    let state = test_state().await;
    let user = cashier();
    state
        .sessions
        .open(
            &user,
            SessionOpen {
                employee_id: None,
                initial_float: 0.0,
            },
        )
        .await
        .unwrap();
    let order = state
        .orders
        .create(
            &user,
            OrderCreate {
                items: vec![LineItem {
                    product_id: None,
                    name: "Cafe".to_string(),
                    quantity: 1.0,
                    unit_price: 2.0,
                    modifiers: None,
                }],
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();

    let err = state.orders.reopen(&admin(), &order.id).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn reopen_clears_marker_and_preserves_session_record() {
    let state = test_state().await;
    let (session_id, order_id) = settled_order(&state, 140.0).await;

    let before = state.sessions.get("t1", &session_id).await.unwrap();

    let reopened = state.orders.reopen(&admin(), &order_id).await.unwrap();
    assert_eq!(reopened.status, OrderStatus::Delivered);
    assert!(reopened.settlement_ref.is_none());
    assert!(reopened.settled_at.is_none());
    assert_eq!(reopened.settlement(), Settlement::PendingSettlement);

    // The closed session's figures are untouched, byte for byte
    let after = state.sessions.get("t1", &session_id).await.unwrap();
    assert_eq!(
        serde_json::to_value(&before).unwrap(),
        serde_json::to_value(&after).unwrap()
    );

    // The order is back in the self-healing pool
    let unsettled = state.orders.unsettled("t1").await.unwrap();
    assert_eq!(unsettled.len(), 1);
    assert_eq!(unsettled[0].id, order_id);
}

#[tokio::test]
async fn cancelling_a_reopened_order_surfaces_as_discrepancy() {
    let state = test_state().await;
    let (session_id, order_id) = settled_order(&state, 140.0).await;

    state.orders.reopen(&admin(), &order_id).await.unwrap();

    // Right after the reopen the order is still delivered: the live view
    // matches the recorded close (100 float + 40 sales).
    let (session, live) = state.sessions.summary_for("t1", &session_id).await.unwrap();
    assert!(!caja_server::reconcile::close_diverges(&session, &live));

    // Void the order. The live view drops the sale, the recorded close keeps
    // expected 140: readers must now see the divergence flag.
    state
        .orders
        .update_status(&admin(), &order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let (session, live) = state.sessions.summary_for("t1", &session_id).await.unwrap();
    assert_eq!(live.total_sales, 0.0);
    assert_eq!(session.expected_amount, Some(140.0));
    assert!(caja_server::reconcile::close_diverges(&session, &live));
}

#[tokio::test]
async fn reopened_order_keeps_its_session_binding() {
    let state = test_state().await;
    let (session_id, order_id) = settled_order(&state, 140.0).await;

    state.orders.reopen(&admin(), &order_id).await.unwrap();

    // The order still belongs to its (closed) session; a later close of a
    // different session must not count it.
    let order = state.orders.get("t1", &order_id).await.unwrap();
    assert_eq!(order.settlement(), Settlement::PendingSettlement);
    assert_eq!(order.session_id.as_deref(), Some(session_id.as_str()));

    state
        .sessions
        .open(
            &cashier(),
            SessionOpen {
                employee_id: None,
                initial_float: 0.0,
            },
        )
        .await
        .unwrap();
    let outcome = state
        .sessions
        .close(
            &cashier(),
            SessionClose {
                declared_amount: 0.0,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.summary.order_count, 0);

    // Still pending, still visible in the healing pool
    let unsettled = state.orders.unsettled("t1").await.unwrap();
    assert_eq!(unsettled.len(), 1);
    assert_eq!(unsettled[0].id, order_id);
}

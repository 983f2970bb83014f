//! 订单绑定与审计轨迹测试

use std::time::Duration;

use caja_server::audit::AuditAction;
use caja_server::{AppError, Config, CurrentUser, ServerState};
use shared::models::{
    LineItem, LineModifier, OrderCreate, OrderStatus, PaymentMethod, SessionOpen, Settlement,
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

async fn open_session(state: &ServerState, user: &CurrentUser) -> String {
    state
        .sessions
        .open(
            user,
            SessionOpen {
                employee_id: None,
                initial_float: 100.0,
            },
        )
        .await
        .expect("open session")
        .id
}

fn two_pizzas() -> OrderCreate {
    OrderCreate {
        items: vec![LineItem {
            product_id: Some("p-1".to_string()),
            name: "Pizza".to_string(),
            quantity: 2.0,
            unit_price: 10.0,
            modifiers: Some(vec![LineModifier {
                name: "Extra queso".to_string(),
                price_delta: 1.5,
            }]),
        }],
        payment_method: PaymentMethod::Card,
    }
}

/// Audit appends go through the background worker; poll until they land.
async fn wait_for_trail(state: &ServerState, order_id: &str, len: usize) -> Vec<caja_server::audit::AuditEntry> {
    for _ in 0..50 {
        let trail = state.audit.trail("order", order_id).await.unwrap();
        if trail.len() >= len {
            return trail;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("audit trail for {order_id} never reached {len} entries");
}

#[tokio::test]
async fn create_requires_open_session() {
    let state = test_state().await;
    let err = state.orders.create(&cashier(), two_pizzas()).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)), "got {err:?}");
}

#[tokio::test]
async fn create_binds_order_and_computes_total() {
    let state = test_state().await;
    let user = cashier();
    let session_id = open_session(&state, &user).await;

    let order = state.orders.create(&user, two_pizzas()).await.unwrap();
    assert_eq!(order.session_id.as_deref(), Some(session_id.as_str()));
    assert_eq!(order.status, OrderStatus::Pending);
    // 2 × (10.0 + 1.5)
    assert!((order.total - 23.0).abs() < f64::EPSILON);
    assert_eq!(order.settlement(), Settlement::Active);
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let state = test_state().await;
    let user = cashier();
    open_session(&state, &user).await;

    let err = state
        .orders
        .create(
            &user,
            OrderCreate {
                items: vec![],
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn trail_head_is_always_created() {
    let state = test_state().await;
    let user = cashier();
    open_session(&state, &user).await;

    let order = state.orders.create(&user, two_pizzas()).await.unwrap();

    // The head is written in the creation transaction, no polling needed
    let trail = state.audit.trail("order", &order.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AuditAction::Created);
    assert_eq!(trail[0].operator_id.as_deref(), Some("emp-1"));

    state
        .orders
        .update_status(&user, &order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    let trail = wait_for_trail(&state, &order.id, 2).await;
    assert_eq!(trail[0].action, AuditAction::Created, "head must stay first");
    assert_eq!(trail[1].action, AuditAction::StatusChange);
}

#[tokio::test]
async fn completed_is_unreachable_through_status_endpoint() {
    let state = test_state().await;
    let user = cashier();
    open_session(&state, &user).await;
    let order = state.orders.create(&user, two_pizzas()).await.unwrap();

    let err = state
        .orders
        .update_status(&user, &order.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn terminal_orders_do_not_transition() {
    let state = test_state().await;
    let user = cashier();
    open_session(&state, &user).await;
    let order = state.orders.create(&user, two_pizzas()).await.unwrap();

    state
        .orders
        .update_status(&user, &order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let err = state
        .orders
        .update_status(&user, &order.id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn cancelled_orders_are_not_counted_by_close() {
    let state = test_state().await;
    let user = cashier();
    open_session(&state, &user).await;

    let delivered = state.orders.create(&user, two_pizzas()).await.unwrap();
    state
        .orders
        .update_status(&user, &delivered.id, OrderStatus::Delivered)
        .await
        .unwrap();

    let cancelled = state.orders.create(&user, two_pizzas()).await.unwrap();
    state
        .orders
        .update_status(&user, &cancelled.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let outcome = state
        .sessions
        .close(
            &user,
            shared::models::SessionClose {
                declared_amount: 123.0,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.summary.order_count, 1);
    assert_eq!(outcome.summary.order_ids, vec![delivered.id.clone()]);

    // The cancelled order keeps its status and never gains a marker
    let after = state.orders.get("t1", &cancelled.id).await.unwrap();
    assert_eq!(after.status, OrderStatus::Cancelled);
    assert!(after.settlement_ref.is_none());
}

#[tokio::test]
async fn unsettled_view_survives_session_close() {
    let state = test_state().await;
    let user = cashier();
    let session_id = open_session(&state, &user).await;

    let order = state.orders.create(&user, two_pizzas()).await.unwrap();
    state
        .orders
        .update_status(&user, &order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    let unsettled = state.orders.unsettled("t1").await.unwrap();
    assert_eq!(unsettled.len(), 1);
    assert_eq!(unsettled[0].settlement(), Settlement::PendingSettlement);

    state
        .sessions
        .close(
            &user,
            shared::models::SessionClose {
                declared_amount: 123.0,
            },
        )
        .await
        .unwrap();

    // Settled by the close, the pool is clean again
    assert!(state.orders.unsettled("t1").await.unwrap().is_empty());

    let settled = state.orders.get("t1", &order.id).await.unwrap();
    assert_eq!(
        settled.settlement(),
        Settlement::Settled {
            settlement_ref: Some(session_id)
        }
    );
}

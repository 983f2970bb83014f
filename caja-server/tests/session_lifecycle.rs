//! 班次生命周期测试
//!
//! 覆盖：单一开放班次、并发开班、关班金额计算、重复关班。

use caja_server::{AppError, Config, CurrentUser, ServerState};
use shared::models::{LineItem, OrderCreate, OrderStatus, PaymentMethod, SessionClose, SessionOpen};
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

fn cashier(tenant: &str) -> CurrentUser {
    CurrentUser {
        tenant_id: tenant.to_string(),
        id: "emp-1".to_string(),
        display_name: "Ana".to_string(),
        is_admin: false,
    }
}

fn open_req(float: f64) -> SessionOpen {
    SessionOpen {
        employee_id: None,
        initial_float: float,
    }
}

fn cash_item(name: &str, price: f64) -> LineItem {
    LineItem {
        product_id: None,
        name: name.to_string(),
        quantity: 1.0,
        unit_price: price,
        modifiers: None,
    }
}

async fn place_delivered_order(state: &ServerState, user: &CurrentUser, total: f64) -> String {
    let order = state
        .orders
        .create(
            user,
            OrderCreate {
                items: vec![cash_item("Menu", total)],
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .expect("create order");
    state
        .orders
        .update_status(user, &order.id, OrderStatus::Delivered)
        .await
        .expect("deliver order");
    order.id
}

#[tokio::test]
async fn second_open_conflicts() {
    let state = test_state().await;
    let user = cashier("t1");

    state.sessions.open(&user, open_req(100.0)).await.expect("first open");

    let err = state.sessions.open(&user, open_req(50.0)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn open_is_isolated_per_tenant() {
    let state = test_state().await;

    state
        .sessions
        .open(&cashier("t1"), open_req(100.0))
        .await
        .expect("tenant 1 open");
    state
        .sessions
        .open(&cashier("t2"), open_req(200.0))
        .await
        .expect("tenant 2 open");

    let t1 = state.sessions.current("t1").await.unwrap().unwrap();
    let t2 = state.sessions.current("t2").await.unwrap().unwrap();
    assert_ne!(t1.id, t2.id);
    assert_eq!(t1.initial_float, 100.0);
    assert_eq!(t2.initial_float, 200.0);
}

#[tokio::test]
async fn concurrent_opens_yield_exactly_one_session() {
    let state = test_state().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state.sessions.open(&cashier("t1"), open_req(100.0)).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1, "exactly one concurrent open may succeed");
    assert!(state.sessions.current("t1").await.unwrap().is_some());
}

#[tokio::test]
async fn negative_float_is_rejected() {
    let state = test_state().await;
    let err = state
        .sessions
        .open(&cashier("t1"), open_req(-1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn close_computes_expected_and_difference() {
    let state = test_state().await;
    let user = cashier("t1");

    let opened = state.sessions.open(&user, open_req(500.0)).await.unwrap();
    let order_a = place_delivered_order(&state, &user, 700.0).await;
    let order_b = place_delivered_order(&state, &user, 500.0).await;

    // 150 expense out of the drawer
    let expense = shared::models::Expense {
        id: "exp-1".to_string(),
        tenant_id: "t1".to_string(),
        session_id: opened.id.clone(),
        amount: 150.0,
        category: "supplies".to_string(),
        description: String::new(),
        created_at: shared::util::now_millis(),
    };
    caja_server::db::repository::expense::insert(&state.pool, &expense)
        .await
        .unwrap();

    let outcome = state
        .sessions
        .close(
            &user,
            SessionClose {
                declared_amount: 1540.0,
            },
        )
        .await
        .expect("close");

    // expected = 500 + 1200 - 150
    assert_eq!(outcome.session.expected_amount, Some(1550.0));
    assert_eq!(outcome.session.declared_amount, Some(1540.0));
    assert_eq!(outcome.session.difference, Some(-10.0));
    assert_eq!(outcome.summary.total_sales, 1200.0);
    assert_eq!(outcome.summary.total_expenses, 150.0);
    assert_eq!(outcome.summary.order_count, 2);
    assert!(outcome.unsettled_order_ids.is_empty());

    // Counted orders carry the closing session's marker
    for id in [&order_a, &order_b] {
        let order = state.orders.get("t1", id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.settlement_ref.as_deref(), Some(opened.id.as_str()));
        assert!(order.settled_at.is_some());
    }

    assert!(state.sessions.current("t1").await.unwrap().is_none());
}

#[tokio::test]
async fn close_without_open_session_is_rejected() {
    let state = test_state().await;
    let err = state
        .sessions
        .close(
            &cashier("t1"),
            SessionClose {
                declared_amount: 0.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn session_closes_only_once() {
    let state = test_state().await;
    let user = cashier("t1");
    state.sessions.open(&user, open_req(100.0)).await.unwrap();

    state
        .sessions
        .close(
            &user,
            SessionClose {
                declared_amount: 100.0,
            },
        )
        .await
        .unwrap();

    let err = state
        .sessions
        .close(
            &user,
            SessionClose {
                declared_amount: 100.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn close_preview_hides_expected_for_cashiers() {
    let state = test_state().await;
    let user = cashier("t1");
    state.sessions.open(&user, open_req(300.0)).await.unwrap();
    place_delivered_order(&state, &user, 50.0).await;

    let blind = state.sessions.close_preview("t1", false).await.unwrap();
    assert!(blind.expected_amount.is_none());
    assert_eq!(blind.summary.total_sales, 50.0);

    let revealed = state.sessions.close_preview("t1", true).await.unwrap();
    assert_eq!(revealed.expected_amount, Some(350.0));
}

//! 数据库启动与遗留标记迁移测试

use caja_server::db::{DbService, MIGRATOR, legacy_migration};
use sqlx::Row;
use sqlx::sqlite::SqlitePoolOptions;

#[tokio::test]
async fn db_service_creates_and_migrates_file_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("caja.db");
    let db = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("bootstrap");

    // Schema is in place
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&db.pool)
    .await
    .unwrap();
    for expected in ["cash_session", "orders", "expense", "audit_entry"] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }

    // Bootstrapping an existing database is a no-op, not an error
    db.pool.close().await;
    DbService::new(&db_path.to_string_lossy())
        .await
        .expect("re-open");
}

#[tokio::test]
async fn legacy_cash_cut_marker_is_folded_into_settlement_ref() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();

    // Recreate the pre-migration shape: dual closure signals
    sqlx::query("ALTER TABLE orders ADD COLUMN cash_cut_id TEXT")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO orders (id, tenant_id, session_id, status, total, payment_method, items, cash_cut_id, created_at, updated_at)
         VALUES
           ('o-cut', 't1', 's1', 'delivered', 10.0, 'cash', '[]', 'cut-7', 1000, 2000),
           ('o-completed', 't1', 's1', 'completed', 20.0, 'cash', '[]', NULL, 1000, 2000),
           ('o-live', 't1', 's1', 'delivered', 30.0, 'cash', '[]', '', 1000, 2000)",
    )
    .execute(&pool)
    .await
    .unwrap();

    legacy_migration::migrate_settlement_markers_if_needed(&pool)
        .await
        .expect("migration");

    let rows = sqlx::query("SELECT id, settlement_ref, settled_at FROM orders ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    let by_id: std::collections::HashMap<String, (Option<String>, Option<i64>)> = rows
        .into_iter()
        .map(|r| {
            (
                r.get::<String, _>("id"),
                (r.get("settlement_ref"), r.get("settled_at")),
            )
        })
        .collect();

    // Explicit cut id wins as the reference
    assert_eq!(by_id["o-cut"].0.as_deref(), Some("cut-7"));
    assert_eq!(by_id["o-cut"].1, Some(2000));
    // Completed-without-cut falls back to the owning session
    assert_eq!(by_id["o-completed"].0.as_deref(), Some("s1"));
    // Empty legacy marker means unsettled: untouched
    assert!(by_id["o-live"].0.is_none());
    assert!(by_id["o-live"].1.is_none());

    // The legacy column is gone, and a second run is a no-op
    let legacy_cols: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('orders') WHERE name = 'cash_cut_id'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(legacy_cols, 0);
    legacy_migration::migrate_settlement_markers_if_needed(&pool)
        .await
        .expect("idempotent");
}

//! One-time settlement marker migration.
//!
//! Earlier schema generations carried two independent closure signals on an
//! order: a `cash_cut_id` column and the `completed` status. Every read site
//! had to check both. The current schema keeps a single marker
//! (`settlement_ref`); this migration folds existing `cash_cut_id` values into
//! it and drops the legacy column.
//!
//! Runs at startup after SQLx migrations. A fresh database never has the
//! column, so this is a no-op except on databases restored from old backups.
//!
//! TODO: Remove this module once no deployments restore pre-2025 backups.

use sqlx::SqlitePool;

/// Run the settlement marker migration if the legacy column is present.
pub async fn migrate_settlement_markers_if_needed(pool: &SqlitePool) -> Result<(), String> {
    let has_legacy_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('orders') WHERE name = 'cash_cut_id'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| format!("Legacy column check failed: {e}"))?;

    if has_legacy_column == 0 {
        return Ok(());
    }

    tracing::info!("Legacy cash_cut_id column detected, folding into settlement_ref...");

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to begin migration transaction: {e}"))?;

    // Either signal meant "settled"; the explicit cut id wins as the reference.
    let folded = sqlx::query(
        "UPDATE orders
         SET settlement_ref = cash_cut_id,
             settled_at = COALESCE(settled_at, updated_at)
         WHERE (settlement_ref IS NULL OR settlement_ref = '')
           AND cash_cut_id IS NOT NULL AND cash_cut_id != ''",
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| format!("Failed to fold cash_cut_id: {e}"))?;

    // Completed orders that only ever had the status signal fall back to
    // their owning session as the reference.
    let backfilled = sqlx::query(
        "UPDATE orders
         SET settlement_ref = session_id,
             settled_at = COALESCE(settled_at, updated_at)
         WHERE (settlement_ref IS NULL OR settlement_ref = '')
           AND status = 'completed'
           AND session_id IS NOT NULL AND session_id != ''",
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| format!("Failed to backfill completed orders: {e}"))?;

    sqlx::query("ALTER TABLE orders DROP COLUMN cash_cut_id")
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to drop cash_cut_id column: {e}"))?;

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit marker migration: {e}"))?;

    tracing::info!(
        folded = folded.rows_affected(),
        backfilled = backfilled.rows_affected(),
        "Settlement marker migration completed"
    );
    Ok(())
}

//! Audit trail repository
//!
//! `append` is the only write primitive. It is generic over the executor so
//! the order-creation transaction can write the mandatory `CREATED` head
//! entry atomically with the order row.

use sqlx::{FromRow, SqlitePool};

use super::{RepoError, RepoResult};
use crate::audit::types::{AuditAction, AuditEntry, NewAuditEntry};

#[derive(Debug, FromRow)]
struct AuditRow {
    id: i64,
    tenant_id: String,
    resource_type: String,
    resource_id: String,
    action: String,
    details: String,
    operator_id: Option<String>,
    operator_name: Option<String>,
    timestamp: i64,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = RepoError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action = AuditAction::parse(&row.action).ok_or_else(|| {
            RepoError::Database(format!(
                "Unknown audit action '{}' on entry {}",
                row.action, row.id
            ))
        })?;
        let details = serde_json::from_str(&row.details)
            .map_err(|e| RepoError::Database(format!("Corrupt audit details: {e}")))?;
        Ok(AuditEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            action,
            details,
            operator_id: row.operator_id,
            operator_name: row.operator_name,
            timestamp: row.timestamp,
        })
    }
}

pub async fn append<'e, E>(executor: E, entry: &NewAuditEntry) -> RepoResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO audit_entry (tenant_id, resource_type, resource_id, action, details, operator_id, operator_name, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.tenant_id)
    .bind(&entry.resource_type)
    .bind(&entry.resource_id)
    .bind(entry.action.as_str())
    .bind(entry.details.to_string())
    .bind(&entry.operator_id)
    .bind(&entry.operator_name)
    .bind(entry.timestamp)
    .execute(executor)
    .await?;
    Ok(())
}

/// Full trail for one resource, oldest first (element 0 is the head).
pub async fn list_for_resource(
    pool: &SqlitePool,
    resource_type: &str,
    resource_id: &str,
) -> RepoResult<Vec<AuditEntry>> {
    let rows = sqlx::query_as::<_, AuditRow>(
        "SELECT id, tenant_id, resource_type, resource_id, action, details, operator_id, operator_name, timestamp
         FROM audit_entry WHERE resource_type = ? AND resource_id = ? ORDER BY id ASC",
    )
    .bind(resource_type)
    .bind(resource_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(AuditEntry::try_from).collect()
}

/// Recent entries for a tenant, newest first.
pub async fn list_for_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<AuditEntry>> {
    let rows = sqlx::query_as::<_, AuditRow>(
        "SELECT id, tenant_id, resource_type, resource_id, action, details, operator_id, operator_name, timestamp
         FROM audit_entry WHERE tenant_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(AuditEntry::try_from).collect()
}

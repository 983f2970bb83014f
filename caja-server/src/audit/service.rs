//! 审计日志服务
//!
//! `AuditService` 提供：
//! - 日志写入（通过 mpsc 通道异步接收，后台 worker 落盘）
//! - 日志查询（直接读取 SQLite）
//!
//! The channel sender blocks when the buffer is full; audit entries are
//! never dropped on the write path.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::types::{AuditEntry, NewAuditEntry};
use crate::db::repository::{RepoResult, audit};

/// 审计日志服务
///
/// 通过 mpsc 通道接收日志请求，异步写入 SQLite。
/// 查询操作直接读取数据库。
pub struct AuditService {
    pool: SqlitePool,
    tx: mpsc::Sender<NewAuditEntry>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    pub fn new(pool: SqlitePool, buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<NewAuditEntry>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let service = Arc::new(Self { pool, tx });
        (service, rx)
    }

    /// 异步记录审计日志（非阻塞）
    ///
    /// 通过 mpsc 通道发送到后台 worker。
    /// 如果通道满，阻塞等待（审计日志不允许丢失）。
    pub async fn log(&self, entry: NewAuditEntry) {
        if self.tx.send(entry).await.is_err() {
            tracing::error!("Audit log channel closed, audit entry lost!");
        }
    }

    /// 直接写入审计日志（用于启动/关闭等场景）
    pub async fn log_sync(&self, entry: &NewAuditEntry) -> RepoResult<()> {
        audit::append(&self.pool, entry).await
    }

    /// 查询某个资源的完整日志，最早的在前（首条为 CREATED 头）
    pub async fn trail(&self, resource_type: &str, resource_id: &str) -> RepoResult<Vec<AuditEntry>> {
        audit::list_for_resource(&self.pool, resource_type, resource_id).await
    }

    /// 查询租户最近的日志，最新的在前
    pub async fn recent(
        &self,
        tenant_id: &str,
        limit: i32,
        offset: i32,
    ) -> RepoResult<Vec<AuditEntry>> {
        audit::list_for_tenant(&self.pool, tenant_id, limit, offset).await
    }
}

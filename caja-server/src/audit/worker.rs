//! 审计日志后台 worker
//!
//! 从 mpsc 通道接收日志请求并写入 SQLite。
//! 收到关机信号后先排空通道再退出，保证已提交的日志不丢失。

use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::NewAuditEntry;
use crate::db::repository::audit;

pub fn spawn_audit_worker(
    pool: SqlitePool,
    mut rx: mpsc::Receiver<NewAuditEntry>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Audit worker started");
        loop {
            tokio::select! {
                entry = rx.recv() => {
                    match entry {
                        Some(entry) => write_entry(&pool, &entry).await,
                        None => {
                            tracing::info!("Audit channel closed, worker exiting");
                            return;
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Audit worker received shutdown signal, draining");
                    // 排空通道：已发送的日志必须落盘
                    rx.close();
                    while let Some(entry) = rx.recv().await {
                        write_entry(&pool, &entry).await;
                    }
                    tracing::info!("Audit worker drained and stopped");
                    return;
                }
            }
        }
    })
}

async fn write_entry(pool: &SqlitePool, entry: &NewAuditEntry) {
    if let Err(e) = audit::append(pool, entry).await {
        tracing::error!(
            "Failed to persist audit entry ({} {} {}): {}",
            entry.resource_type,
            entry.resource_id,
            entry.action,
            e
        );
    }
}

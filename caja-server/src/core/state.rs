use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditService, spawn_audit_worker};
use crate::core::Config;
use crate::db::DbService;
use crate::notify::ChangeNotifier;
use crate::orders::OrderBinder;
use crate::sessions::SessionManager;
use crate::utils::{AppError, AppResult};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | sessions | 班次生命周期 |
/// | orders | 订单绑定与重开 |
/// | audit | 审计日志服务 |
/// | notifier | 资源变更广播 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub sessions: SessionManager,
    pub orders: OrderBinder,
    pub audit: Arc<AuditService>,
    pub notifier: ChangeNotifier,
    /// 后台任务关机信号
    pub shutdown: CancellationToken,
    audit_rx: Arc<std::sync::Mutex<Option<tokio::sync::mpsc::Receiver<crate::audit::NewAuditEntry>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/caja.db)，跑迁移
    /// 3. 审计服务、通知器、班次与订单服务
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("caja.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        let pool = db_service.pool;

        Ok(Self::with_pool(config.clone(), pool))
    }

    /// 用现成的连接池构造状态（测试用）
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let (audit, audit_rx) = AuditService::new(pool.clone(), config.audit_buffer_size);
        let notifier = ChangeNotifier::default();
        let sessions = SessionManager::new(pool.clone(), audit.clone(), notifier.clone());
        let orders = OrderBinder::new(pool.clone(), audit.clone(), notifier.clone());

        Self {
            config,
            pool,
            sessions,
            orders,
            audit,
            notifier,
            shutdown: CancellationToken::new(),
            audit_rx: Arc::new(std::sync::Mutex::new(Some(audit_rx))),
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。启动的任务：
    /// - 审计日志 worker
    pub fn start_background_tasks(&self) {
        let rx = self
            .audit_rx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        match rx {
            Some(rx) => {
                spawn_audit_worker(self.pool.clone(), rx, self.shutdown.clone());
            }
            None => {
                tracing::warn!("Background tasks already started, skipping");
            }
        }
    }
}

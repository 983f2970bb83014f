//! Caja Server - 收银班次与订单对账引擎
//!
//! # 架构概述
//!
//! - **班次** (`sessions`): 每租户单一开放班次，开关班与现金对账
//! - **订单** (`orders`): 订单绑定班次，状态流转，管理员重开
//! - **对账** (`reconcile`): 纯聚合，班次与日期范围共用同一套数字
//! - **审计** (`audit`): 追加式日志，订单首条恒为 CREATED
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! caja-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # 网关身份提取
//! ├── sessions/      # 班次生命周期
//! ├── orders/        # 订单绑定与重开
//! ├── reconcile/     # 汇总计算
//! ├── audit/         # 审计服务与 worker
//! ├── notify/        # 资源变更广播
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 工具函数
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod reconcile;
pub mod sessions;
pub mod utils;

// Re-export 公共类型
pub use auth::CurrentUser;
pub use core::{Config, Server, ServerState};
pub use orders::OrderBinder;
pub use sessions::SessionManager;
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

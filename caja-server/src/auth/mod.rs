//! 认证授权模块
//!
//! Identity arrives through trusted gateway headers; the edge never sees
//! raw credentials. [`CurrentUser`] is the per-request operator context.

pub mod extractor;

use serde::{Deserialize, Serialize};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";
pub const EMPLOYEE_NAME_HEADER: &str = "x-employee-name";
pub const ROLE_HEADER: &str = "x-role";

/// 当前用户上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub tenant_id: String,
    /// Employee id as asserted by the gateway
    pub id: String,
    pub display_name: String,
    /// Admin role unlocks reopen and revealed close previews
    pub is_admin: bool,
}

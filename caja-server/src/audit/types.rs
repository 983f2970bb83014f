//! Audit trail type definitions
//!
//! Entries are append-only: never edited, never deleted. The first entry for
//! any order is always `Created`, rendered as "Apertura" to operators.

use serde::{Deserialize, Serialize};

/// Audit action types（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // ═══ Orders (financially critical) ═══
    /// Order created: the mandatory head entry of every order's log
    Created,
    /// Workflow status transition
    StatusChange,
    /// Order contents edited
    Edited,
    /// Settlement marker reversed by an administrator
    Reopened,

    // ═══ Sessions ═══
    /// Register shift opened
    SessionOpened,
    /// Register shift closed (cash count declared)
    SessionClosed,

    // ═══ Expenses ═══
    /// Expense recorded against the open shift
    ExpenseCreated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::StatusChange => "STATUS_CHANGE",
            Self::Edited => "EDITED",
            Self::Reopened => "REOPENED",
            Self::SessionOpened => "SESSION_OPENED",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::ExpenseCreated => "EXPENSE_CREATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "STATUS_CHANGE" => Some(Self::StatusChange),
            "EDITED" => Some(Self::Edited),
            "REOPENED" => Some(Self::Reopened),
            "SESSION_OPENED" => Some(Self::SessionOpened),
            "SESSION_CLOSED" => Some(Self::SessionClosed),
            "EXPENSE_CREATED" => Some(Self::ExpenseCreated),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log entry（不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub id: i64,
    pub tenant_id: String,
    /// 资源类型（如 "order", "session", "expense"）
    pub resource_type: String,
    pub resource_id: String,
    pub action: AuditAction,
    /// 结构化详情（JSON）
    pub details: serde_json::Value,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
}

/// Entry payload before it is assigned a sequence number.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub tenant_id: String,
    pub resource_type: String,
    pub resource_id: String,
    pub action: AuditAction,
    pub details: serde_json::Value,
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    pub timestamp: i64,
}

impl NewAuditEntry {
    pub fn new(
        tenant_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        action: AuditAction,
        details: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            action,
            details,
            operator_id: None,
            operator_name: None,
            timestamp: shared::util::now_millis(),
        }
    }

    pub fn by(mut self, operator_id: impl Into<String>, operator_name: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id.into());
        self.operator_name = Some(operator_name.into());
        self
    }
}

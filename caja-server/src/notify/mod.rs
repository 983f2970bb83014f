//! 资源变更通知
//!
//! In-process broadcast of domain events (session opened/closed, order
//! created/reopened) with per-resource monotonic versions, so subscribers
//! can tell stale data from fresh.

use std::sync::Arc;

use dashmap::DashMap;
use shared::event::DomainEvent;
use tokio::sync::broadcast;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号，不存在返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 变更通知器
///
/// Publishing never fails: with no subscribers the event is simply dropped,
/// which is the normal state when no client is listening.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<DomainEvent>,
    versions: Arc<ResourceVersions>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            versions: Arc::new(ResourceVersions::new()),
        }
    }

    /// 发布资源变更事件，版本号自动递增
    pub fn publish<T: serde::Serialize>(
        &self,
        event: &str,
        tenant_id: &str,
        resource_id: &str,
        data: Option<&T>,
    ) {
        let version = self.versions.increment(event);
        let event = DomainEvent {
            event: event.to_string(),
            tenant_id: tenant_id.to_string(),
            resource_id: resource_id.to_string(),
            version,
            timestamp: shared::util::now_millis(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        // 无订阅者时发送失败是正常情况
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    pub fn versions(&self) -> &ResourceVersions {
        &self.versions
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_start_at_one_and_increment() {
        let versions = ResourceVersions::new();
        assert_eq!(versions.get("session"), 0);
        assert_eq!(versions.increment("session"), 1);
        assert_eq!(versions.increment("session"), 2);
        assert_eq!(versions.increment("order"), 1);
        assert_eq!(versions.get("session"), 2);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let notifier = ChangeNotifier::new(8);
        let mut rx = notifier.subscribe();
        notifier.publish("session.opened", "t1", "s1", Some(&serde_json::json!({"x": 1})));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "session.opened");
        assert_eq!(event.tenant_id, "t1");
        assert_eq!(event.resource_id, "s1");
        assert_eq!(event.version, 1);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let notifier = ChangeNotifier::new(8);
        notifier.publish::<serde_json::Value>("order.created", "t1", "o1", None);
        assert_eq!(notifier.versions().get("order.created"), 1);
    }
}

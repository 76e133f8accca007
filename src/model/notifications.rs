//! 通知中心：按到达顺序保存提示消息，到期自动消失或由用户关闭

use crate::model::scheduler::{TimerId, TimerQueue};

pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    /// UI 侧使用的样式名
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

pub type NotificationId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    expiry: TimerId,
}

#[derive(Debug)]
pub struct NotificationCenter {
    duration_ms: u64,
    next_id: NotificationId,
    items: Vec<Notification>,
    timers: TimerQueue<NotificationId>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION_MS)
    }
}

impl NotificationCenter {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            next_id: 1,
            items: Vec::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        tracing::info!("通知[{}]: {}", severity.as_str(), message);
        let expiry = self.timers.schedule(self.duration_ms, id);
        self.items.push(Notification {
            id,
            message,
            severity,
            expiry,
        });
        id
    }

    /// 用户手动关闭
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match self.items.iter().position(|n| n.id == id) {
            Some(idx) => {
                let removed = self.items.remove(idx);
                self.timers.cancel(removed.expiry);
                true
            }
            None => false,
        }
    }

    /// 推进时钟并移除已到期的通知，返回移除数量
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        let until = self.timers.now().saturating_add(elapsed_ms);
        let mut expired = 0;
        while let Some(fired) = self.timers.pop_due(until) {
            let before = self.items.len();
            self.items.retain(|n| n.id != fired.action);
            expired += before - self.items.len();
        }
        self.timers.advance_to(until);
        expired
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrival_order() {
        let mut center = NotificationCenter::default();
        center.push("first", Severity::Info);
        center.push("second", Severity::Error);
        let messages: Vec<&str> = center.items().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(center.items()[1].severity, Severity::Error);
    }

    #[test]
    fn test_auto_dismiss_after_duration() {
        let mut center = NotificationCenter::default();
        center.push("a", Severity::Success);
        assert_eq!(center.advance(4999), 0);
        assert_eq!(center.items().len(), 1);
        assert_eq!(center.advance(1), 1);
        assert!(center.is_empty());
    }

    #[test]
    fn test_staggered_expiry() {
        let mut center = NotificationCenter::new(1000);
        center.push("a", Severity::Info);
        center.advance(600);
        center.push("b", Severity::Info);
        center.advance(400);
        let messages: Vec<&str> = center.items().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["b"]);
        center.advance(600);
        assert!(center.is_empty());
    }

    #[test]
    fn test_manual_dismiss() {
        let mut center = NotificationCenter::default();
        let a = center.push("a", Severity::Info);
        let b = center.push("b", Severity::Info);
        assert!(center.dismiss(a));
        assert!(!center.dismiss(a));
        assert_eq!(center.items().len(), 1);
        assert_eq!(center.items()[0].id, b);
        // 已手动关闭的通知到期时不会影响其他通知
        assert_eq!(center.advance(5000), 1);
        assert!(center.is_empty());
    }

    #[test]
    fn test_ids_increase() {
        let mut center = NotificationCenter::default();
        let a = center.push("a", Severity::Info);
        let b = center.push("b", Severity::Info);
        assert!(b > a);
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::Success.as_str(), "success");
        assert_eq!(Severity::Error.as_str(), "error");
        assert_eq!(Severity::Info.as_str(), "info");
    }
}

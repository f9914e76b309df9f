use crate::domain::entities::{Notification, Severity};
use crate::shared::config::NotificationConfig;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Raised(Notification),
    Dismissed(u64),
    Expired(u64),
}

/// Holds the notifications currently visible to the operator.
///
/// Every notification expires after the configured TTL; when more than
/// `max_active` are visible the oldest one is dropped.
pub struct NotificationCenter {
    active: Arc<RwLock<VecDeque<Notification>>>,
    events: broadcast::Sender<NotificationEvent>,
    next_id: AtomicU64,
    ttl_ms: u64,
    max_active: usize,
}

impl NotificationCenter {
    pub fn new(config: &NotificationConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            active: Arc::new(RwLock::new(VecDeque::new())),
            events,
            next_id: AtomicU64::new(1),
            ttl_ms: config.ttl_ms,
            max_active: config.max_active.max(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    pub async fn notify(&self, severity: Severity, message: impl Into<String>) -> Notification {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification::new(id, severity, message.into(), Utc::now(), self.ttl_ms);

        {
            let mut active = self.active.write().await;
            active.push_back(notification.clone());
            while active.len() > self.max_active {
                if let Some(dropped) = active.pop_front() {
                    let _ = self.events.send(NotificationEvent::Dismissed(dropped.id));
                }
            }
        }

        match severity {
            Severity::Error => tracing::warn!(
                target: "notifications",
                id,
                message = %notification.message,
                "error notification raised"
            ),
            _ => tracing::debug!(
                target: "notifications",
                id,
                severity = %severity,
                "notification raised"
            ),
        }
        let _ = self.events.send(NotificationEvent::Raised(notification.clone()));
        self.schedule_expiry(id);
        notification
    }

    pub async fn error(&self, message: impl Into<String>) -> Notification {
        self.notify(Severity::Error, message).await
    }

    pub async fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut active = self.active.write().await;
            match active.iter().position(|n| n.id == id) {
                Some(index) => active.remove(index).is_some(),
                None => false,
            }
        };
        if removed {
            let _ = self.events.send(NotificationEvent::Dismissed(id));
        }
        removed
    }

    /// Visible notifications, oldest first.
    pub async fn active(&self) -> Vec<Notification> {
        let now = Utc::now();
        self.active
            .read()
            .await
            .iter()
            .filter(|n| !n.is_expired(now))
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        let drained: Vec<u64> = self.active.write().await.drain(..).map(|n| n.id).collect();
        for id in drained {
            let _ = self.events.send(NotificationEvent::Dismissed(id));
        }
    }

    fn schedule_expiry(&self, id: u64) {
        let active = Arc::clone(&self.active);
        let events = self.events.clone();
        let ttl = Duration::from_millis(self.ttl_ms);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let expired = {
                let mut active = active.write().await;
                match active.iter().position(|n| n.id == id) {
                    Some(index) => active.remove(index).is_some(),
                    None => false,
                }
            };
            if expired {
                tracing::trace!(target: "notifications", id, "notification expired");
                let _ = events.send(NotificationEvent::Expired(id));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(ttl_ms: u64, max_active: usize) -> NotificationCenter {
        NotificationCenter::new(&NotificationConfig { ttl_ms, max_active })
    }

    #[tokio::test]
    async fn test_notifications_are_not_deduplicated() {
        let center = center(5_000, 20);
        center.error("Failed to save ticket").await;
        center.error("Failed to save ticket").await;
        assert_eq!(center.active().await.len(), 2);
    }

    #[tokio::test]
    async fn test_dismiss_removes_notification() {
        let center = center(5_000, 20);
        let mut events = center.subscribe();
        let first = center.error("one").await;
        center.error("two").await;

        assert!(center.dismiss(first.id).await);
        assert!(!center.dismiss(first.id).await);

        let remaining = center.active().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "two");

        assert!(matches!(events.recv().await, Ok(NotificationEvent::Raised(_))));
        assert!(matches!(events.recv().await, Ok(NotificationEvent::Raised(_))));
        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Dismissed(first.id)
        );
    }

    #[tokio::test]
    async fn test_notifications_expire_after_ttl() {
        let center = center(30, 20);
        let mut events = center.subscribe();
        let raised = center.notify(Severity::Warning, "short lived").await;
        assert_eq!(center.active().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(center.active().await.is_empty());

        let _ = events.recv().await;
        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Expired(raised.id)
        );
    }

    #[tokio::test]
    async fn test_oldest_notification_dropped_past_cap() {
        let center = center(5_000, 2);
        center.error("a").await;
        center.error("b").await;
        center.error("c").await;
        let messages: Vec<String> = center.active().await.into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["b".to_string(), "c".to_string()]);
    }
}

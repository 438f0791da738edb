use std::collections::VecDeque;

use log::debug;
use parking_lot::RwLock;

use super::Notifier;
use crate::model::notification::Notification;

pub const DEFAULT_INBOX_CAPACITY: usize = 1000;

/// In-process notification log, oldest first. Holds at most `capacity`
/// entries; the oldest are dropped first.
pub struct Inbox {
    notifications: RwLock<VecDeque<Notification>>,
    capacity: usize
}

impl Default for Inbox {
    fn default() -> Self {
        Inbox::with_capacity(DEFAULT_INBOX_CAPACITY)
    }
}

impl Inbox {
    pub fn new() -> Inbox {
        Inbox::default()
    }

    pub fn with_capacity(capacity: usize) -> Inbox {
        let capacity = capacity.max(1);
        Inbox {
            notifications: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_INBOX_CAPACITY))),
            capacity
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn for_recipient(&self, recipient_user_id: &str) -> Vec<Notification> {
        self.notifications
            .read()
            .iter()
            .filter(|notification| notification.recipient_user_id == recipient_user_id)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.notifications.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.read().is_empty()
    }
}

impl Notifier for Inbox {
    fn notify(&self, notification: Notification) {
        debug!(
            "notification {} for {}: {}",
            notification.kind, notification.recipient_user_id, notification.message
        );
        let mut notifications = self.notifications.write();
        while notifications.len() >= self.capacity {
            notifications.pop_front();
        }
        notifications.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notification::NotificationKind;

    #[test]
    fn filters_by_recipient() {
        let inbox = Inbox::new();
        for recipient in ["U1", "admin", "U1"] {
            inbox.notify(Notification::new(
                recipient.to_string(),
                NotificationKind::General,
                String::from("hello"),
                None
            ));
        }
        assert_eq!(inbox.for_recipient("U1").len(), 2);
        assert_eq!(inbox.for_recipient("admin").len(), 1);
        assert!(inbox.for_recipient("U9").is_empty());
    }

    #[test]
    fn drops_oldest_past_capacity() {
        let inbox = Inbox::with_capacity(3);
        for i in 0..5 {
            inbox.notify(Notification::new(
                String::from("U1"),
                NotificationKind::General,
                format!("message {}", i),
                None
            ));
        }
        assert_eq!(inbox.len(), 3);
        let messages: Vec<String> = inbox.all().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn zero_capacity_still_keeps_the_latest() {
        let inbox = Inbox::with_capacity(0);
        assert_eq!(inbox.capacity(), 1);
        for message in ["first", "second"] {
            inbox.notify(Notification::new(String::from("U1"), NotificationKind::General, message.to_string(), None));
        }
        assert_eq!(inbox.all()[0].message, "second");
    }
}

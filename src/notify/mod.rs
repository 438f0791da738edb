//! Notification fan-out.
//!
//! Dispatch is fire-and-forget: [`Notifier::notify`] never blocks the ticket
//! mutation that triggered it and never reports a delivery failure back.

pub mod inbox;
pub mod webhook;

use std::sync::Arc;

use crate::model::notification::Notification;

pub use inbox::Inbox;
pub use webhook::WebhookNotifier;

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Records every notification in the inbox and hands a copy to each
/// forwarder.
pub struct Dispatcher {
    inbox: Arc<Inbox>,
    forwarders: Vec<Box<dyn Notifier>>
}

impl Dispatcher {
    pub fn new(inbox: Arc<Inbox>) -> Dispatcher {
        Dispatcher {
            inbox,
            forwarders: Vec::new()
        }
    }

    pub fn with_forwarder<N: Notifier + 'static>(mut self, forwarder: N) -> Dispatcher {
        self.forwarders.push(Box::new(forwarder));
        self
    }

    pub fn inbox(&self) -> &Arc<Inbox> {
        &self.inbox
    }
}

impl Notifier for Dispatcher {
    fn notify(&self, notification: Notification) {
        for forwarder in &self.forwarders {
            forwarder.notify(notification.clone());
        }
        self.inbox.notify(notification);
    }
}

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;

use super::Notifier;
use crate::model::notification::Notification;

/// Posts each notification as JSON to an external delivery endpoint on a
/// background task. Failures are logged and dropped.
pub struct WebhookNotifier {
    client: Client,
    url: String
}

impl WebhookNotifier {
    pub fn new(url: &str) -> WebhookNotifier {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        WebhookNotifier {
            client,
            url: url.to_string()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(client: Client, url: String, notification: Notification) -> Result<(), String> {
        let resp = client
            .post(&url)
            .json(&notification)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", resp.status()))
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, notification: Notification) {
        let client = self.client.clone();
        let url = self.url.clone();
        let notification_id = notification.notification_id.clone();

        actix_web::rt::spawn(async move {
            match WebhookNotifier::deliver(client, url, notification).await {
                Ok(()) => info!("notification {} delivered", notification_id),
                Err(e) => warn!("notification {} not delivered: {}", notification_id, e)
            }
        });
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Recipient id of the shared support channel watched by every admin.
pub const ADMIN_RECIPIENT: &str = "admin";

#[derive(Serialize, Deserialize, EnumString, Display, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    TicketCreated,
    TicketReply,
    TicketStatus,
    #[default]
    General
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub notification_id: String,
    pub recipient_user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool
}

impl Notification {
    pub fn new(recipient_user_id: String, kind: NotificationKind, message: String, ticket_id: Option<String>) -> Notification {
        Notification {
            notification_id: Uuid::new_v4().to_string(),
            recipient_user_id,
            kind,
            message,
            ticket_id,
            created_at: Utc::now(),
            read: false
        }
    }

    pub fn is_for_admin(&self) -> bool {
        self.recipient_user_id == ADMIN_RECIPIENT
    }
}

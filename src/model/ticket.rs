use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Serialize, Deserialize, EnumString, Display, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Answered,
    Closed
}

#[derive(Serialize, Deserialize, EnumString, Display, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub comment_id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>
}

impl Comment {
    pub fn new(user_id: String, user_name: String, message: String) -> Comment {
        Comment {
            comment_id: Uuid::new_v4().to_string(),
            user_id,
            user_name,
            message,
            created_at: Utc::now()
        }
    }
}

/// What a user hands over when opening a ticket, before it has an id.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub user_id: String,
    pub user_name: String,
    pub attachments: Vec<String>
}

impl TicketDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err(String::from("subject is required"));
        }
        if self.description.trim().is_empty() {
            return Err(String::from("description is required"));
        }
        if self.user_id.trim().is_empty() {
            return Err(String::from("userId is required"));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64
}

impl Ticket {
    pub fn new(draft: TicketDraft) -> Ticket {
        let now = Utc::now();
        Ticket {
            ticket_id: Ticket::generate_id(),
            subject: draft.subject.trim().to_string(),
            description: draft.description.trim().to_string(),
            priority: draft.priority,
            status: TicketStatus::Open,
            user_id: draft.user_id,
            user_name: draft.user_name,
            attachments: draft.attachments,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0
        }
    }

    /// `TKT-` followed by eight uppercase hex digits.
    pub fn generate_id() -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("TKT-{}", raw[..8].to_uppercase())
    }

    pub fn last_reply_at(&self) -> Option<DateTime<Utc>> {
        self.comments.last().map(|comment| comment.created_at)
    }

    pub fn append_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.touch();
    }

    /// Removes the comment carrying `comment_id`, leaving the others in place.
    pub fn remove_comment(&mut self, comment_id: &str) -> Option<Comment> {
        let index = self.comments.iter().position(|comment| comment.comment_id == comment_id)?;
        let removed = self.comments.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft() -> TicketDraft {
        TicketDraft {
            subject: String::from("  Cannot log in "),
            description: String::from("Password reset mail never arrives"),
            priority: TicketPriority::High,
            user_id: String::from("U1"),
            user_name: String::from("Ada"),
            attachments: Vec::new()
        }
    }

    #[test]
    fn new_ticket_starts_open_without_comments() {
        let ticket = Ticket::new(draft());
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.comments.is_empty());
        assert_eq!(ticket.subject, "Cannot log in");
        assert_eq!(ticket.version, 0);
        assert_eq!(ticket.last_reply_at(), None);
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let first = Ticket::generate_id();
        let second = Ticket::generate_id();
        assert!(first.starts_with("TKT-"));
        assert_eq!(first.len(), 12);
        assert_eq!(first[4..], first[4..].to_uppercase());
        assert_ne!(first, second);
    }

    #[test]
    fn draft_requires_subject_and_description() {
        let mut missing_subject = draft();
        missing_subject.subject = String::from("   ");
        assert_eq!(missing_subject.validate(), Err(String::from("subject is required")));

        let mut missing_description = draft();
        missing_description.description = String::new();
        assert_eq!(missing_description.validate(), Err(String::from("description is required")));

        assert!(draft().validate().is_ok());
    }

    #[test]
    fn removing_a_comment_keeps_the_other_ids() {
        let mut ticket = Ticket::new(draft());
        let first = Comment::new(String::from("U1"), String::from("Ada"), String::from("hello"));
        let second = Comment::new(String::from("admin-1"), String::from("Support"), String::from("hi"));
        let third = Comment::new(String::from("U1"), String::from("Ada"), String::from("thanks"));
        let (first_id, second_id, third_id) =
            (first.comment_id.clone(), second.comment_id.clone(), third.comment_id.clone());
        ticket.append_comment(first);
        ticket.append_comment(second);
        ticket.append_comment(third);

        let removed = ticket.remove_comment(&second_id).unwrap();
        assert_eq!(removed.message, "hi");
        let remaining: Vec<&str> = ticket.comments.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(remaining, vec![first_id.as_str(), third_id.as_str()]);
        assert_eq!(ticket.version, 4);
    }

    #[test]
    fn removing_an_unknown_comment_changes_nothing() {
        let mut ticket = Ticket::new(draft());
        ticket.append_comment(Comment::new(String::from("U1"), String::from("Ada"), String::from("hello")));
        let before = ticket.clone();
        assert!(ticket.remove_comment("c404").is_none());
        assert_eq!(ticket, before);
    }

    #[test]
    fn status_and_priority_use_dashboard_spelling() {
        assert_eq!(TicketStatus::InProgress.to_string(), "in-progress");
        assert_eq!(TicketStatus::from_str("closed").unwrap(), TicketStatus::Closed);
        assert_eq!(TicketPriority::from_str("urgent").unwrap(), TicketPriority::Urgent);
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);

        let json = serde_json::to_value(TicketStatus::InProgress).unwrap();
        assert_eq!(json, serde_json::json!("in-progress"));
    }

    #[test]
    fn comment_id_serializes_as_underscore_id() {
        let comment = Comment::new(String::from("U1"), String::from("Ada"), String::from("hello"));
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["_id"], serde_json::json!(comment.comment_id));
        assert_eq!(json["userId"], serde_json::json!("U1"));
    }
}

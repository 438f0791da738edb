//! Ticket lifecycle and comment thread rules.
//!
//! Every operation validates before touching the store and notifies the
//! other party only after the store accepted the change. A lost notification
//! never undoes a mutation.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::error::TicketError;
use crate::model::notification::{Notification, NotificationKind, ADMIN_RECIPIENT};
use crate::model::ticket::{Comment, Ticket, TicketDraft, TicketStatus};
use crate::notify::Notifier;
use crate::repo::{StoreError, TicketScope, TicketStore};
use crate::view::{ListQuery, TicketPage};

const MAX_ID_ATTEMPTS: usize = 5;

pub struct TicketDesk {
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    admin_user_ids: Vec<String>
}

impl TicketDesk {
    pub fn new(store: Arc<dyn TicketStore>, notifier: Arc<dyn Notifier>, admin_user_ids: Vec<String>) -> TicketDesk {
        TicketDesk {
            store,
            notifier,
            admin_user_ids
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|admin| admin == user_id)
    }

    pub fn dispatch(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    pub async fn submit_ticket(&self, draft: TicketDraft) -> Result<Ticket, TicketError> {
        draft.validate().map_err(TicketError::Validation)?;

        let mut ticket = Ticket::new(draft);
        let mut attempts = 1;
        loop {
            match self.store.create_ticket(&ticket).await {
                Ok(()) => break,
                Err(StoreError::Duplicate) if attempts < MAX_ID_ATTEMPTS => {
                    warn!("ticket id {} already taken, drawing another", ticket.ticket_id);
                    ticket.ticket_id = Ticket::generate_id();
                    attempts += 1;
                }
                Err(err) => return Err(err.into())
            }
        }

        info!("ticket {} opened by {}", ticket.ticket_id, ticket.user_id);
        self.dispatch(Notification::new(
            String::from(ADMIN_RECIPIENT),
            NotificationKind::TicketCreated,
            format!("New ticket {} from {}: {}", ticket.ticket_id, ticket.user_name, ticket.subject),
            Some(ticket.ticket_id.clone())
        ));
        Ok(ticket)
    }

    pub async fn list_tickets(&self, scope: TicketScope, query: &ListQuery) -> Result<TicketPage, TicketError> {
        let tickets = self.store.list_tickets(&scope).await?;
        Ok(TicketPage::build(tickets, query, Utc::now()))
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Ticket, TicketError> {
        self.store
            .get_ticket(ticket_id)
            .await?
            .ok_or(TicketError::TicketNotFound)
    }

    /// Appends a reply and notifies whoever did not write it: the owner when
    /// an admin replies, the admin channel otherwise. Status is left as is.
    pub async fn add_comment(
        &self,
        ticket_id: &str,
        message: &str,
        author_id: &str,
        author_name: &str
    ) -> Result<Ticket, TicketError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TicketError::Validation(String::from("comment message is required")));
        }
        if author_id.trim().is_empty() {
            return Err(TicketError::Validation(String::from("userId is required")));
        }

        let comment = Comment::new(author_id.to_string(), author_name.to_string(), message.to_string());
        let ticket = self.store.append_comment(ticket_id, comment).await?;

        let recipient = if self.is_admin(author_id) {
            ticket.user_id.clone()
        } else {
            String::from(ADMIN_RECIPIENT)
        };
        info!("reply on ticket {} by {}, notifying {}", ticket.ticket_id, author_id, recipient);
        self.dispatch(Notification::new(
            recipient,
            NotificationKind::TicketReply,
            format!("New reply on ticket {} from {}", ticket.ticket_id, author_name),
            Some(ticket.ticket_id.clone())
        ));
        Ok(ticket)
    }

    pub async fn delete_comment(&self, ticket_id: &str, comment_id: &str) -> Result<Ticket, TicketError> {
        let ticket = self.store.remove_comment(ticket_id, comment_id).await?;
        info!("comment {} removed from ticket {}", comment_id, ticket_id);
        Ok(ticket)
    }

    /// Last write wins unless `expected_version` is given.
    pub async fn update_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
        expected_version: Option<u64>
    ) -> Result<Ticket, TicketError> {
        let ticket = self.store.set_status(ticket_id, status, expected_version).await?;

        info!("ticket {} is now {}", ticket.ticket_id, ticket.status);
        self.dispatch(Notification::new(
            ticket.user_id.clone(),
            NotificationKind::TicketStatus,
            format!("Your ticket {} is now {}", ticket.ticket_id, ticket.status),
            Some(ticket.ticket_id.clone())
        ));
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ticket::TicketPriority;
    use crate::notify::Inbox;
    use crate::repo::memory::MemoryRepository;

    const ADMIN: &str = "admin-1";

    fn desk() -> (TicketDesk, Arc<MemoryRepository>, Arc<Inbox>) {
        let store = Arc::new(MemoryRepository::new());
        let inbox = Arc::new(Inbox::new());
        let desk = TicketDesk::new(store.clone(), inbox.clone(), vec![String::from(ADMIN)]);
        (desk, store, inbox)
    }

    fn draft(subject: &str) -> TicketDraft {
        TicketDraft {
            subject: subject.to_string(),
            description: String::from("..."),
            priority: TicketPriority::High,
            user_id: String::from("U1"),
            user_name: String::from("Ada"),
            attachments: Vec::new()
        }
    }

    #[actix_web::test]
    async fn submitting_opens_ticket_and_tells_admin() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.comments.is_empty());
        assert_eq!(ticket.priority, TicketPriority::High);

        let sent = inbox.all();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_for_admin());
        assert_eq!(sent[0].kind, NotificationKind::TicketCreated);
        assert!(sent[0].message.contains("Cannot log in"));
        assert!(sent[0].message.contains("Ada"));
        assert_eq!(sent[0].ticket_id.as_deref(), Some(ticket.ticket_id.as_str()));
    }

    #[actix_web::test]
    async fn invalid_submission_touches_nothing() {
        let (desk, store, inbox) = desk();
        let result = desk.submit_ticket(draft("   ")).await;

        assert!(matches!(result, Err(TicketError::Validation(_))));
        assert!(store.is_empty());
        assert!(inbox.is_empty());
    }

    #[actix_web::test]
    async fn admin_reply_notifies_owner() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();

        let updated = desk
            .add_comment(&ticket.ticket_id, "Please try resetting your password", ADMIN, "Support")
            .await
            .unwrap();

        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments.last().unwrap().user_id, ADMIN);
        assert_eq!(updated.status, TicketStatus::Open);

        let to_owner = inbox.for_recipient("U1");
        assert_eq!(to_owner.len(), 1);
        assert_eq!(to_owner[0].kind, NotificationKind::TicketReply);
    }

    #[actix_web::test]
    async fn owner_reply_notifies_admin_channel() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();

        desk.add_comment(&ticket.ticket_id, "Still broken", "U1", "Ada").await.unwrap();

        let to_admin = inbox.for_recipient(ADMIN_RECIPIENT);
        assert_eq!(to_admin.len(), 2);
        assert_eq!(to_admin[1].kind, NotificationKind::TicketReply);
        assert!(inbox.for_recipient("U1").is_empty());
    }

    #[actix_web::test]
    async fn blank_comment_is_rejected_without_side_effects() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();
        let sent_before = inbox.len();

        let result = desk.add_comment(&ticket.ticket_id, "  \n ", ADMIN, "Support").await;

        assert!(matches!(result, Err(TicketError::Validation(_))));
        assert_eq!(desk.get_ticket(&ticket.ticket_id).await.unwrap(), ticket);
        assert_eq!(inbox.len(), sent_before);
    }

    #[actix_web::test]
    async fn deleting_unknown_comment_fails_and_keeps_ticket() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();
        let ticket = desk.add_comment(&ticket.ticket_id, "hello", "U1", "Ada").await.unwrap();
        let sent_before = inbox.len();

        let result = desk.delete_comment(&ticket.ticket_id, "c404").await;

        assert_eq!(result, Err(TicketError::CommentNotFound));
        assert_eq!(desk.get_ticket(&ticket.ticket_id).await.unwrap(), ticket);
        assert_eq!(inbox.len(), sent_before);
    }

    #[actix_web::test]
    async fn deleting_a_comment_shrinks_thread_by_one() {
        let (desk, _, _) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();
        desk.add_comment(&ticket.ticket_id, "one", "U1", "Ada").await.unwrap();
        let ticket = desk.add_comment(&ticket.ticket_id, "two", ADMIN, "Support").await.unwrap();
        let first_id = ticket.comments[0].comment_id.clone();

        let updated = desk.delete_comment(&ticket.ticket_id, &first_id).await.unwrap();

        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].message, "two");
    }

    #[actix_web::test]
    async fn closing_notifies_owner_exactly_once() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();

        desk.update_status(&ticket.ticket_id, TicketStatus::Closed, None).await.unwrap();

        assert_eq!(desk.get_ticket(&ticket.ticket_id).await.unwrap().status, TicketStatus::Closed);
        let to_owner = inbox.for_recipient("U1");
        assert_eq!(to_owner.len(), 1);
        assert_eq!(to_owner[0].kind, NotificationKind::TicketStatus);
        assert!(to_owner[0].message.contains("closed"));
    }

    #[actix_web::test]
    async fn stale_version_is_a_conflict_without_notification() {
        let (desk, _, inbox) = desk();
        let ticket = desk.submit_ticket(draft("Cannot log in")).await.unwrap();
        desk.add_comment(&ticket.ticket_id, "bump", "U1", "Ada").await.unwrap();
        let sent_before = inbox.len();

        let result = desk.update_status(&ticket.ticket_id, TicketStatus::Closed, Some(0)).await;

        assert_eq!(result, Err(TicketError::Conflict));
        assert_eq!(desk.get_ticket(&ticket.ticket_id).await.unwrap().status, TicketStatus::Open);
        assert_eq!(inbox.len(), sent_before);
    }

    #[actix_web::test]
    async fn owner_scope_only_lists_owned_tickets() {
        let (desk, _, _) = desk();
        desk.submit_ticket(draft("Billing issue")).await.unwrap();
        let mut other = draft("Login problem");
        other.user_id = String::from("U2");
        desk.submit_ticket(other).await.unwrap();

        let page = desk
            .list_tickets(TicketScope::Owner(String::from("U2")), &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.tickets[0].ticket.subject, "Login problem");
        assert_eq!(page.tickets[0].last_reply, "N/A");
    }

    #[actix_web::test]
    async fn unknown_ticket_is_not_found() {
        let (desk, _, inbox) = desk();
        assert_eq!(desk.get_ticket("TKT-FFFFFFFF").await, Err(TicketError::TicketNotFound));
        assert_eq!(
            desk.add_comment("TKT-FFFFFFFF", "hello", "U1", "Ada").await,
            Err(TicketError::TicketNotFound)
        );
        assert!(inbox.is_empty());
    }
}

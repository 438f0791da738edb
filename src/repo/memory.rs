use async_trait::async_trait;
use parking_lot::RwLock;

use super::{StoreError, TicketScope, TicketStore};
use crate::model::ticket::{Comment, Ticket, TicketStatus};

/// Process-local ticket store. Tickets are kept in insertion order, which is
/// the order listings come back in.
#[derive(Default)]
pub struct MemoryRepository {
    tickets: RwLock<Vec<Ticket>>
}

impl MemoryRepository {
    pub fn new() -> MemoryRepository {
        MemoryRepository::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.read().is_empty()
    }

    fn mutate<F>(&self, ticket_id: &str, change: F) -> Result<Ticket, StoreError>
    where
        F: FnOnce(&mut Ticket) -> Result<(), StoreError>
    {
        let mut tickets = self.tickets.write();
        let ticket = tickets
            .iter_mut()
            .find(|ticket| ticket.ticket_id == ticket_id)
            .ok_or(StoreError::NotFound)?;
        change(ticket)?;
        Ok(ticket.clone())
    }
}

#[async_trait]
impl TicketStore for MemoryRepository {
    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut tickets = self.tickets.write();
        if tickets.iter().any(|existing| existing.ticket_id == ticket.ticket_id) {
            return Err(StoreError::Duplicate);
        }
        tickets.push(ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tickets
            .read()
            .iter()
            .find(|ticket| ticket.ticket_id == ticket_id)
            .cloned())
    }

    async fn list_tickets(&self, scope: &TicketScope) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .tickets
            .read()
            .iter()
            .filter(|ticket| scope.includes(ticket))
            .cloned()
            .collect())
    }

    async fn append_comment(&self, ticket_id: &str, comment: Comment) -> Result<Ticket, StoreError> {
        self.mutate(ticket_id, |ticket| {
            ticket.append_comment(comment);
            Ok(())
        })
    }

    async fn remove_comment(&self, ticket_id: &str, comment_id: &str) -> Result<Ticket, StoreError> {
        self.mutate(ticket_id, |ticket| {
            ticket
                .remove_comment(comment_id)
                .map(|_| ())
                .ok_or(StoreError::CommentNotFound)
        })
    }

    async fn set_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
        expected_version: Option<u64>
    ) -> Result<Ticket, StoreError> {
        self.mutate(ticket_id, |ticket| {
            if let Some(expected) = expected_version {
                if ticket.version != expected {
                    return Err(StoreError::Conflict);
                }
            }
            ticket.set_status(status);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ticket::{TicketDraft, TicketPriority};

    fn ticket(owner: &str, subject: &str) -> Ticket {
        Ticket::new(TicketDraft {
            subject: subject.to_string(),
            description: String::from("details"),
            priority: TicketPriority::Low,
            user_id: owner.to_string(),
            user_name: format!("{} name", owner),
            attachments: Vec::new()
        })
    }

    #[actix_web::test]
    async fn rejects_duplicate_ids() {
        let repo = MemoryRepository::new();
        let first = ticket("U1", "one");
        repo.create_ticket(&first).await.unwrap();
        assert_eq!(repo.create_ticket(&first).await, Err(StoreError::Duplicate));
        assert_eq!(repo.len(), 1);
    }

    #[actix_web::test]
    async fn lists_by_owner_in_insertion_order() {
        let repo = MemoryRepository::new();
        let a = ticket("U1", "a");
        let b = ticket("U2", "b");
        let c = ticket("U1", "c");
        for t in [&a, &b, &c] {
            repo.create_ticket(t).await.unwrap();
        }

        let all = repo.list_tickets(&TicketScope::All).await.unwrap();
        assert_eq!(all.iter().map(|t| t.subject.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);

        let owned = repo.list_tickets(&TicketScope::Owner(String::from("U1"))).await.unwrap();
        assert_eq!(owned.iter().map(|t| t.subject.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[actix_web::test]
    async fn removing_missing_comment_leaves_ticket_untouched() {
        let repo = MemoryRepository::new();
        let t = ticket("U1", "a");
        repo.create_ticket(&t).await.unwrap();
        repo.append_comment(&t.ticket_id, Comment::new(String::from("U1"), String::from("Ada"), String::from("hi")))
            .await
            .unwrap();
        let before = repo.get_ticket(&t.ticket_id).await.unwrap().unwrap();

        let result = repo.remove_comment(&t.ticket_id, "c404").await;
        assert_eq!(result, Err(StoreError::CommentNotFound));
        assert_eq!(repo.get_ticket(&t.ticket_id).await.unwrap().unwrap(), before);
    }

    #[actix_web::test]
    async fn status_update_honours_expected_version() {
        let repo = MemoryRepository::new();
        let t = ticket("U1", "a");
        repo.create_ticket(&t).await.unwrap();

        let stale = repo.set_status(&t.ticket_id, TicketStatus::Closed, Some(7)).await;
        assert_eq!(stale, Err(StoreError::Conflict));

        let updated = repo.set_status(&t.ticket_id, TicketStatus::Closed, Some(0)).await.unwrap();
        assert_eq!(updated.status, TicketStatus::Closed);
        assert_eq!(updated.version, 1);

        let unconditional = repo.set_status(&t.ticket_id, TicketStatus::Answered, None).await.unwrap();
        assert_eq!(unconditional.status, TicketStatus::Answered);
    }

    #[actix_web::test]
    async fn mutations_on_unknown_ticket_are_not_found() {
        let repo = MemoryRepository::new();
        let result = repo.set_status("TKT-00000000", TicketStatus::Closed, None).await;
        assert_eq!(result, Err(StoreError::NotFound));
    }
}

pub mod ddb;
pub mod memory;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::ticket::{Comment, Ticket, TicketStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketScope {
    All,
    Owner(String)
}

impl TicketScope {
    pub fn includes(&self, ticket: &Ticket) -> bool {
        match self {
            TicketScope::All => true,
            TicketScope::Owner(user_id) => &ticket.user_id == user_id
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "ticket not found")]
    NotFound,
    #[display(fmt = "comment not found")]
    CommentNotFound,
    #[display(fmt = "ticket was modified concurrently")]
    Conflict,
    #[display(fmt = "ticket id already taken")]
    Duplicate,
    #[display(fmt = "store backend failure: {}", _0)]
    Backend(String),
    #[display(fmt = "malformed ticket record: {}", _0)]
    Malformed(String)
}

impl std::error::Error for StoreError {}

/// Persistence for tickets and their comment threads.
///
/// Comment changes are targeted mutations (append, remove by id) so two
/// sessions commenting on the same ticket never overwrite each other.
/// Status changes are last-write-wins unless an expected version is given.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the ticket id is already taken.
    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), StoreError>;

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError>;

    /// Tickets in the store's natural order.
    async fn list_tickets(&self, scope: &TicketScope) -> Result<Vec<Ticket>, StoreError>;

    async fn append_comment(&self, ticket_id: &str, comment: Comment) -> Result<Ticket, StoreError>;

    async fn remove_comment(&self, ticket_id: &str, comment_id: &str) -> Result<Ticket, StoreError>;

    async fn set_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
        expected_version: Option<u64>
    ) -> Result<Ticket, StoreError>;
}

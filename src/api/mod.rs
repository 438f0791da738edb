pub mod health;
pub mod notification;
pub mod ticket;

use actix_web::web::{JsonConfig, QueryConfig, ServiceConfig};

use crate::error::TicketError;

/// Registers every route. `/api/tickets/create` must come before
/// `/api/tickets/{ticket_id}` so the listing is not read as a ticket id.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
        TicketError::Validation(err.to_string()).into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _req| {
        TicketError::Validation(err.to_string()).into()
    }))
    .service(health::health)
    .service(ticket::create_ticket)
    .service(ticket::list_all_tickets)
    .service(ticket::list_user_tickets)
    .service(ticket::get_ticket)
    .service(ticket::patch_ticket)
    .service(ticket::delete_comment)
    .service(notification::send_notification)
    .service(notification::list_notifications);
}

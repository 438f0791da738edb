pub mod ticket_list;

pub use ticket_list::{ListQuery, TicketPage, TicketRow, PAGE_SIZE};

pub mod console;
pub mod notification;
pub mod ticket;

pub mod ticket;

pub use ticket::{IllegalTransition, NewTicket, Ticket, TicketStatus, UnknownStatus};

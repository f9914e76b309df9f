pub mod ports;
pub mod services;

pub use services::{EmailService, NotificationCenter, OptimisticMutator, TicketService};

pub mod remote_store;
pub mod sanitizer;

pub use remote_store::{RemoteStore, TicketRemoteStore};
pub use sanitizer::HtmlSanitizer;

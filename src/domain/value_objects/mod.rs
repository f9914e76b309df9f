pub mod draft_status;
pub mod email_address;
pub mod entity_id;
pub mod template_category;
pub mod ticket_category;
pub mod ticket_priority;
pub mod ticket_status;
pub mod user_id;
pub mod vote_direction;

pub use draft_status::DraftStatus;
pub use email_address::EmailAddress;
pub use entity_id::{EntityId, PLACEHOLDER_PREFIX};
pub use template_category::TemplateCategory;
pub use ticket_category::TicketCategory;
pub use ticket_priority::TicketPriority;
pub use ticket_status::TicketStatus;
pub use user_id::UserId;
pub use vote_direction::VoteDirection;

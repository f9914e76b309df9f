pub mod comment;
pub mod email_draft;
pub mod email_template;
pub mod notification;
pub mod recipient;
pub mod ticket;

pub use comment::TicketComment;
pub use email_draft::{EmailDraft, EmailDraftInput, EmailDraftPatch};
pub use email_template::{EmailTemplate, EmailTemplateInput, EmailTemplatePatch, RenderedTemplate};
pub use notification::{Notification, Severity};
pub use recipient::{
    ImportLineError, Recipient, RecipientInput, RecipientPatch, import_errors_to_app_error,
    parse_recipient_import,
};
pub use ticket::{Ticket, TicketDraft, TicketPatch, VoteOutcome};

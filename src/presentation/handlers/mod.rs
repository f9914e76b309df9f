pub mod email_handler;
pub mod ticket_handler;

pub use email_handler::EmailHandler;
pub use ticket_handler::TicketHandler;

use super::dto::Validate;
use crate::shared::{AppError, ValidationFailureKind};

/// Runs request-level validation before anything reaches a service.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(AppError::validation_mapper(ValidationFailureKind::Generic))
}

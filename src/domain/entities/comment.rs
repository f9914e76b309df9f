use crate::domain::value_objects::{EntityId, UserId};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_COMMENT_LEN: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub id: EntityId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketComment {
    /// Optimistic comment: placeholder id and client-assigned timestamps.
    pub fn pending(author: UserId, content: String, now: DateTime<Utc>) -> Result<Self, AppError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::validation(
                ValidationFailureKind::MissingField,
                "Comment cannot be empty",
            ));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::validation(
                ValidationFailureKind::TooLong,
                format!("Comment is too long (max {MAX_COMMENT_LEN} characters)"),
            ));
        }
        Ok(Self {
            id: EntityId::placeholder(),
            author,
            content,
            created_at: now,
            updated_at: now,
        })
    }
}

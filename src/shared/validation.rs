use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Reason a request was rejected before any optimistic change was applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValidationFailureKind {
    /// Catch-all validation failure.
    Generic,
    /// A required field was empty or missing.
    MissingField,
    /// A text field exceeded its length limit.
    TooLong,
    /// An email address did not parse.
    InvalidEmail,
    /// An identifier was empty or malformed.
    InvalidIdentifier,
    /// A tagged value (status, priority, ...) was not recognised.
    UnknownVariant,
    /// The same record appeared twice, or already exists.
    DuplicateEntry,
    /// Content payload exceeded the size limit.
    ContentTooLarge,
}

impl ValidationFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFailureKind::Generic => "generic",
            ValidationFailureKind::MissingField => "missing_field",
            ValidationFailureKind::TooLong => "too_long",
            ValidationFailureKind::InvalidEmail => "invalid_email",
            ValidationFailureKind::InvalidIdentifier => "invalid_identifier",
            ValidationFailureKind::UnknownVariant => "unknown_variant",
            ValidationFailureKind::DuplicateEntry => "duplicate_entry",
            ValidationFailureKind::ContentTooLarge => "content_too_large",
        }
    }
}

impl fmt::Display for ValidationFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationFailureKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(ValidationFailureKind::Generic),
            "missing_field" => Ok(ValidationFailureKind::MissingField),
            "too_long" => Ok(ValidationFailureKind::TooLong),
            "invalid_email" => Ok(ValidationFailureKind::InvalidEmail),
            "invalid_identifier" => Ok(ValidationFailureKind::InvalidIdentifier),
            "unknown_variant" => Ok(ValidationFailureKind::UnknownVariant),
            "duplicate_entry" => Ok(ValidationFailureKind::DuplicateEntry),
            "content_too_large" => Ok(ValidationFailureKind::ContentTooLarge),
            _ => Err(()),
        }
    }
}

use crate::shared::validation::ValidationFailureKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Remote call failed: {0}")]
    Remote(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {message}")]
    ValidationError {
        kind: ValidationFailureKind,
        message: String,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(kind: ValidationFailureKind, message: impl Into<String>) -> Self {
        AppError::ValidationError {
            kind,
            message: message.into(),
        }
    }

    pub fn validation_mapper<E>(kind: ValidationFailureKind) -> impl FnOnce(E) -> AppError
    where
        E: Into<String>,
    {
        move |message| AppError::validation(kind, message)
    }

    pub fn not_found(entity_kind: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{entity_kind} {id}"))
    }

    /// Stable machine-readable code carried in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Remote(_) => "REMOTE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message suitable for a notification or inline field error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::NotFound(what) => format!("{what} no longer exists"),
            AppError::Conflict(message) => message.clone(),
            AppError::Database(_) | AppError::Remote(_) => {
                "The server could not save your change".to_string()
            }
            AppError::ConfigurationError(message) => message.clone(),
            AppError::SerializationError(_) | AppError::Internal(_) => {
                "Something went wrong".to_string()
            }
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationFailureKind> {
        match self {
            AppError::ValidationError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError { .. })
    }

    /// Failures that originate from the remote store and are recovered by rollback.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            AppError::Remote(_)
                | AppError::NotFound(_)
                | AppError::Database(_)
                | AppError::SerializationError(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

pub mod config;
pub mod error;
pub mod validation;

pub use config::{AppConfig, ConcurrencyPolicy, RemoteBackend};
pub use error::{AppError, Result};
pub use validation::ValidationFailureKind;

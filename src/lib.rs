//! Optimistic collection core for the Bgr8 admin tools.
//!
//! Every list screen (QA tickets, email drafts, templates, recipients) keeps
//! a local collection that is updated before the remote store confirms a
//! change and reconciled once it answers.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use state::{AppState, RemoteStores};

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
/// Safe to call more than once.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

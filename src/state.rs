use crate::application::ports::TicketRemoteStore;
use crate::application::services::{EmailService, EmailStores, NotificationCenter, TicketService};
use crate::domain::entities::{EmailDraft, EmailTemplate, Recipient, Ticket};
use crate::infrastructure::database::{ConnectionPool, SqliteDocumentStore};
use crate::infrastructure::memory::InMemoryRemoteStore;
use crate::infrastructure::sanitizer::RegexHtmlSanitizer;
use crate::presentation::handlers::{EmailHandler, TicketHandler};
use crate::shared::config::{AppConfig, RemoteBackend};
use std::path::Path;
use std::sync::Arc;

/// Remote stores backing every collection.
pub struct RemoteStores {
    pub tickets: Arc<dyn TicketRemoteStore>,
    pub email: EmailStores,
    pub pool: Option<ConnectionPool>,
}

impl RemoteStores {
    pub fn in_memory() -> Self {
        Self {
            tickets: Arc::new(InMemoryRemoteStore::<Ticket>::new()),
            email: EmailStores {
                drafts: Arc::new(InMemoryRemoteStore::<EmailDraft>::new()),
                templates: Arc::new(InMemoryRemoteStore::<EmailTemplate>::new()),
                recipients: Arc::new(InMemoryRemoteStore::<Recipient>::new()),
            },
            pool: None,
        }
    }

    pub async fn sqlite(pool: ConnectionPool) -> anyhow::Result<Self> {
        pool.migrate().await?;
        Ok(Self {
            tickets: Arc::new(SqliteDocumentStore::<Ticket>::new(pool.clone())),
            email: EmailStores {
                drafts: Arc::new(SqliteDocumentStore::<EmailDraft>::new(pool.clone())),
                templates: Arc::new(SqliteDocumentStore::<EmailTemplate>::new(pool.clone())),
                recipients: Arc::new(SqliteDocumentStore::<Recipient>::new(pool.clone())),
            },
            pool: Some(pool),
        })
    }
}

/// Services and handlers shared by every entry point.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub notifications: Arc<NotificationCenter>,
    pub ticket_service: Arc<TicketService>,
    pub email_service: Arc<EmailService>,
    pub ticket_handler: Arc<TicketHandler>,
    pub email_handler: Arc<EmailHandler>,
    pool: Option<ConnectionPool>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let stores = match config.remote.backend {
            RemoteBackend::Memory => RemoteStores::in_memory(),
            RemoteBackend::Sqlite => {
                ensure_database_dir(&config.remote.database_url)?;
                let pool = ConnectionPool::new(&config.remote).await?;
                RemoteStores::sqlite(pool).await?
            }
        };
        tracing::info!(
            backend = ?config.remote.backend,
            concurrency = config.mutation.concurrency.as_str(),
            "remote stores ready"
        );

        Ok(Self::with_stores(config, stores))
    }

    pub fn with_stores(config: AppConfig, stores: RemoteStores) -> Self {
        let notifications = Arc::new(NotificationCenter::new(&config.notifications));
        let ticket_service = Arc::new(TicketService::new(
            stores.tickets,
            &config.mutation,
            Arc::clone(&notifications),
        ));
        let email_service = Arc::new(EmailService::new(
            stores.email,
            Arc::new(RegexHtmlSanitizer::new()),
            &config.mutation,
            Arc::clone(&notifications),
        ));
        let ticket_handler = Arc::new(TicketHandler::new(
            Arc::clone(&ticket_service),
            Arc::clone(&notifications),
        ));
        let email_handler = Arc::new(EmailHandler::new(Arc::clone(&email_service)));

        Self {
            config: Arc::new(config),
            notifications,
            ticket_service,
            email_service,
            ticket_handler,
            email_handler,
            pool: stores.pool,
        }
    }

    /// Fetches every collection from the remote store.
    pub async fn load(&self) -> anyhow::Result<()> {
        let (tickets, email) = tokio::join!(self.ticket_service.load(), self.email_service.load());
        let count = tickets?;
        email?;
        tracing::info!(tickets = count, "collections loaded");
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn ensure_database_dir(database_url: &str) -> std::io::Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::dto::ticket_dto::CreateTicketRequest;
    use crate::shared::config::RemoteConfig;

    fn ticket_request(title: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.to_string(),
            description: String::new(),
            priority: None,
            category: None,
            tags: vec![],
            reporter: "ops".to_string(),
        }
    }

    async fn titles(state: &AppState) -> Vec<String> {
        state
            .ticket_handler
            .list_tickets()
            .await
            .tickets
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    async fn assert_reload_keeps_order(config: AppConfig) {
        let state = AppState::new(config).await.unwrap();
        state.load().await.unwrap();
        for title in ["First", "Second", "Third"] {
            state
                .ticket_handler
                .create_ticket(ticket_request(title))
                .await
                .unwrap();
        }
        let before = titles(&state).await;
        assert_eq!(before, vec!["Third", "Second", "First"]);

        state.load().await.unwrap();
        assert_eq!(titles(&state).await, before);
        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_reload_keeps_optimistic_order_in_memory() {
        assert_reload_keeps_order(AppConfig::default()).await;
    }

    #[tokio::test]
    async fn test_reload_keeps_optimistic_order_in_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.remote = RemoteConfig {
            backend: RemoteBackend::Sqlite,
            database_url: format!("sqlite://{}?mode=rwc", dir.path().join("order.db").display()),
            max_connections: 2,
            connection_timeout: 5,
        };
        assert_reload_keeps_order(config).await;
    }

    #[tokio::test]
    async fn test_memory_backend_wires_handlers() {
        let state = AppState::new(AppConfig::default()).await.unwrap();
        state.load().await.unwrap();

        let created = state
            .ticket_handler
            .create_ticket(CreateTicketRequest {
                title: "Wiring check".to_string(),
                description: String::new(),
                priority: None,
                category: None,
                tags: vec![],
                reporter: "ops".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.outcome, "committed");
        assert_eq!(state.ticket_service.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_backend_persists_across_states() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("admin.db");
        let mut config = AppConfig::default();
        config.remote = RemoteConfig {
            backend: RemoteBackend::Sqlite,
            database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 2,
            connection_timeout: 5,
        };

        let first = AppState::new(config.clone()).await.unwrap();
        first.load().await.unwrap();
        first
            .ticket_handler
            .create_ticket(CreateTicketRequest {
                title: "Persisted".to_string(),
                description: String::new(),
                priority: Some("high".to_string()),
                category: None,
                tags: vec![],
                reporter: "ops".to_string(),
            })
            .await
            .unwrap();
        first.shutdown().await;

        let second = AppState::new(config).await.unwrap();
        second.load().await.unwrap();
        let list = second.ticket_handler.list_tickets().await;
        assert_eq!(list.total, 1);
        assert_eq!(list.tickets[0].priority, "high");
        second.shutdown().await;
    }

    #[test]
    fn test_ensure_database_dir_ignores_memory_urls() {
        assert!(ensure_database_dir("sqlite::memory:").is_ok());
        assert!(ensure_database_dir("sqlite:").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.notifications.max_active = 0;
        assert!(AppState::new(config).await.is_err());
    }
}

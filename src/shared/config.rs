use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoteBackend {
    #[default]
    Memory,
    Sqlite,
}

impl RemoteBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// How the mutator treats a second mutation on an entity that already has one in flight.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// No guard: both run and the later-settling reconciliation wins.
    #[default]
    Unguarded,
    /// Reject the new mutation before it is applied.
    RejectWhilePending,
    /// Wait for the in-flight mutation to settle, then run.
    QueuePerEntity,
}

impl ConcurrencyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcurrencyPolicy::Unguarded => "unguarded",
            ConcurrencyPolicy::RejectWhilePending => "reject_while_pending",
            ConcurrencyPolicy::QueuePerEntity => "queue_per_entity",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unguarded" => Some(Self::Unguarded),
            "reject_while_pending" | "reject" => Some(Self::RejectWhilePending),
            "queue_per_entity" | "queue" => Some(Self::QueuePerEntity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub mutation: MutationConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub backend: RemoteBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    pub concurrency: ConcurrencyPolicy,
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub ttl_ms: u64,
    pub max_active: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub default_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                backend: RemoteBackend::Memory,
                database_url: "sqlite:data/bgr8-admin.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            mutation: MutationConfig::default(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig {
                default_filter: "bgr8_admin=debug,info".to_string(),
            },
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyPolicy::Unguarded,
            event_buffer: 256,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 5_000,
            max_active: 20,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("BGR8_REMOTE_BACKEND") {
            if let Some(backend) = RemoteBackend::parse(&v) {
                cfg.remote.backend = backend;
            }
        }
        if let Ok(v) = std::env::var("BGR8_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.remote.database_url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("BGR8_DB_MAX_CONNECTIONS") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.max_connections = value.clamp(1, u32::MAX as u64) as u32;
            }
        }
        if let Ok(v) = std::env::var("BGR8_CONCURRENCY_POLICY") {
            if let Some(policy) = ConcurrencyPolicy::parse(&v) {
                cfg.mutation.concurrency = policy;
            }
        }
        if let Ok(v) = std::env::var("BGR8_NOTIFICATION_TTL_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.notifications.ttl_ms = value;
            }
        }
        if let Ok(v) = std::env::var("BGR8_NOTIFICATION_MAX_ACTIVE") {
            if let Some(value) = parse_u64(&v) {
                cfg.notifications.max_active = value as usize;
            }
        }
        if let Ok(v) = std::env::var("BGR8_LOG_FILTER") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.logging.default_filter = trimmed.to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.remote.backend == RemoteBackend::Sqlite {
            if self.remote.database_url.trim().is_empty() {
                return Err("Remote database_url is required for the sqlite backend".to_string());
            }
            if self.remote.max_connections == 0 {
                return Err("Remote max_connections must be greater than 0".to_string());
            }
        }
        if self.mutation.event_buffer == 0 {
            return Err("Mutation event_buffer must be greater than 0".to_string());
        }
        if self.notifications.ttl_ms == 0 {
            return Err("Notification ttl_ms must be greater than 0".to_string());
        }
        if self.notifications.max_active == 0 {
            return Err("Notification max_active must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

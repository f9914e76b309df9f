use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub const PLACEHOLDER_PREFIX: &str = "temp-";

static PLACEHOLDER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Identifier of a record under optimistic management.
///
/// Committed ids come from the remote store. Before commit an entity carries a
/// placeholder of the form `temp-<epoch millis>-<sequence>`; the sequence keeps
/// placeholders unique even when two are minted within the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn placeholder() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let sequence = PLACEHOLDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{PLACEHOLDER_PREFIX}{millis}-{sequence}"))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Entity ID cannot be empty".to_string());
        }
        if value.len() > 256 {
            return Err("Entity ID is too long".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_placeholders_are_unique_and_flagged() {
        let ids: HashSet<EntityId> = (0..500).map(|_| EntityId::placeholder()).collect();
        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(EntityId::is_placeholder));
    }

    #[test]
    fn test_committed_ids_are_not_placeholders() {
        let id = EntityId::new("T1".into()).unwrap();
        assert!(!id.is_placeholder());
        assert!(!EntityId::generate().is_placeholder());
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(EntityId::new("   ".into()).is_err());
    }
}

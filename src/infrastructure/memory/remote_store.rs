use crate::application::ports::{RemoteStore, TicketRemoteStore};
use crate::domain::collection::Entity;
use crate::domain::entities::{Ticket, TicketComment};
use crate::domain::value_objects::{EntityId, UserId, VoteDirection};
use crate::shared::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Process-local remote store with failure injection.
///
/// Behaves like the hosted document store: ids are minted on create,
/// timestamps are stamped on write, and missing ids are `NotFound`.
pub struct InMemoryRemoteStore<T: Entity> {
    documents: Arc<RwLock<Vec<T>>>,
    fail_next: AtomicUsize,
    offline: AtomicBool,
    latency: Duration,
    calls: AtomicU64,
}

impl<T: Entity> Default for InMemoryRemoteStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryRemoteStore<T> {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            fail_next: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    /// Every call sleeps for `latency` before touching the documents.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// `items` are in list order (newest first) and go after anything
    /// already stored.
    pub async fn seed(&self, items: Vec<T>) {
        let mut documents = self.documents.write().await;
        for item in items {
            if !documents.iter().any(|doc| doc.id() == item.id()) {
                documents.push(item);
            }
        }
    }

    /// The next `count` calls fail with a remote error.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn get(&self, id: &EntityId) -> Option<T> {
        self.documents
            .read()
            .await
            .iter()
            .find(|doc| doc.id() == id)
            .cloned()
    }

    async fn enter(&self, operation: &str) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            tracing::debug!(target: "remote::memory", kind = T::KIND, operation, "store offline");
            return Err(AppError::Remote("remote store is unreachable".to_string()));
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!(target: "remote::memory", kind = T::KIND, operation, "injected failure");
            return Err(AppError::Remote(format!(
                "{operation} {} failed: service unavailable",
                T::KIND
            )));
        }
        Ok(())
    }

    async fn modify<F, O>(&self, id: &EntityId, f: F) -> Result<O, AppError>
    where
        F: FnOnce(&mut T) -> O,
    {
        let mut documents = self.documents.write().await;
        let document = documents
            .iter_mut()
            .find(|doc| doc.id() == id)
            .ok_or_else(|| AppError::not_found(T::KIND, id))?;
        Ok(f(document))
    }
}

#[async_trait]
impl<T: Entity> RemoteStore<T> for InMemoryRemoteStore<T> {
    async fn list(&self) -> Result<Vec<T>, AppError> {
        self.enter("list").await?;
        Ok(self.documents.read().await.clone())
    }

    async fn create(&self, entity: &T) -> Result<EntityId, AppError> {
        self.enter("create").await?;
        let id = EntityId::generate();
        let now = Utc::now();
        let mut stored = entity.clone();
        stored.set_id(id.clone());
        stored.set_timestamps(now, now);
        self.documents.write().await.insert(0, stored);
        tracing::trace!(target: "remote::memory", kind = T::KIND, id = %id, "document created");
        Ok(id)
    }

    async fn update(&self, id: &EntityId, patch: &T::Patch) -> Result<(), AppError> {
        self.enter("update").await?;
        self.modify(id, |doc| doc.apply_patch(patch, Utc::now()))
            .await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), AppError> {
        self.enter("delete").await?;
        let mut documents = self.documents.write().await;
        let index = documents
            .iter()
            .position(|doc| doc.id() == id)
            .ok_or_else(|| AppError::not_found(T::KIND, id))?;
        documents.remove(index);
        Ok(())
    }
}

#[async_trait]
impl TicketRemoteStore for InMemoryRemoteStore<Ticket> {
    async fn vote(
        &self,
        ticket_id: &EntityId,
        user: &UserId,
        direction: VoteDirection,
    ) -> Result<(), AppError> {
        self.enter("vote").await?;
        self.modify(ticket_id, |ticket| {
            ticket.apply_vote(user, direction);
            ticket.updated_at = Utc::now();
        })
        .await
    }

    async fn add_comment(
        &self,
        ticket_id: &EntityId,
        comment: &TicketComment,
    ) -> Result<EntityId, AppError> {
        self.enter("add_comment").await?;
        let id = EntityId::generate();
        let now = Utc::now();
        let mut stored = comment.clone();
        stored.id = id.clone();
        stored.created_at = now;
        stored.updated_at = now;
        self.modify(ticket_id, move |ticket| ticket.add_comment(stored))
            .await?;
        Ok(id)
    }
}

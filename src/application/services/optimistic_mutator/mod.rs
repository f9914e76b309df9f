//! Optimistic mutation of an in-memory [`Collection`] mirrored from a remote store.
//!
//! A mutation is applied locally first, then the remote call runs, then the
//! result is reconciled: committed on success, rolled back on failure. Every
//! state change is published under the same write lock, so readers only ever
//! observe the original, optimistic or reconciled collection.

mod guard;
mod mutation;

pub use mutation::{
    CreateReceipt, Mutation, MutationKind, MutationOutcome, PendingMutation, PreviousState,
    RollbackContext, ensure_committed,
};

use super::notification_center::NotificationCenter;
use crate::domain::collection::{Collection, Entity};
use crate::domain::entities::Severity;
use crate::shared::config::MutationConfig;
use crate::shared::{AppError, ConcurrencyPolicy};
use chrono::Utc;
use futures::future::BoxFuture;
use guard::InFlightGuards;
use mutation::default_failure_message;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Loaded,
    Applied,
    Committed,
    RolledBack,
    Rejected,
}

/// Published after every change to the collection (and on rejection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub entity_kind: &'static str,
    pub phase: MutationPhase,
    pub mutation_id: Option<u64>,
    pub version: u64,
}

pub struct OptimisticMutator<T: Entity> {
    state: RwLock<Collection<T>>,
    events: broadcast::Sender<CollectionEvent>,
    version: AtomicU64,
    next_mutation_id: AtomicU64,
    policy: ConcurrencyPolicy,
    guards: InFlightGuards,
    notifications: Arc<NotificationCenter>,
}

impl<T: Entity> OptimisticMutator<T> {
    pub fn new(config: &MutationConfig, notifications: Arc<NotificationCenter>) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            state: RwLock::new(Collection::new()),
            events,
            version: AtomicU64::new(0),
            next_mutation_id: AtomicU64::new(1),
            policy: config.concurrency,
            guards: InFlightGuards::default(),
            notifications,
        }
    }

    pub fn policy(&self) -> ConcurrencyPolicy {
        self.policy
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.events.subscribe()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Collection<T> {
        self.state.read().await.clone()
    }

    pub async fn read<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&Collection<T>) -> O,
    {
        f(&*self.state.read().await)
    }

    /// Replaces the collection with the remote listing.
    ///
    /// A failed fetch leaves the collection untouched and raises one error
    /// notification.
    pub async fn load(&self, fetch: BoxFuture<'static, Result<Vec<T>, AppError>>) -> Result<usize, AppError> {
        match fetch.await {
            Ok(items) => {
                let mut state = self.state.write().await;
                *state = Collection::from_vec(items);
                let len = state.len();
                self.publish(MutationPhase::Loaded, None);
                tracing::debug!(target: "mutator", kind = T::KIND, count = len, "collection loaded");
                Ok(len)
            }
            Err(err) => {
                tracing::warn!(target: "mutator", kind = T::KIND, error = %err, "collection load failed");
                self.notifications
                    .notify(
                        Severity::Error,
                        format!("Failed to load {}s: {}", T::KIND, err.user_message()),
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Runs one optimistic mutation to completion.
    pub async fn perform<R: Send + 'static>(&self, mutation: Mutation<T, R>) -> MutationOutcome {
        self.execute(mutation, |_| ()).await.0
    }

    /// Like [`Self::perform`], also handing back a copy of the remote result on commit.
    pub async fn perform_returning<R>(&self, mutation: Mutation<T, R>) -> (MutationOutcome, Option<R>)
    where
        R: Clone + Send + 'static,
    {
        self.execute(mutation, R::clone).await
    }

    async fn execute<R, O, C>(&self, mutation: Mutation<T, R>, capture: C) -> (MutationOutcome, Option<O>)
    where
        R: Send + 'static,
        C: FnOnce(&R) -> O + Send,
    {
        let Mutation {
            kind,
            target_id,
            apply,
            invoke,
            reconcile_success,
            reconcile_failure,
            failure_message,
        } = mutation;

        let _permit = match self.guards.acquire(&target_id, self.policy).await {
            Ok(permit) => permit,
            Err(err) => {
                tracing::info!(
                    target: "mutator",
                    kind = T::KIND,
                    mutation = %kind,
                    entity_id = %target_id,
                    "mutation rejected while another is pending"
                );
                self.publish(MutationPhase::Rejected, None);
                self.notifications
                    .notify(Severity::Warning, err.user_message())
                    .await;
                return (MutationOutcome::Rejected(err), None);
            }
        };

        let mutation_id = self.next_mutation_id.fetch_add(1, Ordering::Relaxed);

        let (original, pending) = {
            let mut state = self.state.write().await;
            let original = state.clone();
            let pending = PendingMutation {
                mutation_id,
                kind,
                target_id: target_id.clone(),
                previous_state: PreviousState::capture(&original, &target_id),
                applied_at: Utc::now(),
            };
            *state = apply(&original);
            self.publish(MutationPhase::Applied, Some(mutation_id));
            (original, pending)
        };

        tracing::debug!(
            target: "mutator",
            kind = T::KIND,
            mutation = %kind,
            mutation_id,
            entity_id = %target_id,
            "optimistic change applied"
        );

        match invoke.await {
            Ok(result) => {
                let captured = capture(&result);
                let mut state = self.state.write().await;
                let current = std::mem::take(&mut *state);
                *state = reconcile_success(current, result);
                self.publish(MutationPhase::Committed, Some(mutation_id));
                tracing::debug!(target: "mutator", kind = T::KIND, mutation_id, "mutation committed");
                (MutationOutcome::Committed, Some(captured))
            }
            Err(error) => {
                tracing::warn!(
                    target: "mutator",
                    kind = T::KIND,
                    mutation = %kind,
                    mutation_id,
                    entity_id = %target_id,
                    error = %error,
                    "remote call failed; rolling back"
                );
                {
                    let mut state = self.state.write().await;
                    let current = std::mem::take(&mut *state);
                    *state = reconcile_failure(RollbackContext {
                        original,
                        current,
                        pending,
                        error: error.clone(),
                    });
                    self.publish(MutationPhase::RolledBack, Some(mutation_id));
                }
                let message = failure_message
                    .unwrap_or_else(|| default_failure_message(kind, T::KIND, &error));
                self.notifications.notify(Severity::Error, message).await;
                (MutationOutcome::RolledBack(error), None)
            }
        }
    }

    fn publish(&self, phase: MutationPhase, mutation_id: Option<u64>) {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(CollectionEvent {
            entity_kind: T::KIND,
            phase,
            mutation_id,
            version,
        });
    }
}

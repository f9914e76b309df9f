use crate::domain::collection::{Collection, Entity};
use crate::domain::value_objects::EntityId;
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Vote,
    CommentAdd,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::Vote => "vote",
            MutationKind::CommentAdd => "comment_add",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::Vote => "vote on",
            MutationKind::CommentAdd => "comment on",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the target taken just before the optimistic apply.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviousState<T> {
    Absent,
    Present { index: usize, entity: T },
}

impl<T: Entity> PreviousState<T> {
    pub fn capture(collection: &Collection<T>, target: &EntityId) -> Self {
        match collection.position(target) {
            Some(index) => PreviousState::Present {
                index,
                entity: collection.as_slice()[index].clone(),
            },
            None => PreviousState::Absent,
        }
    }
}

/// One in-flight optimistic change.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation<T> {
    pub mutation_id: u64,
    pub kind: MutationKind,
    pub target_id: EntityId,
    pub previous_state: PreviousState<T>,
    pub applied_at: DateTime<Utc>,
}

impl<T: Entity> PendingMutation<T> {
    /// Puts the target back the way it was in `current`.
    ///
    /// An absent target is removed if present (and ignored otherwise); a
    /// present one is written back at its old index, clamped to the length.
    pub fn restore(&self, mut current: Collection<T>) -> Collection<T> {
        match &self.previous_state {
            PreviousState::Absent => {
                current.remove(&self.target_id);
            }
            PreviousState::Present { index, entity } => {
                current.upsert_at(*index, entity.clone());
            }
        }
        current
    }
}

pub struct RollbackContext<T> {
    pub original: Collection<T>,
    pub current: Collection<T>,
    pub pending: PendingMutation<T>,
    pub error: AppError,
}

pub(crate) type ApplyFn<T> = Box<dyn FnOnce(&Collection<T>) -> Collection<T> + Send>;
pub(crate) type SuccessFn<T, R> = Box<dyn FnOnce(Collection<T>, R) -> Collection<T> + Send>;
pub(crate) type FailureFn<T> = Box<dyn FnOnce(RollbackContext<T>) -> Collection<T> + Send>;

/// Describes one optimistic change: how to apply it locally, which remote
/// call confirms it and how to reconcile either result.
pub struct Mutation<T: Entity, R> {
    pub(crate) kind: MutationKind,
    pub(crate) target_id: EntityId,
    pub(crate) apply: ApplyFn<T>,
    pub(crate) invoke: BoxFuture<'static, Result<R, AppError>>,
    pub(crate) reconcile_success: SuccessFn<T, R>,
    pub(crate) reconcile_failure: FailureFn<T>,
    pub(crate) failure_message: Option<String>,
}

impl<T: Entity, R: Send + 'static> Mutation<T, R> {
    /// A mutation that changes nothing locally until overridden with [`Mutation::apply`].
    ///
    /// The default failure reconcile is per target: it writes the target's
    /// [`PreviousState`] back into the *current* collection, so changes other
    /// mutations made meanwhile survive. It does not restore the whole
    /// snapshot taken before the apply; use [`Mutation::on_failure`] with
    /// `ctx.original` for that.
    pub fn new<F>(kind: MutationKind, target_id: EntityId, invoke: F) -> Self
    where
        F: Future<Output = Result<R, AppError>> + Send + 'static,
    {
        Self {
            kind,
            target_id,
            apply: Box::new(|collection| collection.clone()),
            invoke: Box::pin(invoke),
            reconcile_success: Box::new(|collection, _| collection),
            reconcile_failure: Box::new(|ctx| ctx.pending.restore(ctx.current)),
            failure_message: None,
        }
    }

    pub fn apply<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(&Collection<T>) -> Collection<T> + Send + 'static,
    {
        self.apply = Box::new(apply);
        self
    }

    pub fn on_success<F>(mut self, reconcile: F) -> Self
    where
        F: FnOnce(Collection<T>, R) -> Collection<T> + Send + 'static,
    {
        self.reconcile_success = Box::new(reconcile);
        self
    }

    pub fn on_failure<F>(mut self, reconcile: F) -> Self
    where
        F: FnOnce(RollbackContext<T>) -> Collection<T> + Send + 'static,
    {
        self.reconcile_failure = Box::new(reconcile);
        self
    }

    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn target_id(&self) -> &EntityId {
        &self.target_id
    }
}

impl<T: Entity> Mutation<T, EntityId> {
    /// Inserts `entity` at the head under its placeholder id; on success only
    /// the id is rewritten, on failure the placeholder entry is removed.
    pub fn create<F>(entity: T, invoke: F) -> Self
    where
        F: Future<Output = Result<EntityId, AppError>> + Send + 'static,
    {
        let placeholder = entity.id().clone();
        let committed_from = placeholder.clone();
        Self::new(MutationKind::Create, placeholder, invoke)
            .apply(move |collection| {
                let mut next = collection.clone();
                next.push_front(entity);
                next
            })
            .on_success(move |mut collection, id| {
                collection.rewrite_id(&committed_from, id);
                collection
            })
    }
}

impl<T: Entity> Mutation<T, ()> {
    pub fn update<F>(id: EntityId, patch: T::Patch, now: DateTime<Utc>, invoke: F) -> Self
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let target = id.clone();
        Self::new(MutationKind::Update, id, invoke).apply(move |collection| {
            let mut next = collection.clone();
            next.update_with(&target, |entity: &mut T| entity.apply_patch(&patch, now));
            next
        })
    }

    pub fn delete<F>(id: EntityId, invoke: F) -> Self
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let target = id.clone();
        Self::new(MutationKind::Delete, id, invoke).apply(move |collection| {
            let mut next = collection.clone();
            next.remove(&target);
            next
        })
    }
}

pub(crate) fn default_failure_message(kind: MutationKind, entity_kind: &str, error: &AppError) -> String {
    format!(
        "Failed to {} {}: {}",
        kind.verb(),
        entity_kind,
        error.user_message()
    )
}

/// Result of [`super::OptimisticMutator::perform`]. Never an unhandled error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Committed,
    RolledBack(AppError),
    Rejected(AppError),
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            MutationOutcome::Committed => None,
            MutationOutcome::RolledBack(err) | MutationOutcome::Rejected(err) => Some(err),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOutcome::Committed => "committed",
            MutationOutcome::RolledBack(_) => "rolled_back",
            MutationOutcome::Rejected(_) => "rejected",
        }
    }
}

/// Result of an optimistic create: the placeholder the entity was shown
/// under and, once committed, its authoritative id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReceipt {
    pub placeholder_id: EntityId,
    pub id: Option<EntityId>,
    pub outcome: MutationOutcome,
}

impl CreateReceipt {
    pub fn new(placeholder_id: EntityId, (outcome, id): (MutationOutcome, Option<EntityId>)) -> Self {
        Self {
            placeholder_id,
            id,
            outcome,
        }
    }
}

/// Changes to an entity whose create has not committed yet have no remote
/// counterpart to target.
pub fn ensure_committed(id: &EntityId) -> Result<(), AppError> {
    if id.is_placeholder() {
        return Err(AppError::validation(
            ValidationFailureKind::InvalidIdentifier,
            format!("{id} is still being saved"),
        ));
    }
    Ok(())
}

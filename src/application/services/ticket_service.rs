use super::collection_view::CollectionView;
use super::notification_center::NotificationCenter;
use super::optimistic_mutator::{
    CollectionEvent, CreateReceipt, Mutation, MutationKind, MutationOutcome, OptimisticMutator,
    ensure_committed,
};
use crate::application::ports::TicketRemoteStore;
use crate::domain::collection::Collection;
use crate::domain::entities::{Ticket, TicketComment, TicketDraft, TicketPatch};
use crate::domain::projection::{SortSpec, TicketFilter, TicketSortField, ViewState};
use crate::domain::value_objects::{EntityId, UserId, VoteDirection};
use crate::shared::config::MutationConfig;
use crate::shared::AppError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;

/// QA ticket board: optimistic CRUD, voting and comments over a
/// [`TicketRemoteStore`], plus the board's filter/sort/search view.
pub struct TicketService {
    store: Arc<dyn TicketRemoteStore>,
    mutator: Arc<OptimisticMutator<Ticket>>,
    view: CollectionView<Ticket>,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn TicketRemoteStore>,
        config: &MutationConfig,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            store,
            mutator: Arc::new(OptimisticMutator::new(config, notifications)),
            view: CollectionView::new(),
        }
    }

    pub fn mutator(&self) -> &Arc<OptimisticMutator<Ticket>> {
        &self.mutator
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.mutator.subscribe()
    }

    pub async fn load(&self) -> Result<usize, AppError> {
        let store = Arc::clone(&self.store);
        self.mutator
            .load(Box::pin(async move { store.list().await }))
            .await
    }

    pub async fn create_ticket(&self, draft: TicketDraft) -> Result<CreateReceipt, AppError> {
        let ticket = Ticket::from_draft(draft, Utc::now())?;
        let placeholder = ticket.id.clone();
        tracing::info!(target: "ticket_service", placeholder = %placeholder, "creating ticket");

        let store = Arc::clone(&self.store);
        let remote_copy = ticket.clone();
        let mutation = Mutation::create(ticket, async move { store.create(&remote_copy).await })
            .failure_message("Failed to create ticket. Please try again.");

        let result = self.mutator.perform_returning(mutation).await;
        Ok(CreateReceipt::new(placeholder, result))
    }

    pub async fn update_ticket(
        &self,
        id: EntityId,
        patch: TicketPatch,
    ) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        patch.validate()?;

        let store = Arc::clone(&self.store);
        let remote_id = id.clone();
        let remote_patch = patch.clone();
        let mutation = Mutation::update(id, patch, Utc::now(), async move {
            store.update(&remote_id, &remote_patch).await
        })
        .failure_message("Failed to update ticket");

        Ok(self.mutator.perform(mutation).await)
    }

    pub async fn delete_ticket(&self, id: EntityId) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;

        let store = Arc::clone(&self.store);
        let remote_id = id.clone();
        let mutation = Mutation::delete(id, async move { store.delete(&remote_id).await })
            .failure_message("Failed to delete ticket");

        Ok(self.mutator.perform(mutation).await)
    }

    /// Toggles `user`'s vote. Voting the same way twice withdraws the vote.
    pub async fn vote(
        &self,
        id: EntityId,
        user: UserId,
        direction: VoteDirection,
    ) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;

        let store = Arc::clone(&self.store);
        let remote_id = id.clone();
        let remote_user = user.clone();
        let target = id.clone();
        let mutation = Mutation::<Ticket, _>::new(MutationKind::Vote, id, async move {
            store.vote(&remote_id, &remote_user, direction).await
        })
        .apply(move |collection| {
            let mut next = collection.clone();
            next.update_with(&target, |ticket: &mut Ticket| {
                ticket.apply_vote(&user, direction);
            });
            next
        })
        .failure_message("Failed to record vote");

        Ok(self.mutator.perform(mutation).await)
    }

    /// Appends a comment under a placeholder id. Success rewrites only the
    /// comment id; failure removes just that comment.
    pub async fn add_comment(
        &self,
        ticket_id: EntityId,
        author: UserId,
        content: String,
    ) -> Result<CreateReceipt, AppError> {
        ensure_committed(&ticket_id)?;
        let comment = TicketComment::pending(author, content, Utc::now())?;
        let placeholder = comment.id.clone();

        let store = Arc::clone(&self.store);
        let remote_ticket = ticket_id.clone();
        let remote_comment = comment.clone();
        let apply_target = ticket_id.clone();
        let commit_target = ticket_id.clone();
        let rollback_target = ticket_id.clone();
        let commit_placeholder = placeholder.clone();
        let rollback_placeholder = placeholder.clone();

        let invoke = async move { store.add_comment(&remote_ticket, &remote_comment).await };
        let mutation = Mutation::<Ticket, _>::new(MutationKind::CommentAdd, ticket_id, invoke)
        .apply(move |collection| {
            let mut next = collection.clone();
            next.update_with(&apply_target, |ticket: &mut Ticket| ticket.add_comment(comment));
            next
        })
        .on_success(move |mut collection, comment_id| {
            collection.update_with(&commit_target, |ticket: &mut Ticket| {
                ticket.rewrite_comment_id(&commit_placeholder, comment_id);
            });
            collection
        })
        .on_failure(move |ctx| {
            let mut current = ctx.current;
            current.update_with(&rollback_target, |ticket: &mut Ticket| {
                ticket.remove_comment(&rollback_placeholder);
            });
            current
        })
        .failure_message("Failed to add comment");

        let result = self.mutator.perform_returning(mutation).await;
        Ok(CreateReceipt::new(placeholder, result))
    }

    pub async fn set_filter(&self, filter: TicketFilter) {
        self.view.set_filter(filter).await;
    }

    pub async fn set_sort(&self, sort: SortSpec<TicketSortField>) {
        self.view.set_sort(sort).await;
    }

    pub async fn set_search(&self, term: &str) {
        self.view.set_search(term).await;
    }

    pub async fn view_state(&self) -> ViewState<Ticket> {
        self.view.state().await
    }

    /// Current board rows after filter, search and sort.
    pub async fn projection(&self) -> Vec<Ticket> {
        self.view.project(&self.mutator).await
    }

    pub async fn snapshot(&self) -> Collection<Ticket> {
        self.mutator.snapshot().await
    }

    pub async fn get(&self, id: &EntityId) -> Option<Ticket> {
        self.mutator
            .read(|collection| collection.get(id).cloned())
            .await
    }
}

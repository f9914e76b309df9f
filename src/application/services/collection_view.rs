use super::optimistic_mutator::OptimisticMutator;
use crate::domain::projection::{Projectable, SearchTerm, SortSpec, ViewState};
use tokio::sync::RwLock;

/// Filter/sort/search state of one list screen. Changing it never touches
/// the remote store; the projection is recomputed from the mutator's
/// current collection on every read.
pub struct CollectionView<T: Projectable> {
    state: RwLock<ViewState<T>>,
}

impl<T: Projectable> Default for CollectionView<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(ViewState::default()),
        }
    }
}

impl<T: Projectable> CollectionView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_filter(&self, filter: T::Filter) {
        self.state.write().await.filter = filter;
    }

    pub async fn set_sort(&self, sort: SortSpec<T::Field>) {
        self.state.write().await.sort = sort;
    }

    pub async fn set_search(&self, raw: &str) {
        self.state.write().await.search = SearchTerm::new(raw);
    }

    pub async fn state(&self) -> ViewState<T> {
        self.state.read().await.clone()
    }

    pub async fn project(&self, mutator: &OptimisticMutator<T>) -> Vec<T> {
        let view = self.state.read().await.clone();
        mutator.read(|collection| view.project(collection)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::notification_center::NotificationCenter;
    use crate::domain::entities::{Ticket, TicketDraft};
    use crate::domain::projection::{MembershipFilter, TicketFilter, TicketSortField};
    use crate::domain::value_objects::{TicketPriority, TicketStatus, UserId};
    use crate::shared::config::{MutationConfig, NotificationConfig};
    use chrono::Utc;
    use std::sync::Arc;

    fn ticket(title: &str, priority: TicketPriority) -> Ticket {
        Ticket::from_draft(
            TicketDraft {
                title: title.into(),
                priority,
                reporter: Some(UserId::new("qa".into()).unwrap()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_view_changes_reproject_without_remote_calls() {
        let notifications = Arc::new(NotificationCenter::new(&NotificationConfig::default()));
        let mutator = OptimisticMutator::new(&MutationConfig::default(), notifications);
        let items = vec![
            ticket("Crash on save", TicketPriority::Critical),
            ticket("Typo in footer", TicketPriority::Low),
            ticket("Crash on upload", TicketPriority::High),
        ];
        mutator.load(Box::pin(async move { Ok(items) })).await.unwrap();

        let view: CollectionView<Ticket> = CollectionView::new();
        assert_eq!(view.project(&mutator).await.len(), 3);

        view.set_search("crash").await;
        view.set_sort(SortSpec::asc(TicketSortField::Priority)).await;
        let rows = view.project(&mutator).await;
        let titles: Vec<&str> = rows.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Crash on upload", "Crash on save"]);

        view.set_filter(TicketFilter {
            status: MembershipFilter::only([TicketStatus::Closed]),
            ..Default::default()
        })
        .await;
        assert!(view.project(&mutator).await.is_empty());
        assert_eq!(mutator.snapshot().await.len(), 3);
    }
}

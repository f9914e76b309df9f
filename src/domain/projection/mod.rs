//! Read-only list views over a [`Collection`]: membership filters, free-text
//! search and a stable sort, recomputed on demand.

pub mod email;
pub mod filter;
pub mod sort;
pub mod tickets;

pub use email::{
    DraftFilter, DraftSortField, RecipientFilter, RecipientSortField, TemplateFilter,
    TemplateSortField,
};
pub use filter::{MembershipFilter, SearchTerm};
pub use sort::{SortDirection, SortKey, SortSpec, compare_text};
pub use tickets::{TicketFilter, TicketSortField};

use crate::domain::collection::{Collection, Entity};
use std::fmt::Debug;

pub trait Projectable: Entity {
    type Field: Copy + Debug + Default + PartialEq + Send + Sync + 'static;
    type Filter: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    fn matches_filter(&self, filter: &Self::Filter) -> bool;

    fn search_fields(&self) -> Vec<&str>;

    fn sort_key(&self, field: Self::Field) -> SortKey<'_>;
}

/// Filter, search and sort `collection` into a new vector.
///
/// Ties keep collection order. The collection itself is never touched.
pub fn project<T: Projectable>(
    collection: &Collection<T>,
    filter: &T::Filter,
    sort: &SortSpec<T::Field>,
    search: &SearchTerm,
) -> Vec<T> {
    let mut rows: Vec<&T> = collection
        .iter()
        .filter(|item| item.matches_filter(filter))
        .filter(|item| search.matches(item.search_fields()))
        .collect();

    rows.sort_by(|a, b| {
        sort.direction
            .apply(a.sort_key(sort.field).compare(&b.sort_key(sort.field)))
    });

    rows.into_iter().cloned().collect()
}

/// Filter/sort/search state held by one list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T: Projectable> {
    pub filter: T::Filter,
    pub sort: SortSpec<T::Field>,
    pub search: SearchTerm,
}

impl<T: Projectable> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            filter: T::Filter::default(),
            sort: SortSpec::default(),
            search: SearchTerm::default(),
        }
    }
}

impl<T: Projectable> ViewState<T> {
    pub fn project(&self, collection: &Collection<T>) -> Vec<T> {
        project(collection, &self.filter, &self.sort, &self.search)
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search = SearchTerm::new(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Ticket, TicketDraft};
    use crate::domain::value_objects::{
        EntityId, TicketCategory, TicketPriority, TicketStatus, UserId,
    };
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn ticket(id: &str, title: &str, status: TicketStatus, priority: TicketPriority, minute: i64) -> Ticket {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        let mut ticket = Ticket::from_draft(
            TicketDraft {
                title: title.to_string(),
                description: format!("{title} details"),
                priority,
                category: TicketCategory::Bug,
                reporter: Some(UserId::new("qa".into()).unwrap()),
                ..Default::default()
            },
            created,
        )
        .unwrap();
        ticket.id = EntityId::new(id.to_string()).unwrap();
        ticket.status = status;
        ticket
    }

    fn board() -> Collection<Ticket> {
        Collection::from_vec(vec![
            ticket("t1", "Login fails on Safari", TicketStatus::Open, TicketPriority::High, 1),
            ticket("t2", "Login copy typo", TicketStatus::Resolved, TicketPriority::Low, 2),
            ticket("t3", "Dashboard slow", TicketStatus::Open, TicketPriority::Critical, 3),
            ticket("t4", "Profile avatar", TicketStatus::InProgress, TicketPriority::Medium, 4),
            ticket("t5", "Export CSV", TicketStatus::Open, TicketPriority::High, 5),
        ])
    }

    fn ids(rows: &[Ticket]) -> Vec<&str> {
        rows.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_filter_and_search_compose() {
        let collection = board();
        let filter = TicketFilter {
            status: MembershipFilter::only([TicketStatus::Open]),
            ..Default::default()
        };
        let rows = project(
            &collection,
            &filter,
            &SortSpec::desc(TicketSortField::CreatedAt),
            &SearchTerm::new("login"),
        );
        assert_eq!(ids(&rows), vec!["t1"]);
    }

    #[test]
    fn test_inactive_filters_return_everything_sorted() {
        let rows = project(
            &board(),
            &TicketFilter::default(),
            &SortSpec::desc(TicketSortField::CreatedAt),
            &SearchTerm::new(""),
        );
        assert_eq!(ids(&rows), vec!["t5", "t4", "t3", "t2", "t1"]);
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let rows = project(
            &board(),
            &TicketFilter::default(),
            &SortSpec::desc(TicketSortField::Priority),
            &SearchTerm::default(),
        );
        // t1 and t5 share High and keep collection order.
        assert_eq!(ids(&rows), vec!["t3", "t1", "t5", "t4", "t2"]);
    }

    #[test]
    fn test_projection_does_not_touch_collection() {
        let collection = board();
        let before = collection.clone();
        let mut view: ViewState<Ticket> = ViewState::default();
        view.set_search("dash");
        let rows = view.project(&collection);
        assert_eq!(rows.len(), 1);
        assert_eq!(collection, before);
    }

    proptest! {
        #[test]
        fn prop_projection_is_idempotent(
            statuses in proptest::collection::vec(0..4usize, 1..12),
            selected in proptest::collection::btree_set(0..4usize, 0..4),
            term in "[a-z ]{0,4}",
            desc in any::<bool>(),
        ) {
            let items: Vec<Ticket> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| ticket(
                    &format!("t{i}"),
                    &format!("title {}", i % 3),
                    TicketStatus::ALL[*s],
                    TicketPriority::Medium,
                    (i % 4) as i64,
                ))
                .collect();
            let collection = Collection::from_vec(items);
            let filter = TicketFilter {
                status: selected.iter().map(|s| TicketStatus::ALL[*s]).collect(),
                ..Default::default()
            };
            let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
            let sort = SortSpec::new(TicketSortField::CreatedAt, direction);
            let search = SearchTerm::new(&term);

            let once = project(&collection, &filter, &sort, &search);
            let twice = project(&collection, &filter, &sort, &search);
            prop_assert_eq!(&once, &twice);

            // Projecting a projection changes nothing either.
            let again = project(&Collection::from_vec(once.clone()), &filter, &sort, &search);
            prop_assert_eq!(once, again);
        }

        #[test]
        fn prop_equal_keys_keep_insertion_order(count in 1..20usize) {
            let items: Vec<Ticket> = (0..count)
                .map(|i| ticket(&format!("t{i}"), "same", TicketStatus::Open, TicketPriority::Low, 0))
                .collect();
            let collection = Collection::from_vec(items);
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let rows = project(
                    &collection,
                    &TicketFilter::default(),
                    &SortSpec::new(TicketSortField::Title, direction),
                    &SearchTerm::default(),
                );
                prop_assert_eq!(rows.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), collection.ids());
            }
        }
    }
}

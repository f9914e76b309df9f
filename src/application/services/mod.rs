pub mod collection_view;
pub mod email_service;
pub mod notification_center;
pub mod optimistic_mutator;
pub mod ticket_service;

pub use collection_view::CollectionView;
pub use email_service::{EmailService, EmailStores, ImportReport, TemplatePreview};
pub use notification_center::{NotificationCenter, NotificationEvent};
pub use optimistic_mutator::{
    CollectionEvent, CreateReceipt, Mutation, MutationKind, MutationOutcome, MutationPhase,
    OptimisticMutator, PendingMutation, PreviousState, RollbackContext,
};
pub use ticket_service::TicketService;

use crate::domain::collection::Entity;
use crate::domain::entities::{Ticket, TicketComment};
use crate::domain::value_objects::{EntityId, UserId, VoteDirection};
use crate::shared::AppError;
use async_trait::async_trait;

/// Asynchronous CRUD API for one entity type.
///
/// `create` ignores the entity's placeholder id and returns the
/// authoritative one. Timestamps are stamped by the store.
#[async_trait]
pub trait RemoteStore<T: Entity>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, AppError>;

    async fn create(&self, entity: &T) -> Result<EntityId, AppError>;

    async fn update(&self, id: &EntityId, patch: &T::Patch) -> Result<(), AppError>;

    async fn delete(&self, id: &EntityId) -> Result<(), AppError>;
}

/// Ticket-specific operations layered on the CRUD port.
#[async_trait]
pub trait TicketRemoteStore: RemoteStore<Ticket> {
    async fn vote(
        &self,
        ticket_id: &EntityId,
        user: &UserId,
        direction: VoteDirection,
    ) -> Result<(), AppError>;

    async fn add_comment(
        &self,
        ticket_id: &EntityId,
        comment: &TicketComment,
    ) -> Result<EntityId, AppError>;
}

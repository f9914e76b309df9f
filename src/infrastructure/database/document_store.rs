use super::ConnectionPool;
use super::queries::{
    COUNT_DOCUMENTS, DELETE_DOCUMENT, INSERT_DOCUMENT, SELECT_DOCUMENT, SELECT_DOCUMENTS,
    UPDATE_DOCUMENT,
};
use crate::application::ports::{RemoteStore, TicketRemoteStore};
use crate::domain::collection::Entity;
use crate::domain::entities::{Ticket, TicketComment};
use crate::domain::value_objects::{EntityId, UserId, VoteDirection};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::Row;
use std::marker::PhantomData;

/// Stores one entity kind as JSON documents in the shared `documents` table.
pub struct SqliteDocumentStore<T> {
    pool: ConnectionPool,
    _kind: PhantomData<fn() -> T>,
}

impl<T> SqliteDocumentStore<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let row = sqlx::query(COUNT_DOCUMENTS)
            .bind(T::KIND)
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(row.try_get("total")?)
    }

    async fn modify<F, O>(&self, id: &EntityId, f: F) -> Result<O, AppError>
    where
        F: FnOnce(&mut T) -> O + Send,
        O: Send,
    {
        let mut tx = self.pool.get_pool().begin().await?;

        let row = sqlx::query(SELECT_DOCUMENT)
            .bind(T::KIND)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(T::KIND, id))?;
        let payload: String = row.try_get("payload")?;
        let mut document: T = serde_json::from_str(&payload)?;

        let output = f(&mut document);

        sqlx::query(UPDATE_DOCUMENT)
            .bind(T::KIND)
            .bind(id.as_str())
            .bind(serde_json::to_string(&document)?)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(output)
    }
}

#[async_trait]
impl<T> RemoteStore<T> for SqliteDocumentStore<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    async fn list(&self) -> Result<Vec<T>, AppError> {
        let rows = sqlx::query(SELECT_DOCUMENTS)
            .bind(T::KIND)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: String = row.try_get("payload")?;
            documents.push(serde_json::from_str(&payload)?);
        }
        tracing::debug!(target: "remote::sqlite", kind = T::KIND, count = documents.len(), "documents listed");
        Ok(documents)
    }

    async fn create(&self, entity: &T) -> Result<EntityId, AppError> {
        let id = EntityId::generate();
        let now = Utc::now();
        let mut stored = entity.clone();
        stored.set_id(id.clone());
        stored.set_timestamps(now, now);

        sqlx::query(INSERT_DOCUMENT)
            .bind(T::KIND)
            .bind(id.as_str())
            .bind(serde_json::to_string(&stored)?)
            .bind(now.timestamp_millis())
            .bind(now.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        tracing::debug!(target: "remote::sqlite", kind = T::KIND, id = %id, "document created");
        Ok(id)
    }

    async fn update(&self, id: &EntityId, patch: &T::Patch) -> Result<(), AppError> {
        let now = Utc::now();
        self.modify(id, |document| document.apply_patch(patch, now))
            .await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), AppError> {
        let result = sqlx::query(DELETE_DOCUMENT)
            .bind(T::KIND)
            .bind(id.as_str())
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(T::KIND, id));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketRemoteStore for SqliteDocumentStore<Ticket> {
    async fn vote(
        &self,
        ticket_id: &EntityId,
        user: &UserId,
        direction: VoteDirection,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        self.modify(ticket_id, |ticket| {
            ticket.apply_vote(user, direction);
            ticket.updated_at = now;
        })
        .await
    }

    async fn add_comment(
        &self,
        ticket_id: &EntityId,
        comment: &TicketComment,
    ) -> Result<EntityId, AppError> {
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

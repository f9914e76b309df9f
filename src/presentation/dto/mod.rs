pub mod email_dto;
pub mod ticket_dto;

use crate::application::services::{CreateReceipt, MutationOutcome};
use crate::domain::entities::Notification;
use crate::domain::value_objects::{EntityId, UserId};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

// Response envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub error_details: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
            error_details: None,
        }
    }

    pub fn from_app_error(error: AppError) -> Self {
        let error_details = error
            .validation_kind()
            .map(|kind| json!({ "kind": kind.as_str() }));

        Self {
            success: false,
            data: None,
            error: Some(error.user_message()),
            error_code: Some(error.code().to_string()),
            error_details,
        }
    }

    pub fn from_result(result: crate::shared::Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::from_app_error(err),
        }
    }
}

/// Result of an update, delete, vote or toggle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub outcome: String,
    pub error: Option<String>,
}

impl From<MutationOutcome> for MutationResponse {
    fn from(outcome: MutationOutcome) -> Self {
        Self {
            outcome: outcome.as_str().to_string(),
            error: outcome.error().map(AppError::user_message),
        }
    }
}

/// Result of an optimistic create: the placeholder the UI rendered and,
/// once committed, the id the remote assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub placeholder_id: String,
    pub id: Option<String>,
    pub outcome: String,
    pub error: Option<String>,
}

impl From<CreateReceipt> for CreateResponse {
    fn from(receipt: CreateReceipt) -> Self {
        Self {
            placeholder_id: receipt.placeholder_id.into(),
            id: receipt.id.map(String::from),
            outcome: receipt.outcome.as_str().to_string(),
            error: receipt.outcome.error().map(AppError::user_message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: u64,
    pub severity: String,
    pub message: String,
    pub raised_at: i64,
    pub expires_at: i64,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            severity: notification.severity.as_str().to_string(),
            message: notification.message,
            raised_at: notification.raised_at.timestamp_millis(),
            expires_at: notification.expires_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRequest {
    pub id: String,
}

impl Validate for IdRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissNotificationRequest {
    pub id: u64,
}

// Validation
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

pub(crate) fn parse_entity_id(value: &str) -> Result<EntityId, AppError> {
    EntityId::new(value.trim().to_string())
        .map_err(AppError::validation_mapper(ValidationFailureKind::InvalidIdentifier))
}

pub(crate) fn parse_user_id(value: &str) -> Result<UserId, AppError> {
    UserId::new(value.trim().to_string())
        .map_err(AppError::validation_mapper(ValidationFailureKind::InvalidIdentifier))
}

pub(crate) fn parse_variant<V>(value: &str) -> Result<V, AppError>
where
    V: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(AppError::validation_mapper(ValidationFailureKind::UnknownVariant))
}

pub(crate) fn parse_variants<V>(values: &[String]) -> Result<Vec<V>, AppError>
where
    V: FromStr<Err = String>,
{
    values.iter().map(|value| parse_variant(value)).collect()
}

pub(crate) fn parse_timestamp(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        AppError::validation(
            ValidationFailureKind::Generic,
            format!("Timestamp {millis} is out of range"),
        )
    })
}

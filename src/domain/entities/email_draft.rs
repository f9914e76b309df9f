use crate::domain::collection::Entity;
use crate::domain::value_objects::{DraftStatus, EmailAddress, EntityId};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_CONTENT_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraft {
    pub id: EntityId,
    pub subject: String,
    pub content: String,
    pub recipients: Vec<EmailAddress>,
    pub recipient_groups: Vec<String>,
    pub template_id: Option<EntityId>,
    pub status: DraftStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EmailDraftInput {
    pub subject: String,
    pub content: String,
    pub recipients: Vec<EmailAddress>,
    pub recipient_groups: Vec<String>,
    pub template_id: Option<EntityId>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailDraftPatch {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub recipients: Option<Vec<EmailAddress>>,
    pub recipient_groups: Option<Vec<String>>,
    pub status: Option<DraftStatus>,
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
}

impl EmailDraftInput {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_subject(&self.subject)?;
        validate_content(&self.content)
    }
}

impl EmailDraftPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(subject) = &self.subject {
            validate_subject(subject)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        if let Some(DraftStatus::Scheduled) = self.status {
            if matches!(self.scheduled_at, Some(None)) {
                return Err(AppError::validation(
                    ValidationFailureKind::MissingField,
                    "A scheduled draft needs a send time",
                ));
            }
        }
        Ok(())
    }
}

impl EmailDraft {
    pub fn from_input(input: EmailDraftInput, now: DateTime<Utc>) -> Result<Self, AppError> {
        input.validate()?;
        let status = if input.scheduled_at.is_some() {
            DraftStatus::Scheduled
        } else {
            DraftStatus::Draft
        };
        Ok(Self {
            id: EntityId::placeholder(),
            subject: input.subject.trim().to_string(),
            content: input.content,
            recipients: dedupe(input.recipients),
            recipient_groups: dedupe(input.recipient_groups),
            template_id: input.template_id,
            status,
            scheduled_at: input.scheduled_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checked before an update is applied; sent drafts are frozen.
    pub fn ensure_editable(&self) -> Result<(), AppError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(AppError::validation(
                ValidationFailureKind::Generic,
                format!("Draft {} has already been sent", self.id),
            ))
        }
    }
}

impl Entity for EmailDraft {
    type Patch = EmailDraftPatch;
    const KIND: &'static str = "draft";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    fn apply_patch(&mut self, patch: &EmailDraftPatch, now: DateTime<Utc>) {
        if let Some(subject) = &patch.subject {
            self.subject = subject.trim().to_string();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(recipients) = &patch.recipients {
            self.recipients = dedupe(recipients.clone());
        }
        if let Some(groups) = &patch.recipient_groups {
            self.recipient_groups = dedupe(groups.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            self.scheduled_at = scheduled_at;
        }
        self.updated_at = now;
    }
}

fn validate_subject(subject: &str) -> Result<(), AppError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(AppError::validation(
            ValidationFailureKind::MissingField,
            "Subject is required",
        ));
    }
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(AppError::validation(
            ValidationFailureKind::TooLong,
            format!("Subject is too long (max {MAX_SUBJECT_LEN} characters)"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_content(content: &str) -> Result<(), AppError> {
    if content.len() > MAX_CONTENT_BYTES {
        return Err(AppError::validation(
            ValidationFailureKind::ContentTooLarge,
            format!("Content exceeds {MAX_CONTENT_BYTES} bytes"),
        ));
    }
    Ok(())
}

fn dedupe<V: PartialEq>(values: Vec<V>) -> Vec<V> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

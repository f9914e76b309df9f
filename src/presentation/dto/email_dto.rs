use super::{CreateResponse, Validate, require};
use crate::application::services::{ImportReport, TemplatePreview};
use crate::domain::entities::{EmailDraft, EmailTemplate, Recipient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub id: String,
    pub pending: bool,
    pub subject: String,
    pub content: String,
    pub recipients: Vec<String>,
    pub recipient_groups: Vec<String>,
    pub template_id: Option<String>,
    pub status: String,
    pub scheduled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<EmailDraft> for DraftResponse {
    fn from(draft: EmailDraft) -> Self {
        Self {
            pending: draft.id.is_placeholder(),
            id: draft.id.into(),
            subject: draft.subject,
            content: draft.content,
            recipients: draft
                .recipients
                .iter()
                .map(|email| email.as_str().to_string())
                .collect(),
            recipient_groups: draft.recipient_groups,
            template_id: draft.template_id.map(String::from),
            status: draft.status.as_str().to_string(),
            scheduled_at: draft.scheduled_at.map(|at| at.timestamp_millis()),
            created_at: draft.created_at.timestamp_millis(),
            updated_at: draft.updated_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: String,
    pub pending: bool,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub category: String,
    pub variables: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<EmailTemplate> for TemplateResponse {
    fn from(template: EmailTemplate) -> Self {
        Self {
            pending: template.id.is_placeholder(),
            id: template.id.into(),
            name: template.name,
            subject: template.subject,
            content: template.content,
            category: template.category.as_str().to_string(),
            variables: template.variables,
            created_at: template.created_at.timestamp_millis(),
            updated_at: template.updated_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResponse {
    pub id: String,
    pub pending: bool,
    pub email: String,
    pub name: String,
    pub groups: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            pending: recipient.id.is_placeholder(),
            id: recipient.id.into(),
            email: recipient.email.as_str().to_string(),
            name: recipient.name,
            groups: recipient.groups,
            is_active: recipient.is_active,
            created_at: recipient.created_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePreviewResponse {
    pub subject: String,
    pub html: String,
    pub unresolved: Vec<String>,
}

impl From<TemplatePreview> for TemplatePreviewResponse {
    fn from(preview: TemplatePreview) -> Self {
        Self {
            subject: preview.subject,
            html: preview.html,
            unresolved: preview.unresolved,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecipientsResponse {
    pub committed: usize,
    pub failed: usize,
    pub results: Vec<CreateResponse>,
}

impl From<ImportReport> for ImportRecipientsResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            committed: report.committed(),
            failed: report.failed(),
            results: report.receipts.into_iter().map(CreateResponse::from).collect(),
        }
    }
}

// Requests
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub recipient_groups: Vec<String>,
    pub template_id: Option<String>,
    /// Milliseconds since the epoch; setting it schedules the draft.
    pub scheduled_at: Option<i64>,
}

impl Validate for SaveDraftRequest {
    fn validate(&self) -> Result<(), String> {
        require("subject", &self.subject)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftRequest {
    pub id: String,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub recipient_groups: Option<Vec<String>>,
    pub status: Option<String>,
    pub scheduled_at: Option<i64>,
    #[serde(default)]
    pub clear_schedule: bool,
}

impl Validate for UpdateDraftRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)?;
        if self.clear_schedule && self.scheduled_at.is_some() {
            return Err("scheduledAt and clearSchedule cannot both be set".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
}

impl Validate for CreateTemplateRequest {
    fn validate(&self) -> Result<(), String> {
        require("name", &self.name)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub id: String,
    pub name: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

impl Validate for UpdateTemplateRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTemplateRequest {
    pub id: String,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl Validate for RenderTemplateRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecipientsRequest {
    /// One `email,name,group1;group2` row per line.
    pub text: String,
}

impl Validate for ImportRecipientsRequest {
    fn validate(&self) -> Result<(), String> {
        require("text", &self.text)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecipientActiveRequest {
    pub id: String,
    pub active: bool,
}

impl Validate for SetRecipientActiveRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

use super::validate_input;
use crate::{
    application::services::EmailService,
    domain::{
        entities::{EmailDraftInput, EmailDraftPatch, EmailTemplateInput, EmailTemplatePatch},
        value_objects::{DraftStatus, EmailAddress, TemplateCategory},
    },
    presentation::dto::{
        CreateResponse, IdRequest, MutationResponse, parse_entity_id, parse_timestamp,
        parse_variant,
        email_dto::{
            CreateTemplateRequest, DraftResponse, ImportRecipientsRequest,
            ImportRecipientsResponse, RecipientResponse, RenderTemplateRequest, SaveDraftRequest,
            SetRecipientActiveRequest, TemplatePreviewResponse, TemplateResponse,
            UpdateDraftRequest, UpdateTemplateRequest,
        },
    },
    shared::{AppError, ValidationFailureKind},
};
use std::sync::Arc;

pub struct EmailHandler {
    email_service: Arc<EmailService>,
}

impl EmailHandler {
    pub fn new(email_service: Arc<EmailService>) -> Self {
        Self { email_service }
    }

    // Drafts

    pub async fn save_draft(&self, request: SaveDraftRequest) -> Result<CreateResponse, AppError> {
        validate_input(&request)?;

        let input = EmailDraftInput {
            subject: request.subject,
            content: request.content,
            recipients: parse_emails(&request.recipients)?,
            recipient_groups: request.recipient_groups,
            template_id: request
                .template_id
                .as_deref()
                .map(parse_entity_id)
                .transpose()?,
            scheduled_at: request.scheduled_at.map(parse_timestamp).transpose()?,
        };
        let receipt = self.email_service.save_draft(input).await?;
        Ok(receipt.into())
    }

    pub async fn update_draft(
        &self,
        request: UpdateDraftRequest,
    ) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let id = parse_entity_id(&request.id)?;
        let scheduled_at = if request.clear_schedule {
            Some(None)
        } else {
            request
                .scheduled_at
                .map(parse_timestamp)
                .transpose()?
                .map(Some)
        };
        let patch = EmailDraftPatch {
            subject: request.subject,
            content: request.content,
            recipients: request
                .recipients
                .as_deref()
                .map(parse_emails)
                .transpose()?,
            recipient_groups: request.recipient_groups,
            status: request
                .status
                .as_deref()
                .map(parse_variant::<DraftStatus>)
                .transpose()?,
            scheduled_at,
        };
        let outcome = self.email_service.update_draft(id, patch).await?;
        Ok(outcome.into())
    }

    pub async fn delete_draft(&self, request: IdRequest) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let outcome = self
            .email_service
            .delete_draft(parse_entity_id(&request.id)?)
            .await?;
        Ok(outcome.into())
    }

    pub async fn list_drafts(&self) -> Vec<DraftResponse> {
        self.email_service
            .list_drafts()
            .await
            .into_iter()
            .map(DraftResponse::from)
            .collect()
    }

    // Templates

    pub async fn create_template(
        &self,
        request: CreateTemplateRequest,
    ) -> Result<CreateResponse, AppError> {
        validate_input(&request)?;

        let input = EmailTemplateInput {
            name: request.name,
            subject: request.subject,
            content: request.content,
            category: request
                .category
                .as_deref()
                .map(parse_variant::<TemplateCategory>)
                .transpose()?
                .unwrap_or_default(),
        };
        let receipt = self.email_service.create_template(input).await?;
        Ok(receipt.into())
    }

    pub async fn update_template(
        &self,
        request: UpdateTemplateRequest,
    ) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let id = parse_entity_id(&request.id)?;
        let patch = EmailTemplatePatch {
            name: request.name,
            subject: request.subject,
            content: request.content,
            category: request
                .category
                .as_deref()
                .map(parse_variant::<TemplateCategory>)
                .transpose()?,
        };
        let outcome = self.email_service.update_template(id, patch).await?;
        Ok(outcome.into())
    }

    pub async fn delete_template(&self, request: IdRequest) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let outcome = self
            .email_service
            .delete_template(parse_entity_id(&request.id)?)
            .await?;
        Ok(outcome.into())
    }

    pub async fn duplicate_template(&self, request: IdRequest) -> Result<CreateResponse, AppError> {
        validate_input(&request)?;

        let receipt = self
            .email_service
            .duplicate_template(&parse_entity_id(&request.id)?)
            .await?;
        Ok(receipt.into())
    }

    pub async fn render_template(
        &self,
        request: RenderTemplateRequest,
    ) -> Result<TemplatePreviewResponse, AppError> {
        validate_input(&request)?;

        let preview = self
            .email_service
            .render_template(&parse_entity_id(&request.id)?, &request.values)
            .await?;
        Ok(preview.into())
    }

    pub async fn list_templates(&self) -> Vec<TemplateResponse> {
        self.email_service
            .list_templates()
            .await
            .into_iter()
            .map(TemplateResponse::from)
            .collect()
    }

    // Recipients

    pub async fn import_recipients(
        &self,
        request: ImportRecipientsRequest,
    ) -> Result<ImportRecipientsResponse, AppError> {
        validate_input(&request)?;

        let report = self.email_service.import_recipients(&request.text).await?;
        Ok(report.into())
    }

    pub async fn set_recipient_active(
        &self,
        request: SetRecipientActiveRequest,
    ) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let outcome = self
            .email_service
            .set_recipient_active(parse_entity_id(&request.id)?, request.active)
            .await?;
        Ok(outcome.into())
    }

    pub async fn list_recipients(&self) -> Vec<RecipientResponse> {
        self.email_service
            .list_recipients()
            .await
            .into_iter()
            .map(RecipientResponse::from)
            .collect()
    }
}

fn parse_emails(values: &[String]) -> Result<Vec<EmailAddress>, AppError> {
    values
        .iter()
        .map(|value| {
            EmailAddress::parse(value)
                .map_err(AppError::validation_mapper(ValidationFailureKind::InvalidEmail))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{EmailStores, NotificationCenter};
    use crate::domain::entities::{EmailDraft, EmailTemplate, Recipient};
    use crate::infrastructure::memory::InMemoryRemoteStore;
    use crate::infrastructure::sanitizer::RegexHtmlSanitizer;
    use crate::shared::config::{MutationConfig, NotificationConfig};
    use std::collections::HashMap;

    struct Fixture {
        handler: EmailHandler,
        recipients: Arc<InMemoryRemoteStore<Recipient>>,
    }

    fn fixture() -> Fixture {
        let recipients = Arc::new(InMemoryRemoteStore::<Recipient>::new());
        let stores = EmailStores {
            drafts: Arc::new(InMemoryRemoteStore::<EmailDraft>::new()),
            templates: Arc::new(InMemoryRemoteStore::<EmailTemplate>::new()),
            recipients: recipients.clone(),
        };
        let service = EmailService::new(
            stores,
            Arc::new(RegexHtmlSanitizer::new()),
            &MutationConfig::default(),
            Arc::new(NotificationCenter::new(&NotificationConfig::default())),
        );
        Fixture {
            handler: EmailHandler::new(Arc::new(service)),
            recipients,
        }
    }

    #[tokio::test]
    async fn test_save_draft_with_schedule() {
        let fx = fixture();
        let response = fx
            .handler
            .save_draft(SaveDraftRequest {
                subject: "Mentor week".to_string(),
                content: "<p>See you soon</p>".to_string(),
                recipients: vec!["Ada@Bgr8.uk".to_string()],
                scheduled_at: Some(1_900_000_000_000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.outcome, "committed");

        let drafts = fx.handler.list_drafts().await;
        assert_eq!(drafts[0].status, "scheduled");
        assert_eq!(drafts[0].recipients, vec!["ada@bgr8.uk".to_string()]);
        assert_eq!(drafts[0].scheduled_at, Some(1_900_000_000_000));
    }

    #[tokio::test]
    async fn test_invalid_recipient_email_is_a_validation_error() {
        let fx = fixture();
        let err = fx
            .handler
            .save_draft(SaveDraftRequest {
                subject: "Hello".to_string(),
                recipients: vec!["not-an-address".to_string()],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationFailureKind::InvalidEmail));
        assert!(fx.handler.list_drafts().await.is_empty());
    }

    #[tokio::test]
    async fn test_template_duplicate_and_render() {
        let fx = fixture();
        let created = fx
            .handler
            .create_template(CreateTemplateRequest {
                name: "Welcome".to_string(),
                subject: "Welcome {{ name }}".to_string(),
                content: "<p>Hi {{name}}</p><script>x()</script>".to_string(),
                category: Some("onboarding".to_string()),
            })
            .await
            .unwrap();
        let id = created.id.unwrap();

        let copy = fx
            .handler
            .duplicate_template(IdRequest { id: id.clone() })
            .await
            .unwrap();
        assert_eq!(copy.outcome, "committed");
        assert_eq!(fx.handler.list_templates().await.len(), 2);

        let preview = fx
            .handler
            .render_template(RenderTemplateRequest {
                id,
                values: HashMap::from([("name".to_string(), "Ada".to_string())]),
            })
            .await
            .unwrap();
        assert_eq!(preview.subject, "Welcome Ada");
        assert_eq!(preview.html, "<p>Hi Ada</p>");
        assert!(preview.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_import_then_toggle_active() {
        let fx = fixture();
        let report = fx
            .handler
            .import_recipients(ImportRecipientsRequest {
                text: "ada@bgr8.uk,Ada,mentors\ngrace@bgr8.uk,Grace,mentees".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(report.committed, 2);
        assert_eq!(fx.recipients.len().await, 2);

        let ada = fx
            .handler
            .list_recipients()
            .await
            .into_iter()
            .find(|r| r.email == "ada@bgr8.uk")
            .unwrap();
        let toggled = fx
            .handler
            .set_recipient_active(SetRecipientActiveRequest {
                id: ada.id.clone(),
                active: false,
            })
            .await
            .unwrap();
        assert_eq!(toggled.outcome, "committed");
        let ada = fx
            .handler
            .list_recipients()
            .await
            .into_iter()
            .find(|r| r.id == ada.id)
            .unwrap();
        assert!(!ada.is_active);
    }
}

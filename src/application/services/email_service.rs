use super::collection_view::CollectionView;
use super::notification_center::NotificationCenter;
use super::optimistic_mutator::{
    CreateReceipt, Mutation, MutationOutcome, OptimisticMutator, ensure_committed,
};
use crate::application::ports::{HtmlSanitizer, RemoteStore};
use crate::domain::collection::Entity;
use crate::domain::entities::{
    EmailDraft, EmailDraftInput, EmailDraftPatch, EmailTemplate, EmailTemplateInput,
    EmailTemplatePatch, ImportLineError, Recipient, RecipientInput, RecipientPatch,
    import_errors_to_app_error, parse_recipient_import,
};
use crate::domain::value_objects::{EmailAddress, EntityId};
use crate::shared::config::MutationConfig;
use crate::shared::{AppError, ValidationFailureKind};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePreview {
    pub subject: String,
    pub html: String,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub receipts: Vec<CreateReceipt>,
}

impl ImportReport {
    pub fn committed(&self) -> usize {
        self.receipts
            .iter()
            .filter(|receipt| receipt.outcome.is_committed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.receipts.len() - self.committed()
    }
}

pub struct EmailStores {
    pub drafts: Arc<dyn RemoteStore<EmailDraft>>,
    pub templates: Arc<dyn RemoteStore<EmailTemplate>>,
    pub recipients: Arc<dyn RemoteStore<Recipient>>,
}

/// Email campaign workspace: drafts, templates and the recipient list, each
/// mirrored in its own optimistic collection.
pub struct EmailService {
    stores: EmailStores,
    sanitizer: Arc<dyn HtmlSanitizer>,
    drafts: Arc<OptimisticMutator<EmailDraft>>,
    templates: Arc<OptimisticMutator<EmailTemplate>>,
    recipients: Arc<OptimisticMutator<Recipient>>,
    draft_view: CollectionView<EmailDraft>,
    template_view: CollectionView<EmailTemplate>,
    recipient_view: CollectionView<Recipient>,
}

impl EmailService {
    pub fn new(
        stores: EmailStores,
        sanitizer: Arc<dyn HtmlSanitizer>,
        config: &MutationConfig,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            stores,
            sanitizer,
            drafts: Arc::new(OptimisticMutator::new(config, Arc::clone(&notifications))),
            templates: Arc::new(OptimisticMutator::new(config, Arc::clone(&notifications))),
            recipients: Arc::new(OptimisticMutator::new(config, notifications)),
            draft_view: CollectionView::new(),
            template_view: CollectionView::new(),
            recipient_view: CollectionView::new(),
        }
    }

    pub fn drafts(&self) -> &Arc<OptimisticMutator<EmailDraft>> {
        &self.drafts
    }

    pub fn templates(&self) -> &Arc<OptimisticMutator<EmailTemplate>> {
        &self.templates
    }

    pub fn recipients(&self) -> &Arc<OptimisticMutator<Recipient>> {
        &self.recipients
    }

    pub fn draft_view(&self) -> &CollectionView<EmailDraft> {
        &self.draft_view
    }

    pub fn template_view(&self) -> &CollectionView<EmailTemplate> {
        &self.template_view
    }

    pub fn recipient_view(&self) -> &CollectionView<Recipient> {
        &self.recipient_view
    }

    /// Loads all three collections; each failure raises its own notification.
    pub async fn load(&self) -> Result<(), AppError> {
        let drafts = Arc::clone(&self.stores.drafts);
        let templates = Arc::clone(&self.stores.templates);
        let recipients = Arc::clone(&self.stores.recipients);
        let (drafts, templates, recipients) = tokio::join!(
            self.drafts.load(Box::pin(async move { drafts.list().await })),
            self.templates.load(Box::pin(async move { templates.list().await })),
            self.recipients
                .load(Box::pin(async move { recipients.list().await })),
        );
        drafts?;
        templates?;
        recipients?;
        Ok(())
    }

    // Drafts

    pub async fn save_draft(&self, input: EmailDraftInput) -> Result<CreateReceipt, AppError> {
        let draft = EmailDraft::from_input(input, Utc::now())?;
        tracing::info!(target: "email_service", subject = %draft.subject, "saving draft");
        Ok(create(&self.drafts, &self.stores.drafts, draft, "Failed to save draft").await)
    }

    pub async fn update_draft(
        &self,
        id: EntityId,
        patch: EmailDraftPatch,
    ) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        patch.validate()?;
        let current = self
            .drafts
            .read(|drafts| drafts.get(&id).cloned())
            .await;
        if let Some(draft) = current {
            draft.ensure_editable()?;
        }
        Ok(update(&self.drafts, &self.stores.drafts, id, patch, "Failed to update draft").await)
    }

    pub async fn delete_draft(&self, id: EntityId) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        Ok(delete(&self.drafts, &self.stores.drafts, id, "Failed to delete draft").await)
    }

    pub async fn list_drafts(&self) -> Vec<EmailDraft> {
        self.draft_view.project(&self.drafts).await
    }

    // Templates

    pub async fn create_template(
        &self,
        input: EmailTemplateInput,
    ) -> Result<CreateReceipt, AppError> {
        let template = EmailTemplate::from_input(input, Utc::now())?;
        Ok(create(
            &self.templates,
            &self.stores.templates,
            template,
            "Failed to create template",
        )
        .await)
    }

    pub async fn update_template(
        &self,
        id: EntityId,
        patch: EmailTemplatePatch,
    ) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        patch.validate()?;
        Ok(update(
            &self.templates,
            &self.stores.templates,
            id,
            patch,
            "Failed to update template",
        )
        .await)
    }

    pub async fn delete_template(&self, id: EntityId) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        Ok(delete(&self.templates, &self.stores.templates, id, "Failed to delete template").await)
    }

    /// Optimistically creates a copy of an existing template.
    pub async fn duplicate_template(&self, id: &EntityId) -> Result<CreateReceipt, AppError> {
        let copy = self
            .template(id)
            .await?
            .duplicate(Utc::now());
        Ok(create(
            &self.templates,
            &self.stores.templates,
            copy,
            "Failed to duplicate template",
        )
        .await)
    }

    /// Substitutes `values` into the template and sanitizes the resulting HTML.
    pub async fn render_template(
        &self,
        id: &EntityId,
        values: &HashMap<String, String>,
    ) -> Result<TemplatePreview, AppError> {
        let rendered = self.template(id).await?.render(values);
        if !rendered.unresolved.is_empty() {
            tracing::debug!(
                target: "email_service",
                template = %id,
                unresolved = ?rendered.unresolved,
                "template rendered with unresolved variables"
            );
        }
        Ok(TemplatePreview {
            subject: rendered.subject,
            html: self.sanitizer.sanitize(&rendered.html),
            unresolved: rendered.unresolved,
        })
    }

    pub async fn list_templates(&self) -> Vec<EmailTemplate> {
        self.template_view.project(&self.templates).await
    }

    async fn template(&self, id: &EntityId) -> Result<EmailTemplate, AppError> {
        self.templates
            .read(|templates| templates.get(id).cloned())
            .await
            .ok_or_else(|| AppError::not_found(EmailTemplate::KIND, id))
    }

    // Recipients

    pub async fn add_recipient(&self, input: RecipientInput) -> Result<CreateReceipt, AppError> {
        self.ensure_new_emails(&[(1, input.email.clone())]).await?;
        let recipient = Recipient::from_input(input, Utc::now());
        Ok(create(
            &self.recipients,
            &self.stores.recipients,
            recipient,
            "Failed to add recipient",
        )
        .await)
    }

    /// Validates every line, then runs one optimistic create per recipient
    /// concurrently. Nothing is applied if any line is invalid.
    pub async fn import_recipients(&self, text: &str) -> Result<ImportReport, AppError> {
        let rows = parse_recipient_import(text).map_err(|errors| import_errors_to_app_error(&errors))?;
        if rows.is_empty() {
            return Err(AppError::validation(
                ValidationFailureKind::MissingField,
                "No recipients found in import",
            ));
        }

        let emails: Vec<(usize, EmailAddress)> = rows
            .iter()
            .map(|(line, input)| (*line, input.email.clone()))
            .collect();
        self.ensure_new_emails(&emails).await?;

        tracing::info!(target: "email_service", count = rows.len(), "importing recipients");
        let now = Utc::now();
        let creates = rows.into_iter().map(|(_, input)| {
            create(
                &self.recipients,
                &self.stores.recipients,
                Recipient::from_input(input, now),
                "Failed to import recipient",
            )
        });
        let report = ImportReport {
            receipts: join_all(creates).await,
        };
        if report.failed() > 0 {
            tracing::warn!(
                target: "email_service",
                committed = report.committed(),
                failed = report.failed(),
                "recipient import partially failed"
            );
        }
        Ok(report)
    }

    pub async fn set_recipient_active(
        &self,
        id: EntityId,
        active: bool,
    ) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        let patch = RecipientPatch {
            is_active: Some(active),
            ..Default::default()
        };
        let message = if active {
            "Failed to activate recipient"
        } else {
            "Failed to deactivate recipient"
        };
        Ok(update(&self.recipients, &self.stores.recipients, id, patch, message).await)
    }

    pub async fn delete_recipient(&self, id: EntityId) -> Result<MutationOutcome, AppError> {
        ensure_committed(&id)?;
        Ok(delete(&self.recipients, &self.stores.recipients, id, "Failed to remove recipient").await)
    }

    pub async fn list_recipients(&self) -> Vec<Recipient> {
        self.recipient_view.project(&self.recipients).await
    }

    async fn ensure_new_emails(&self, emails: &[(usize, EmailAddress)]) -> Result<(), AppError> {
        let clashes: Vec<ImportLineError> = self
            .recipients
            .read(|recipients| {
                emails
                    .iter()
                    .filter(|(_, email)| recipients.iter().any(|r| &r.email == email))
                    .map(|(line, email)| ImportLineError {
                        line: *line,
                        message: format!("Duplicate email {email} is already a recipient"),
                    })
                    .collect()
            })
            .await;
        if clashes.is_empty() {
            Ok(())
        } else {
            Err(import_errors_to_app_error(&clashes))
        }
    }
}

async fn create<T: Entity>(
    mutator: &OptimisticMutator<T>,
    store: &Arc<dyn RemoteStore<T>>,
    entity: T,
    failure_message: &str,
) -> CreateReceipt {
    let placeholder = entity.id().clone();
    let store = Arc::clone(store);
    let remote_copy = entity.clone();
    let mutation = Mutation::create(entity, async move { store.create(&remote_copy).await })
        .failure_message(failure_message);
    CreateReceipt::new(placeholder, mutator.perform_returning(mutation).await)
}

async fn update<T: Entity>(
    mutator: &OptimisticMutator<T>,
    store: &Arc<dyn RemoteStore<T>>,
    id: EntityId,
    patch: T::Patch,
    failure_message: &str,
) -> MutationOutcome {
    let store = Arc::clone(store);
    let remote_id = id.clone();
    let remote_patch = patch.clone();
    let mutation = Mutation::update(id, patch, Utc::now(), async move {
        store.update(&remote_id, &remote_patch).await
    })
    .failure_message(failure_message);
    mutator.perform(mutation).await
}

async fn delete<T: Entity>(
    mutator: &OptimisticMutator<T>,
    store: &Arc<dyn RemoteStore<T>>,
    id: EntityId,
    failure_message: &str,
) -> MutationOutcome {
    let store = Arc::clone(store);
    let remote_id = id.clone();
    let mutation = Mutation::delete(id, async move { store.delete(&remote_id).await })
        .failure_message(failure_message);
    mutator.perform(mutation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{DraftStatus, TemplateCategory};
    use crate::infrastructure::memory::InMemoryRemoteStore;
    use crate::infrastructure::sanitizer::RegexHtmlSanitizer;
    use crate::shared::config::NotificationConfig;

    struct Fixture {
        service: EmailService,
        drafts: Arc<InMemoryRemoteStore<EmailDraft>>,
        templates: Arc<InMemoryRemoteStore<EmailTemplate>>,
        recipients: Arc<InMemoryRemoteStore<Recipient>>,
        notifications: Arc<NotificationCenter>,
    }

    fn fixture() -> Fixture {
        let drafts = Arc::new(InMemoryRemoteStore::<EmailDraft>::new());
        let templates = Arc::new(InMemoryRemoteStore::<EmailTemplate>::new());
        let recipients = Arc::new(InMemoryRemoteStore::<Recipient>::new());
        let notifications = Arc::new(NotificationCenter::new(&NotificationConfig::default()));
        let service = EmailService::new(
            EmailStores {
                drafts: drafts.clone(),
                templates: templates.clone(),
                recipients: recipients.clone(),
            },
            Arc::new(RegexHtmlSanitizer::new()),
            &MutationConfig::default(),
            Arc::clone(&notifications),
        );
        Fixture {
            service,
            drafts,
            templates,
            recipients,
            notifications,
        }
    }

    fn welcome() -> EmailTemplateInput {
        EmailTemplateInput {
            name: "Welcome".into(),
            subject: "Welcome {{name}}".into(),
            content: "<p onclick=\"steal()\">Hi {{name}}, meet {{mentor}}</p><script>alert(1)</script>"
                .into(),
            category: TemplateCategory::Onboarding,
        }
    }

    #[tokio::test]
    async fn test_save_and_update_draft() {
        let fx = fixture();
        let receipt = fx
            .service
            .save_draft(EmailDraftInput {
                subject: "Cohort kickoff".into(),
                content: "<p>See you Monday</p>".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = receipt.id.unwrap();
        assert_eq!(fx.drafts.len().await, 1);

        let outcome = fx
            .service
            .update_draft(
                id.clone(),
                EmailDraftPatch {
                    subject: Some("Cohort kickoff (updated)".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(outcome.is_committed());
        assert_eq!(
            fx.drafts.get(&id).await.unwrap().subject,
            "Cohort kickoff (updated)"
        );
    }

    #[tokio::test]
    async fn test_sent_draft_update_is_rejected_before_apply() {
        let fx = fixture();
        let id = fx
            .service
            .save_draft(EmailDraftInput {
                subject: "Sent already".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
            .unwrap();
        fx.service
            .update_draft(
                id.clone(),
                EmailDraftPatch {
                    status: Some(DraftStatus::Sent),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = fx
            .service
            .update_draft(
                id,
                EmailDraftPatch {
                    subject: Some("Too late".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(fx.notifications.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_render_template_sanitizes_and_reports_unresolved() {
        let fx = fixture();
        let id = fx.service.create_template(welcome()).await.unwrap().id.unwrap();

        let mut values = HashMap::new();
        values.insert("name".to_string(), "Ada".to_string());
        let preview = fx.service.render_template(&id, &values).await.unwrap();

        assert_eq!(preview.subject, "Welcome Ada");
        assert!(preview.html.contains("Hi Ada, meet {{mentor}}"));
        assert!(!preview.html.contains("<script"));
        assert!(!preview.html.contains("onclick"));
        assert_eq!(preview.unresolved, vec!["mentor".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_template_creates_copy() {
        let fx = fixture();
        let id = fx.service.create_template(welcome()).await.unwrap().id.unwrap();
        let receipt = fx.service.duplicate_template(&id).await.unwrap();

        assert!(receipt.outcome.is_committed());
        let copy_id = receipt.id.unwrap();
        assert_ne!(copy_id, id);
        assert_eq!(fx.templates.len().await, 2);
        let list = fx.service.templates().snapshot().await;
        assert_eq!(list.get(&copy_id).unwrap().name, "Welcome (copy)");
    }

    #[tokio::test]
    async fn test_duplicate_unknown_template_is_not_found() {
        let fx = fixture();
        let err = fx
            .service
            .duplicate_template(&EntityId::new("missing".into()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_import_recipients_runs_creates_concurrently() {
        let fx = fixture();
        let report = fx
            .service
            .import_recipients("ada@bgr8.uk,Ada,mentors\ngrace@bgr8.uk,Grace,mentors;staff\n")
            .await
            .unwrap();

        assert_eq!(report.committed(), 2);
        assert_eq!(fx.recipients.len().await, 2);
        let local = fx.service.recipients().snapshot().await;
        assert!(local.iter().all(|r| !r.id.is_placeholder()));
    }

    #[tokio::test]
    async fn test_import_with_bad_line_applies_nothing() {
        let fx = fixture();
        let err = fx
            .service
            .import_recipients("ada@bgr8.uk,Ada\nbroken-address,Bob\n")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("line 2"));
        assert!(fx.service.recipients().snapshot().await.is_empty());
        assert_eq!(fx.recipients.len().await, 0);
    }

    #[tokio::test]
    async fn test_import_rejects_existing_recipient() {
        let fx = fixture();
        fx.service.import_recipients("ada@bgr8.uk,Ada").await.unwrap();

        let err = fx
            .service
            .import_recipients("new@bgr8.uk,New\nADA@bgr8.uk,Ada again")
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_kind(),
            Some(ValidationFailureKind::DuplicateEntry)
        );
        assert!(err.to_string().contains("line 2"));
        assert_eq!(fx.recipients.len().await, 1);
    }

    #[tokio::test]
    async fn test_partial_import_failure_rolls_back_only_failed_rows() {
        let fx = fixture();
        fx.recipients.fail_next(1);
        let report = fx
            .service
            .import_recipients("a@bgr8.uk,A\nb@bgr8.uk,B\nc@bgr8.uk,C")
            .await
            .unwrap();

        assert_eq!(report.committed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(fx.service.recipients().snapshot().await.len(), 2);
        assert_eq!(fx.notifications.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_recipient_active_rolls_back_on_failure() {
        let fx = fixture();
        let report = fx.service.import_recipients("ada@bgr8.uk,Ada").await.unwrap();
        let id = report.receipts[0].id.clone().unwrap();

        fx.recipients.set_offline(true);
        let outcome = fx.service.set_recipient_active(id.clone(), false).await.unwrap();
        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        let local = fx.service.recipients().snapshot().await;
        assert!(local.get(&id).unwrap().is_active);

        fx.recipients.set_offline(false);
        let outcome = fx.service.set_recipient_active(id.clone(), false).await.unwrap();
        assert!(outcome.is_committed());
        assert!(!fx.recipients.get(&id).await.unwrap().is_active);
    }
}

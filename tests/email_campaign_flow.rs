use std::collections::HashMap;
use std::sync::Arc;

use bgr8_admin::application::services::EmailStores;
use bgr8_admin::domain::entities::{EmailDraft, EmailTemplate, Recipient};
use bgr8_admin::infrastructure::memory::InMemoryRemoteStore;
use bgr8_admin::presentation::dto::email_dto::{
    CreateTemplateRequest, ImportRecipientsRequest, RenderTemplateRequest, SaveDraftRequest,
    UpdateDraftRequest,
};
use bgr8_admin::shared::{AppConfig, ValidationFailureKind};
use bgr8_admin::{AppState, RemoteStores};

struct Harness {
    state: AppState,
    drafts: Arc<InMemoryRemoteStore<EmailDraft>>,
    recipients: Arc<InMemoryRemoteStore<Recipient>>,
}

fn harness() -> Harness {
    let drafts = Arc::new(InMemoryRemoteStore::<EmailDraft>::new());
    let recipients = Arc::new(InMemoryRemoteStore::<Recipient>::new());
    let mut stores = RemoteStores::in_memory();
    stores.email = EmailStores {
        drafts: drafts.clone(),
        templates: Arc::new(InMemoryRemoteStore::<EmailTemplate>::new()),
        recipients: recipients.clone(),
    };
    Harness {
        state: AppState::with_stores(AppConfig::default(), stores),
        drafts,
        recipients,
    }
}

#[tokio::test]
async fn partial_import_failure_keeps_the_committed_rows() {
    let h = harness();
    h.state.load().await.unwrap();
    h.recipients.fail_next(1);

    let report = h
        .state
        .email_handler
        .import_recipients(ImportRecipientsRequest {
            text: "ada@bgr8.uk,Ada\ngrace@bgr8.uk,Grace\nalan@bgr8.uk,Alan".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(report.committed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(h.state.email_handler.list_recipients().await.len(), 2);
    assert_eq!(h.recipients.len().await, 2);
    assert_eq!(h.state.notifications.active().await.len(), 1);
}

#[tokio::test]
async fn invalid_import_applies_nothing() {
    let h = harness();
    let err = h
        .state
        .email_handler
        .import_recipients(ImportRecipientsRequest {
            text: "ada@bgr8.uk,Ada\nbroken-line,Bob".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.validation_kind(), Some(ValidationFailureKind::InvalidEmail));
    assert!(err.to_string().contains("line 2"));
    assert!(h.state.email_handler.list_recipients().await.is_empty());
    assert_eq!(h.recipients.calls(), 0);
}

#[tokio::test]
async fn offline_draft_save_rolls_back_and_recovers() {
    let h = harness();
    h.drafts.set_offline(true);

    let response = h
        .state
        .email_handler
        .save_draft(SaveDraftRequest {
            subject: "Autumn cohort".to_string(),
            content: "<p>Applications open</p>".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(response.outcome, "rolled_back");
    assert!(h.state.email_handler.list_drafts().await.is_empty());

    h.drafts.set_offline(false);
    let response = h
        .state
        .email_handler
        .save_draft(SaveDraftRequest {
            subject: "Autumn cohort".to_string(),
            content: "<p>Applications open</p>".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let id = response.id.unwrap();

    let updated = h
        .state
        .email_handler
        .update_draft(UpdateDraftRequest {
            id,
            subject: Some("Autumn cohort: last call".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.outcome, "committed");
    assert_eq!(
        h.state.email_handler.list_drafts().await[0].subject,
        "Autumn cohort: last call"
    );
}

#[tokio::test]
async fn rendered_preview_is_sanitized() {
    let h = harness();
    let id = h
        .state
        .email_handler
        .create_template(CreateTemplateRequest {
            name: "Event invite".to_string(),
            subject: "{{event}} invite".to_string(),
            content: r#"<a href="javascript:go()" onclick="x()">RSVP for {{event}}</a>"#
                .to_string(),
            category: Some("event".to_string()),
        })
        .await
        .unwrap()
        .id
        .unwrap();

    let preview = h
        .state
        .email_handler
        .render_template(RenderTemplateRequest {
            id,
            values: HashMap::new(),
        })
        .await
        .unwrap();

    assert_eq!(preview.html, r##"<a href="#">RSVP for {{event}}</a>"##);
    assert_eq!(preview.unresolved, vec!["event".to_string()]);
}

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bgr8_admin::application::services::EmailStores;
use bgr8_admin::domain::entities::{EmailDraft, EmailTemplate, Recipient, Ticket};
use bgr8_admin::infrastructure::memory::InMemoryRemoteStore;
use bgr8_admin::presentation::dto::email_dto::{
    CreateTemplateRequest, ImportRecipientsRequest, RenderTemplateRequest,
    TemplatePreviewResponse,
};
use bgr8_admin::presentation::dto::ticket_dto::{
    AddCommentRequest, CreateTicketRequest, SetSearchRequest, SetSortRequest,
    SetTicketFilterRequest, UpdateTicketRequest, VoteTicketRequest,
};
use bgr8_admin::presentation::dto::{CreateResponse, MutationResponse, NotificationResponse};
use bgr8_admin::shared::{AppConfig, RemoteBackend};
use bgr8_admin::{AppState, RemoteStores, init_logging};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct HarnessSummary {
    backend: String,
    concurrency: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    elapsed_ms: u64,
    created: Vec<CreateResponse>,
    vote: MutationResponse,
    comment: CreateResponse,
    injected_failure: Option<MutationResponse>,
    board_total: usize,
    board_visible: Vec<String>,
    template_preview: Option<TemplatePreviewResponse>,
    imported_recipients: usize,
    notifications: Vec<NotificationResponse>,
}

fn ticket_request(title: &str, priority: &str, tags: &[&str]) -> CreateTicketRequest {
    CreateTicketRequest {
        title: title.to_string(),
        description: format!("Reported during harness run: {title}"),
        priority: Some(priority.to_string()),
        category: Some("bug".to_string()),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        reporter: "harness".to_string(),
    }
}

fn summary_path() -> Option<PathBuf> {
    std::env::var("BGR8_HARNESS_SUMMARY")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn write_summary(path: &PathBuf, summary: &HarnessSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_vec_pretty(summary)?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config.logging.default_filter);
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(
        backend = ?config.remote.backend,
        concurrency = config.mutation.concurrency.as_str(),
        "Starting admin harness"
    );

    // Keep a handle on the in-memory ticket store so a failure can be injected.
    let (state, ticket_store) = match config.remote.backend {
        RemoteBackend::Memory => {
            let tickets = Arc::new(InMemoryRemoteStore::<Ticket>::new());
            let stores = RemoteStores {
                tickets: tickets.clone(),
                email: EmailStores {
                    drafts: Arc::new(InMemoryRemoteStore::<EmailDraft>::new()),
                    templates: Arc::new(InMemoryRemoteStore::<EmailTemplate>::new()),
                    recipients: Arc::new(InMemoryRemoteStore::<Recipient>::new()),
                },
                pool: None,
            };
            (AppState::with_stores(config.clone(), stores), Some(tickets))
        }
        RemoteBackend::Sqlite => (AppState::new(config.clone()).await?, None),
    };
    state.load().await?;

    let tickets = &state.ticket_handler;
    let mut created = Vec::new();
    for request in [
        ticket_request("Crash when saving mentor profile", "critical", &["profile"]),
        ticket_request("Crash on session export", "high", &["sessions", "export"]),
        ticket_request("Footer link typo", "low", &["content"]),
    ] {
        created.push(tickets.create_ticket(request).await?);
    }
    let first_id = created[0].id.clone().unwrap_or_default();
    let second_id = created[1].id.clone().unwrap_or_default();

    let vote = tickets
        .vote_ticket(VoteTicketRequest {
            ticket_id: first_id.clone(),
            user_id: "mentor-1".to_string(),
            direction: "up".to_string(),
        })
        .await?;
    let comment = tickets
        .add_comment(AddCommentRequest {
            ticket_id: second_id,
            author: "mentor-2".to_string(),
            content: "Happens on every export over 50 sessions".to_string(),
        })
        .await?;

    let injected_failure = match &ticket_store {
        Some(store) => {
            store.fail_next(1);
            let response = tickets
                .update_ticket(UpdateTicketRequest {
                    id: first_id,
                    status: Some("resolved".to_string()),
                    ..Default::default()
                })
                .await?;
            info!(outcome = %response.outcome, "Injected failure settled");
            Some(response)
        }
        None => {
            warn!("Failure injection is only available with the memory backend");
            None
        }
    };

    tickets
        .set_filter(SetTicketFilterRequest {
            priorities: vec!["critical".to_string(), "high".to_string()],
            ..Default::default()
        })
        .await?;
    tickets
        .set_search(SetSearchRequest {
            query: "crash".to_string(),
        })
        .await;
    tickets
        .set_sort(SetSortRequest {
            field: "votes".to_string(),
            direction: Some("desc".to_string()),
        })
        .await?;
    let board = tickets.list_tickets().await;

    let email = &state.email_handler;
    let template = email
        .create_template(CreateTemplateRequest {
            name: "Mentor welcome".to_string(),
            subject: "Welcome to Bgr8, {{name}}".to_string(),
            content: "<p>Hi {{name}}, your mentor is {{mentor}}.</p>".to_string(),
            category: Some("onboarding".to_string()),
        })
        .await?;
    let template_preview = match template.id {
        Some(id) => Some(
            email
                .render_template(RenderTemplateRequest {
                    id,
                    values: HashMap::from([("name".to_string(), "Ada".to_string())]),
                })
                .await?,
        ),
        None => None,
    };
    let import = email
        .import_recipients(ImportRecipientsRequest {
            text: "email,name,groups\nada@bgr8.uk,Ada,mentees\ngrace@bgr8.uk,Grace,mentors"
                .to_string(),
        })
        .await?;

    let summary = HarnessSummary {
        backend: format!("{:?}", config.remote.backend).to_ascii_lowercase(),
        concurrency: config.mutation.concurrency.as_str().to_string(),
        started_at,
        finished_at: Utc::now(),
        elapsed_ms: start_instant.elapsed().as_millis() as u64,
        created,
        vote,
        comment,
        injected_failure,
        board_total: board.total,
        board_visible: board.tickets.into_iter().map(|t| t.title).collect(),
        template_preview,
        imported_recipients: import.committed,
        notifications: tickets.notifications().await,
    };

    info!(
        visible = summary.board_visible.len(),
        notifications = summary.notifications.len(),
        "Admin harness finished"
    );

    if let Some(path) = summary_path() {
        if let Err(err) = write_summary(&path, &summary) {
            warn!(path = %path.display(), error = %err, "Failed to write harness summary");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    state.shutdown().await;
    Ok(())
}

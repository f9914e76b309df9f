use super::{Validate, require};
use crate::domain::entities::{Ticket, TicketComment};
use serde::{Deserialize, Serialize};

// Responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub author: String,
    pub content: String,
    pub pending: bool,
    pub created_at: i64,
}

impl From<TicketComment> for CommentResponse {
    fn from(comment: TicketComment) -> Self {
        Self {
            pending: comment.id.is_placeholder(),
            id: comment.id.into(),
            author: comment.author.into(),
            content: comment.content,
            created_at: comment.created_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    /// True while the create is in flight and `id` is a placeholder.
    pub pending: bool,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub tags: Vec<String>,
    pub reporter: String,
    pub assignee: Option<String>,
    pub votes: i64,
    pub upvoters: Vec<String>,
    pub downvoters: Vec<String>,
    pub comments: Vec<CommentResponse>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            pending: ticket.id.is_placeholder(),
            id: ticket.id.into(),
            title: ticket.title,
            description: ticket.description,
            status: ticket.status.as_str().to_string(),
            priority: ticket.priority.as_str().to_string(),
            category: ticket.category.as_str().to_string(),
            tags: ticket.tags,
            reporter: ticket.reporter.into(),
            assignee: ticket.assignee.map(String::from),
            votes: ticket.votes,
            upvoters: ticket.upvoters.into_iter().map(String::from).collect(),
            downvoters: ticket.downvoters.into_iter().map(String::from).collect(),
            comments: ticket.comments.into_iter().map(CommentResponse::from).collect(),
            created_at: ticket.created_at.timestamp_millis(),
            updated_at: ticket.updated_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListResponse {
    pub tickets: Vec<TicketResponse>,
    /// Size of the whole board before filtering.
    pub total: usize,
    pub version: u64,
}

// Requests
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub reporter: String,
}

impl Validate for CreateTicketRequest {
    fn validate(&self) -> Result<(), String> {
        require("title", &self.title)?;
        require("reporter", &self.reporter)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    /// An empty string unassigns the ticket.
    pub assignee: Option<String>,
}

impl Validate for UpdateTicketRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)?;
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTicketRequest {
    pub ticket_id: String,
    pub user_id: String,
    pub direction: String,
}

impl Validate for VoteTicketRequest {
    fn validate(&self) -> Result<(), String> {
        require("ticketId", &self.ticket_id)?;
        require("userId", &self.user_id)?;
        require("direction", &self.direction)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub ticket_id: String,
    pub author: String,
    pub content: String,
}

impl Validate for AddCommentRequest {
    fn validate(&self) -> Result<(), String> {
        require("ticketId", &self.ticket_id)?;
        require("author", &self.author)?;
        require("content", &self.content)
    }
}

/// Empty lists leave that dimension unfiltered.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetTicketFilterRequest {
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSortRequest {
    pub field: String,
    pub direction: Option<String>,
}

impl Validate for SetSortRequest {
    fn validate(&self) -> Result<(), String> {
        require("field", &self.field)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSearchRequest {
    pub query: String,
}

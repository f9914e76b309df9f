use super::comment::TicketComment;
use crate::domain::collection::Entity;
use crate::domain::value_objects::{
    EntityId, TicketCategory, TicketPriority, TicketStatus, UserId, VoteDirection,
};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 20_000;
pub const MAX_TAGS: usize = 20;

/// QA / testing-feedback ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub tags: Vec<String>,
    pub reporter: UserId,
    pub assignee: Option<UserId>,
    pub upvoters: Vec<UserId>,
    pub downvoters: Vec<UserId>,
    pub votes: i64,
    pub comments: Vec<TicketComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Added,
    Removed,
    Switched,
}

#[derive(Debug, Clone, Default)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub tags: Vec<String>,
    pub reporter: Option<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
    pub tags: Option<Vec<String>>,
    pub assignee: Option<Option<UserId>>,
}

impl TicketDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_tags(&self.tags)?;
        if self.reporter.is_none() {
            return Err(AppError::validation(
                ValidationFailureKind::MissingField,
                "Reporter is required",
            ));
        }
        Ok(())
    }
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.assignee.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::validation(
                ValidationFailureKind::Generic,
                "Nothing to update",
            ));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

impl Ticket {
    /// Builds the optimistic copy of a new ticket; the id is a placeholder until commit.
    pub fn from_draft(draft: TicketDraft, now: DateTime<Utc>) -> Result<Self, AppError> {
        draft.validate()?;
        let reporter = draft.reporter.ok_or_else(|| {
            AppError::validation(ValidationFailureKind::MissingField, "Reporter is required")
        })?;
        Ok(Self {
            id: EntityId::placeholder(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            status: TicketStatus::Open,
            priority: draft.priority,
            category: draft.category,
            tags: normalize_tags(draft.tags),
            reporter,
            assignee: None,
            upvoters: Vec::new(),
            downvoters: Vec::new(),
            votes: 0,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Toggles `user`'s vote in `direction`.
    ///
    /// Up and down votes are mutually exclusive; voting the same way twice
    /// removes the vote. The tally is recomputed from the voter sets.
    pub fn apply_vote(&mut self, user: &UserId, direction: VoteDirection) -> VoteOutcome {
        let (same, opposite) = match direction {
            VoteDirection::Up => (&mut self.upvoters, &mut self.downvoters),
            VoteDirection::Down => (&mut self.downvoters, &mut self.upvoters),
        };

        let outcome = if same.contains(user) {
            same.retain(|voter| voter != user);
            VoteOutcome::Removed
        } else if opposite.contains(user) {
            opposite.retain(|voter| voter != user);
            same.push(user.clone());
            VoteOutcome::Switched
        } else {
            same.push(user.clone());
            VoteOutcome::Added
        };

        self.recount_votes();
        outcome
    }

    pub fn recount_votes(&mut self) {
        self.votes = self.upvoters.len() as i64 - self.downvoters.len() as i64;
    }

    pub fn vote_of(&self, user: &UserId) -> Option<VoteDirection> {
        if self.upvoters.contains(user) {
            Some(VoteDirection::Up)
        } else if self.downvoters.contains(user) {
            Some(VoteDirection::Down)
        } else {
            None
        }
    }

    pub fn add_comment(&mut self, comment: TicketComment) {
        self.comments.push(comment);
    }

    pub fn rewrite_comment_id(&mut self, from: &EntityId, to: EntityId) -> bool {
        match self.comments.iter_mut().find(|comment| &comment.id == from) {
            Some(comment) => {
                comment.id = to;
                true
            }
            None => false,
        }
    }

    pub fn remove_comment(&mut self, id: &EntityId) -> Option<TicketComment> {
        let index = self.comments.iter().position(|comment| &comment.id == id)?;
        Some(self.comments.remove(index))
    }
}

impl Entity for Ticket {
    type Patch = TicketPatch;
    const KIND: &'static str = "ticket";

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

    fn apply_patch(&mut self, patch: &TicketPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = &patch.tags {
            self.tags = normalize_tags(tags.clone());
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = assignee.clone();
        }
        self.updated_at = now;
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation(
            ValidationFailureKind::MissingField,
            "Title is required",
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(
            ValidationFailureKind::TooLong,
            format!("Title is too long (max {MAX_TITLE_LEN} characters)"),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(
            ValidationFailureKind::TooLong,
            format!("Description is too long (max {MAX_DESCRIPTION_LEN} characters)"),
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), AppError> {
    if tags.len() > MAX_TAGS {
        return Err(AppError::validation(
            ValidationFailureKind::TooLong,
            format!("At most {MAX_TAGS} tags are allowed"),
        ));
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn sample_ticket() -> Ticket {
        Ticket::from_draft(
            TicketDraft {
                title: "Login button unresponsive".into(),
                description: "Clicking login does nothing on Safari".into(),
                tags: vec!["Login".into(), "safari".into(), "login".into()],
                reporter: Some(user("qa-1")),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_draft_uses_placeholder_and_normalizes_tags() {
        let ticket = sample_ticket();
        assert!(ticket.id.is_placeholder());
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.tags, vec!["login".to_string(), "safari".to_string()]);
        assert_eq!(ticket.votes, 0);
    }

    #[test]
    fn test_from_draft_requires_title() {
        let draft = TicketDraft {
            title: "   ".into(),
            reporter: Some(user("qa-1")),
            ..Default::default()
        };
        let err = Ticket::from_draft(draft, Utc::now()).unwrap_err();
        assert_eq!(
            err.validation_kind(),
            Some(ValidationFailureKind::MissingField)
        );
    }

    #[test]
    fn test_vote_flip_sequence() {
        let mut ticket = sample_ticket();
        let u1 = user("u1");

        assert_eq!(ticket.apply_vote(&u1, VoteDirection::Up), VoteOutcome::Added);
        assert_eq!(ticket.votes, 1);
        assert_eq!(ticket.apply_vote(&u1, VoteDirection::Up), VoteOutcome::Removed);
        assert_eq!(ticket.votes, 0);
        assert_eq!(ticket.apply_vote(&u1, VoteDirection::Down), VoteOutcome::Added);
        assert_eq!(ticket.votes, -1);
        assert_eq!(
            ticket.apply_vote(&u1, VoteDirection::Up),
            VoteOutcome::Switched
        );
        assert_eq!(ticket.votes, 1);
        assert_eq!(ticket.vote_of(&u1), Some(VoteDirection::Up));
        assert!(ticket.downvoters.is_empty());
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut ticket = sample_ticket();
        let before = ticket.clone();
        let patch = TicketPatch {
            status: Some(TicketStatus::Resolved),
            ..Default::default()
        };
        ticket.apply_patch(&patch, Utc::now());
        assert_eq!(ticket.status, TicketStatus::Resolved);
        assert_eq!(ticket.title, before.title);
        assert_eq!(ticket.tags, before.tags);
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        assert!(TicketPatch::default().validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_vote_tally_matches_voter_sets(
            ops in proptest::collection::vec((0..5usize, any::<bool>()), 0..80)
        ) {
            let users: Vec<UserId> = (0..5).map(|i| user(&format!("u{i}"))).collect();
            let mut ticket = sample_ticket();
            for (index, up) in ops {
                let direction = if up { VoteDirection::Up } else { VoteDirection::Down };
                ticket.apply_vote(&users[index], direction);

                prop_assert_eq!(
                    ticket.votes,
                    ticket.upvoters.len() as i64 - ticket.downvoters.len() as i64
                );
                for voter in &ticket.upvoters {
                    prop_assert!(!ticket.downvoters.contains(voter));
                }
            }
        }
    }
}

use crate::domain::collection::Entity;
use crate::domain::value_objects::{EmailAddress, EntityId};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const MAX_RECIPIENT_NAME_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: EntityId,
    pub email: EmailAddress,
    pub name: String,
    pub groups: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientInput {
    pub email: EmailAddress,
    pub name: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientPatch {
    pub name: Option<String>,
    pub groups: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl Recipient {
    pub fn from_input(input: RecipientInput, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::placeholder(),
            email: input.email,
            name: input.name,
            groups: input.groups,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Recipient {
    type Patch = RecipientPatch;
    const KIND: &'static str = "recipient";

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

    fn apply_patch(&mut self, patch: &RecipientPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(groups) = &patch.groups {
            self.groups = normalize_groups(groups.iter().map(String::as_str));
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }
}

/// One rejected line of a bulk import. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLineError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ImportLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parses `email,name,group1;group2` lines.
///
/// Blank lines and `#` comments are skipped, as is a leading `email,...`
/// header. Every line is checked before anything is returned, so a caller
/// sees all problems at once. Accepted rows carry their line number.
pub fn parse_recipient_import(
    text: &str,
) -> Result<Vec<(usize, RecipientInput)>, Vec<ImportLineError>> {
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashMap<EmailAddress, usize> = HashMap::new();
    let mut first_content_line = true;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.splitn(3, ',').map(str::trim);
        let email_field = fields.next().unwrap_or_default();
        let name_field = fields.next().unwrap_or_default();
        let groups_field = fields.next().unwrap_or_default();

        if first_content_line {
            first_content_line = false;
            if email_field.eq_ignore_ascii_case("email") {
                continue;
            }
        }

        let email = match EmailAddress::parse(email_field) {
            Ok(email) => email,
            Err(message) => {
                errors.push(ImportLineError {
                    line: line_no,
                    message,
                });
                continue;
            }
        };

        if name_field.chars().count() > MAX_RECIPIENT_NAME_LEN {
            errors.push(ImportLineError {
                line: line_no,
                message: format!("Name is too long (max {MAX_RECIPIENT_NAME_LEN} characters)"),
            });
            continue;
        }

        if let Some(first) = seen.get(&email) {
            errors.push(ImportLineError {
                line: line_no,
                message: format!("Duplicate email {email} (first seen on line {first})"),
            });
            continue;
        }
        seen.insert(email.clone(), line_no);

        parsed.push((
            line_no,
            RecipientInput {
                email,
                name: name_field.to_string(),
                groups: normalize_groups(groups_field.split(';')),
            },
        ));
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

/// Folds line errors into the single validation error returned to callers.
pub fn import_errors_to_app_error(errors: &[ImportLineError]) -> AppError {
    let details = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    let kind = if errors.iter().all(|e| e.message.starts_with("Duplicate")) {
        ValidationFailureKind::DuplicateEntry
    } else {
        ValidationFailureKind::InvalidEmail
    };
    AppError::validation(kind, format!("Import rejected: {details}"))
}

fn normalize_groups<'a>(groups: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for group in groups {
        let group = group.trim().to_lowercase();
        if !group.is_empty() && !normalized.contains(&group) {
            normalized.push(group);
        }
    }
    normalized
}

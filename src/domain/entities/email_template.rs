use super::email_draft::validate_content;
use crate::domain::collection::Entity;
use crate::domain::value_objects::{EntityId, TemplateCategory};
use crate::shared::{AppError, ValidationFailureKind};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_TEMPLATE_NAME_LEN: usize = 120;

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("variable pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: EntityId,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub category: TemplateCategory,
    /// `{{variable}}` names found in subject and content, in first-seen order.
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EmailTemplateInput {
    pub name: String,
    pub subject: String,
    pub content: String,
    pub category: TemplateCategory,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailTemplatePatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub category: Option<TemplateCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTemplate {
    pub subject: String,
    pub html: String,
    /// Variables with no supplied value; left verbatim in the output.
    pub unresolved: Vec<String>,
}

impl EmailTemplateInput {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        validate_content(&self.content)
    }
}

impl EmailTemplatePatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

impl EmailTemplate {
    pub fn from_input(input: EmailTemplateInput, now: DateTime<Utc>) -> Result<Self, AppError> {
        input.validate()?;
        let mut template = Self {
            id: EntityId::placeholder(),
            name: input.name.trim().to_string(),
            subject: input.subject,
            content: input.content,
            category: input.category,
            variables: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        template.refresh_variables();
        Ok(template)
    }

    /// Copy with a fresh placeholder id and a "(copy)" suffix on the name.
    pub fn duplicate(&self, now: DateTime<Utc>) -> Self {
        let mut name = format!("{} (copy)", self.name);
        if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
            name = name.chars().take(MAX_TEMPLATE_NAME_LEN).collect();
        }
        Self {
            id: EntityId::placeholder(),
            name,
            subject: self.subject.clone(),
            content: self.content.clone(),
            category: self.category,
            variables: self.variables.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn render(&self, values: &HashMap<String, String>) -> RenderedTemplate {
        let mut unresolved = Vec::new();
        let subject = substitute(&self.subject, values, &mut unresolved);
        let html = substitute(&self.content, values, &mut unresolved);
        RenderedTemplate {
            subject,
            html,
            unresolved,
        }
    }

    fn refresh_variables(&mut self) {
        let mut variables = extract_variables(&self.subject);
        for name in extract_variables(&self.content) {
            if !variables.contains(&name) {
                variables.push(name);
            }
        }
        self.variables = variables;
    }
}

pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in VARIABLE_PATTERN.captures_iter(text) {
        let name = captures[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn substitute(
    text: &str,
    values: &HashMap<String, String>,
    unresolved: &mut Vec<String>,
) -> String {
    VARIABLE_PATTERN
        .replace_all(text, |captures: &Captures<'_>| match values.get(&captures[1]) {
            Some(value) => value.clone(),
            None => {
                let name = captures[1].to_string();
                if !unresolved.contains(&name) {
                    unresolved.push(name);
                }
                captures[0].to_string()
            }
        })
        .into_owned()
}

impl Entity for EmailTemplate {
    type Patch = EmailTemplatePatch;
    const KIND: &'static str = "template";

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

    fn apply_patch(&mut self, patch: &EmailTemplatePatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(subject) = &patch.subject {
            self.subject = subject.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.refresh_variables();
        self.updated_at = now;
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation(
            ValidationFailureKind::MissingField,
            "Template name is required",
        ));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(AppError::validation(
            ValidationFailureKind::TooLong,
            format!("Template name is too long (max {MAX_TEMPLATE_NAME_LEN} characters)"),
        ));
    }
    Ok(())
}

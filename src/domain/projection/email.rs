use super::filter::MembershipFilter;
use super::sort::SortKey;
use super::Projectable;
use crate::domain::entities::{EmailDraft, EmailTemplate, Recipient};
use crate::domain::value_objects::{DraftStatus, TemplateCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftFilter {
    pub status: MembershipFilter<DraftStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSortField {
    #[default]
    UpdatedAt,
    CreatedAt,
    Subject,
}

impl Projectable for EmailDraft {
    type Field = DraftSortField;
    type Filter = DraftFilter;

    fn matches_filter(&self, filter: &DraftFilter) -> bool {
        filter.status.allows(&self.status)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.subject.as_str(), self.content.as_str()]
    }

    fn sort_key(&self, field: DraftSortField) -> SortKey<'_> {
        match field {
            DraftSortField::UpdatedAt => SortKey::Timestamp(self.updated_at.timestamp_millis()),
            DraftSortField::CreatedAt => SortKey::Timestamp(self.created_at.timestamp_millis()),
            DraftSortField::Subject => SortKey::Text(&self.subject),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateFilter {
    pub category: MembershipFilter<TemplateCategory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSortField {
    #[default]
    UpdatedAt,
    CreatedAt,
    Name,
}

impl Projectable for EmailTemplate {
    type Field = TemplateSortField;
    type Filter = TemplateFilter;

    fn matches_filter(&self, filter: &TemplateFilter) -> bool {
        filter.category.allows(&self.category)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.subject.as_str(),
            self.content.as_str(),
        ]
    }

    fn sort_key(&self, field: TemplateSortField) -> SortKey<'_> {
        match field {
            TemplateSortField::UpdatedAt => SortKey::Timestamp(self.updated_at.timestamp_millis()),
            TemplateSortField::CreatedAt => SortKey::Timestamp(self.created_at.timestamp_millis()),
            TemplateSortField::Name => SortKey::Text(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipientFilter {
    pub groups: MembershipFilter<String>,
    pub active: MembershipFilter<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSortField {
    #[default]
    CreatedAt,
    Email,
    Name,
}

impl Projectable for Recipient {
    type Field = RecipientSortField;
    type Filter = RecipientFilter;

    fn matches_filter(&self, filter: &RecipientFilter) -> bool {
        filter.groups.allows_any(&self.groups) && filter.active.allows(&self.is_active)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.email.as_str(), self.name.as_str()]
    }

    fn sort_key(&self, field: RecipientSortField) -> SortKey<'_> {
        match field {
            RecipientSortField::CreatedAt => SortKey::Timestamp(self.created_at.timestamp_millis()),
            RecipientSortField::Email => SortKey::Text(self.email.as_str()),
            RecipientSortField::Name => SortKey::Text(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::Collection;
    use crate::domain::entities::RecipientInput;
    use crate::domain::projection::{SearchTerm, SortSpec, project};
    use crate::domain::value_objects::EmailAddress;
    use chrono::Utc;

    fn recipient(email: &str, name: &str, groups: &[&str], active: bool) -> Recipient {
        let mut recipient = Recipient::from_input(
            RecipientInput {
                email: EmailAddress::parse(email).unwrap(),
                name: name.to_string(),
                groups: groups.iter().map(|g| g.to_string()).collect(),
            },
            Utc::now(),
        );
        recipient.is_active = active;
        recipient
    }

    #[test]
    fn test_recipient_group_and_active_filters() {
        let collection = Collection::from_vec(vec![
            recipient("ada@bgr8.uk", "Ada", &["mentors"], true),
            recipient("bob@bgr8.uk", "Bob", &["mentees"], true),
            recipient("cy@bgr8.uk", "Cy", &["mentors", "staff"], false),
        ]);
        let filter = RecipientFilter {
            groups: MembershipFilter::only(["mentors".to_string()]),
            active: MembershipFilter::only([true]),
        };
        let rows = project(
            &collection,
            &filter,
            &SortSpec::asc(RecipientSortField::Email),
            &SearchTerm::default(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ada");
    }

    #[test]
    fn test_recipient_search_matches_email() {
        let collection = Collection::from_vec(vec![
            recipient("ada@bgr8.uk", "Ada", &[], true),
            recipient("bob@example.com", "Bob", &[], true),
        ]);
        let rows = project(
            &collection,
            &RecipientFilter::default(),
            &SortSpec::asc(RecipientSortField::Name),
            &SearchTerm::new("EXAMPLE"),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Bob");
    }
}

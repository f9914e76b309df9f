use super::filter::MembershipFilter;
use super::sort::SortKey;
use super::Projectable;
use crate::domain::entities::Ticket;
use crate::domain::value_objects::{TicketCategory, TicketPriority, TicketStatus};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketFilter {
    pub status: MembershipFilter<TicketStatus>,
    pub priority: MembershipFilter<TicketPriority>,
    pub category: MembershipFilter<TicketCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketSortField {
    CreatedAt,
    UpdatedAt,
    Votes,
    Priority,
    Status,
    Title,
}

impl TicketSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSortField::CreatedAt => "created_at",
            TicketSortField::UpdatedAt => "updated_at",
            TicketSortField::Votes => "votes",
            TicketSortField::Priority => "priority",
            TicketSortField::Status => "status",
            TicketSortField::Title => "title",
        }
    }
}

impl Default for TicketSortField {
    fn default() -> Self {
        TicketSortField::CreatedAt
    }
}

impl fmt::Display for TicketSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "createdat" => Ok(TicketSortField::CreatedAt),
            "updated_at" | "updatedat" => Ok(TicketSortField::UpdatedAt),
            "votes" => Ok(TicketSortField::Votes),
            "priority" => Ok(TicketSortField::Priority),
            "status" => Ok(TicketSortField::Status),
            "title" => Ok(TicketSortField::Title),
            other => Err(format!("Unknown ticket sort field: {other}")),
        }
    }
}

impl Projectable for Ticket {
    type Field = TicketSortField;
    type Filter = TicketFilter;

    fn matches_filter(&self, filter: &TicketFilter) -> bool {
        filter.status.allows(&self.status)
            && filter.priority.allows(&self.priority)
            && filter.category.allows(&self.category)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(2 + self.tags.len());
        fields.push(self.title.as_str());
        fields.push(self.description.as_str());
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn sort_key(&self, field: TicketSortField) -> SortKey<'_> {
        match field {
            TicketSortField::CreatedAt => SortKey::Timestamp(self.created_at.timestamp_millis()),
            TicketSortField::UpdatedAt => SortKey::Timestamp(self.updated_at.timestamp_millis()),
            TicketSortField::Votes => SortKey::Number(self.votes),
            TicketSortField::Priority => SortKey::Rank(self.priority.rank()),
            TicketSortField::Status => SortKey::Rank(self.status.rank()),
            TicketSortField::Title => SortKey::Text(&self.title),
        }
    }
}

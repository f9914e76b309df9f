use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Bug,
    Feature,
    UiUx,
    Performance,
    Other,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Bug => "bug",
            TicketCategory::Feature => "feature",
            TicketCategory::UiUx => "ui_ux",
            TicketCategory::Performance => "performance",
            TicketCategory::Other => "other",
        }
    }
}

impl Default for TicketCategory {
    fn default() -> Self {
        TicketCategory::Bug
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bug" => Ok(TicketCategory::Bug),
            "feature" | "feature_request" => Ok(TicketCategory::Feature),
            "ui_ux" | "ui" | "ux" => Ok(TicketCategory::UiUx),
            "performance" => Ok(TicketCategory::Performance),
            "other" => Ok(TicketCategory::Other),
            other => Err(format!("Unknown ticket category: {other}")),
        }
    }
}

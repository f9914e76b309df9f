use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Draft,
    Scheduled,
    Sent,
    Failed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Scheduled => "scheduled",
            DraftStatus::Sent => "sent",
            DraftStatus::Failed => "failed",
        }
    }

    /// Sent drafts are frozen; everything else can still be edited.
    pub fn is_editable(&self) -> bool {
        !matches!(self, DraftStatus::Sent)
    }
}

impl Default for DraftStatus {
    fn default() -> Self {
        DraftStatus::Draft
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DraftStatus::Draft),
            "scheduled" => Ok(DraftStatus::Scheduled),
            "sent" => Ok(DraftStatus::Sent),
            "failed" => Ok(DraftStatus::Failed),
            other => Err(format!("Unknown draft status: {other}")),
        }
    }
}

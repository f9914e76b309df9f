use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Newsletter,
    Announcement,
    Onboarding,
    Event,
    Other,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Newsletter => "newsletter",
            TemplateCategory::Announcement => "announcement",
            TemplateCategory::Onboarding => "onboarding",
            TemplateCategory::Event => "event",
            TemplateCategory::Other => "other",
        }
    }
}

impl Default for TemplateCategory {
    fn default() -> Self {
        TemplateCategory::Other
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newsletter" => Ok(TemplateCategory::Newsletter),
            "announcement" => Ok(TemplateCategory::Announcement),
            "onboarding" | "welcome" => Ok(TemplateCategory::Onboarding),
            "event" => Ok(TemplateCategory::Event),
            "other" => Ok(TemplateCategory::Other),
            other => Err(format!("Unknown template category: {other}")),
        }
    }
}

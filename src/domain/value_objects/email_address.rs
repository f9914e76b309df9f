use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Lower-cased, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub const MAX_LEN: usize = 254;

    pub fn parse(value: &str) -> Result<Self, String> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err("Email address is required".to_string());
        }
        if normalized.len() > Self::MAX_LEN {
            return Err(format!("Email address is too long: {normalized}"));
        }
        if normalized.contains("..") || !EMAIL_PATTERN.is_match(&normalized) {
            return Err(format!("Invalid email address: {}", value.trim()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, domain)| domain).unwrap_or("")
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let email = EmailAddress::parse("  Jane.Doe@Bgr8.Uk ").unwrap();
        assert_eq!(email.as_str(), "jane.doe@bgr8.uk");
        assert_eq!(email.domain(), "bgr8.uk");
    }

    #[test]
    fn test_parse_rejects_malformed_addresses() {
        for raw in ["", "plainaddress", "missing@tld", "two@@signs.com", "dots..in@mail.com", "a@-bad.com"] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<EmailAddress, _> = serde_json::from_str("\"mentor@bgr8.uk\"");
        assert!(ok.is_ok());
        let bad: Result<EmailAddress, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of accepted values for one field. An empty set accepts everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipFilter<V: Ord>(BTreeSet<V>);

impl<V: Ord> Default for MembershipFilter<V> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<V: Ord> MembershipFilter<V> {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn only(values: impl IntoIterator<Item = V>) -> Self {
        Self(values.into_iter().collect())
    }

    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn allows(&self, value: &V) -> bool {
        self.0.is_empty() || self.0.contains(value)
    }

    /// For multi-valued fields: passes when any of `values` is selected.
    pub fn allows_any<'a>(&self, values: impl IntoIterator<Item = &'a V>) -> bool
    where
        V: 'a,
    {
        if self.0.is_empty() {
            return true;
        }
        values.into_iter().any(|value| self.0.contains(value))
    }

    pub fn insert(&mut self, value: V) -> bool {
        self.0.insert(value)
    }

    pub fn remove(&mut self, value: &V) -> bool {
        self.0.remove(value)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter()
    }
}

impl<V: Ord> FromIterator<V> for MembershipFilter<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::only(iter)
    }
}

/// Normalised free-text search. Blank input is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(Option<String>);

impl SearchTerm {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_lowercase()))
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn matches<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        match &self.0 {
            None => true,
            Some(term) => fields
                .into_iter()
                .any(|field| field.to_lowercase().contains(term.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_membership_is_inactive() {
        let filter: MembershipFilter<u8> = MembershipFilter::any();
        assert!(!filter.is_active());
        assert!(filter.allows(&7));
    }

    #[test]
    fn test_membership_allows_selected_only() {
        let filter = MembershipFilter::only([1u8, 3]);
        assert!(filter.allows(&1));
        assert!(!filter.allows(&2));
        assert!(filter.allows_any(&[2, 3]));
        assert!(!filter.allows_any(&[2, 4]));
    }

    #[test]
    fn test_search_term_is_trimmed_and_case_insensitive() {
        let term = SearchTerm::new("  LoGin ");
        assert_eq!(term.as_str(), Some("login"));
        assert!(term.matches(["Broken LOGIN flow"]));
        assert!(!term.matches(["Signup"]));
        assert!(SearchTerm::new("   ").matches(["anything"]));
    }
}

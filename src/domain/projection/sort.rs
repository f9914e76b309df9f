use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::{fmt, str::FromStr};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortSpec<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: F) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: F) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

impl<F: Default> Default for SortSpec<F> {
    fn default() -> Self {
        Self::new(F::default(), SortDirection::default())
    }
}

/// Comparable projection of one sortable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey<'a> {
    /// Epoch milliseconds.
    Timestamp(i64),
    Number(i64),
    /// Declared order of a ranked enum.
    Rank(u8),
    Text(&'a str),
}

impl SortKey<'_> {
    fn variant_order(&self) -> u8 {
        match self {
            SortKey::Timestamp(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Rank(_) => 2,
            SortKey::Text(_) => 3,
        }
    }

    pub fn compare(&self, other: &SortKey<'_>) -> Ordering {
        match (self, other) {
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.cmp(b),
            (SortKey::Rank(a), SortKey::Rank(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
            (a, b) => a.variant_order().cmp(&b.variant_order()),
        }
    }
}

/// Collation for display strings.
///
/// Base letters decide first, ignoring case and accents, so `Émile` sits
/// with the `e`s. Ties fall to accents (unaccented first), then case
/// (lowercase first), then the raw value.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let (a_decomposed, b_decomposed) = (decompose(a), decompose(b));
    base_letters(&a_decomposed)
        .cmp(base_letters(&b_decomposed))
        .then_with(|| folded(&a_decomposed).cmp(folded(&b_decomposed)))
        .then_with(|| {
            let upper = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();
            upper(&a_decomposed).cmp(&upper(&b_decomposed))
        })
        .then_with(|| a.cmp(b))
}

fn decompose(value: &str) -> String {
    value.nfd().collect()
}

fn base_letters(decomposed: &str) -> impl Iterator<Item = char> + '_ {
    decomposed
        .chars()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
}

fn folded(decomposed: &str) -> impl Iterator<Item = char> + '_ {
    decomposed.chars().flat_map(char::to_lowercase)
}

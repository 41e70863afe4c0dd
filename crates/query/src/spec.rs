//! Normalized query types produced by [`crate::QueryShaper`] and consumed by gateways.

use serde::Serialize;

/// Value kind of a filterable field; drives how raw parameters are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

/// Equality constraint on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: &'static str,
    pub value: FieldValue,
}

/// Free-text term matched as a substring against any of `fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub term: String,
    pub fields: Vec<&'static str>,
}

/// Row filter shared by the page query and the count query.
///
/// All `matches` must hold; `search`, when present, must hit at least one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub search: Option<Search>,
    pub matches: Vec<FieldMatch>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.matches.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub take: u64,
}

/// Pagination metadata echoed back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
}

impl PageMeta {
    /// Number of pages needed to hold `total` rows; `limit` is always at least 1.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}

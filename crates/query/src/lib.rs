//! Query shaping for list endpoints.
//!
//! A [`QueryShaper`] is configured once per resource with the fields clients may
//! search, filter, and sort on. Each request's raw query parameters are then turned
//! into a [`QuerySpec`] plus the [`PageMeta`] to echo back:
//!
//! - `page`, `limit`: 1-based page number and page size (clamped to the max limit)
//! - `search` or `q`: substring match over the searchable fields
//! - `sort`: comma separated keys; `-field` or `field:desc` for descending
//! - `<field>=<value>`: equality on any filterable field
//!
//! Parameters the shaper does not know about are ignored.

use std::collections::HashMap;

use thiserror::Error;

pub mod spec;

pub use spec::{
    FieldKind, FieldMatch, FieldValue, Filter, PageMeta, QuerySpec, Search, SortDirection,
    SortKey,
};

const PAGE_PARAM: &str = "page";
const LIMIT_PARAM: &str = "limit";
const SORT_PARAM: &str = "sort";
const SEARCH_PARAMS: [&str; 2] = ["search", "q"];

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// SQL drivers bind OFFSET and LIMIT as signed 64-bit integers.
const MAX_ROW_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid value '{value}' for '{param}': expected a positive integer")]
    InvalidNumber { param: &'static str, value: String },

    #[error("page {page} with limit {limit} is out of range")]
    PageOutOfRange { page: u64, limit: u64 },

    #[error("cannot sort by '{0}'")]
    UnknownSortField(String),

    #[error("invalid sort direction '{0}'; expected asc or desc")]
    InvalidSortDirection(String),

    #[error("invalid value '{value}' for filter '{field}': expected an integer")]
    InvalidFilterValue { field: &'static str, value: String },
}

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone)]
#[must_use]
pub struct QueryShaper {
    searchable: Vec<&'static str>,
    filterable: Vec<(&'static str, FieldKind)>,
    sortable: Vec<&'static str>,
    default_sort: Vec<SortKey>,
    tiebreaker: Option<SortKey>,
    default_limit: u64,
    max_limit: u64,
}

impl QueryShaper {
    /// Create a shaper whose `search` term is matched against `searchable`.
    pub fn new(searchable: &[&'static str]) -> Self {
        Self {
            searchable: searchable.to_vec(),
            filterable: Vec::new(),
            sortable: Vec::new(),
            default_sort: Vec::new(),
            tiebreaker: None,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    pub fn filterable(mut self, field: &'static str, kind: FieldKind) -> Self {
        self.filterable.push((field, kind));
        self
    }

    pub fn sortable(mut self, fields: &[&'static str]) -> Self {
        self.sortable.extend_from_slice(fields);
        self
    }

    /// Sort applied when the request does not name one.
    pub fn default_sort(mut self, key: SortKey) -> Self {
        self.default_sort.push(key);
        self
    }

    /// Key appended to every sort so that pages are stable across equal values.
    pub fn tiebreaker(mut self, key: SortKey) -> Self {
        self.tiebreaker = Some(key);
        self
    }

    /// Page size used when `limit` is absent, and the cap applied when it is present.
    pub fn limits(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.max_limit = max_limit.clamp(1, MAX_ROW_OFFSET);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    pub fn shape(&self, params: &HashMap<String, String>) -> QueryResult<(QuerySpec, PageMeta)> {
        let page = parse_positive(params, PAGE_PARAM)?.unwrap_or(1);
        let limit = parse_positive(params, LIMIT_PARAM)?
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        let skip = (page - 1)
            .checked_mul(limit)
            .filter(|skip| *skip <= MAX_ROW_OFFSET)
            .ok_or(QueryError::PageOutOfRange { page, limit })?;

        let filter = Filter {
            search: self.search(params),
            matches: self.matches(params)?,
        };
        let sort = self.sort(params)?;

        tracing::debug!(
            page,
            limit,
            sort_keys = sort.len(),
            matches = filter.matches.len(),
            search = filter.search.is_some(),
            "shaped list query"
        );

        Ok((
            QuerySpec {
                filter,
                sort,
                skip,
                take: limit,
            },
            PageMeta { page, limit },
        ))
    }

    fn search(&self, params: &HashMap<String, String>) -> Option<Search> {
        if self.searchable.is_empty() {
            return None;
        }

        SEARCH_PARAMS
            .iter()
            .filter_map(|name| params.get(*name))
            .map(|term| term.trim())
            .find(|term| !term.is_empty())
            .map(|term| Search {
                term: term.to_string(),
                fields: self.searchable.clone(),
            })
    }

    fn matches(&self, params: &HashMap<String, String>) -> QueryResult<Vec<FieldMatch>> {
        let mut matches = Vec::new();

        for &(field, kind) in &self.filterable {
            let Some(raw) = params.get(field) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            let value = match kind {
                FieldKind::Text => FieldValue::Text(raw.clone()),
                FieldKind::Integer => raw.trim().parse::<i64>().map(FieldValue::Integer).map_err(
                    |_| QueryError::InvalidFilterValue {
                        field,
                        value: raw.clone(),
                    },
                )?,
            };
            matches.push(FieldMatch { field, value });
        }

        Ok(matches)
    }

    fn sort(&self, params: &HashMap<String, String>) -> QueryResult<Vec<SortKey>> {
        let mut keys: Vec<SortKey> = Vec::new();

        if let Some(raw) = params.get(SORT_PARAM) {
            for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let key = self.parse_sort_key(token)?;
                if !keys.iter().any(|k| k.field == key.field) {
                    keys.push(key);
                }
            }
        }

        if keys.is_empty() {
            keys.extend(self.default_sort.iter().copied());
        }

        if let Some(tiebreaker) = self.tiebreaker {
            if !keys.iter().any(|k| k.field == tiebreaker.field) {
                keys.push(tiebreaker);
            }
        }

        Ok(keys)
    }

    fn parse_sort_key(&self, token: &str) -> QueryResult<SortKey> {
        let (name, direction) = if let Some(name) = token.strip_prefix('-') {
            (name, SortDirection::Desc)
        } else if let Some((name, dir)) = token.split_once(':') {
            let direction = match dir.trim().to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                _ => return Err(QueryError::InvalidSortDirection(dir.to_string())),
            };
            (name.trim(), direction)
        } else {
            (token, SortDirection::Asc)
        };

        let field = self
            .sortable
            .iter()
            .copied()
            .find(|f| *f == name)
            .ok_or_else(|| QueryError::UnknownSortField(name.to_string()))?;

        Ok(SortKey { field, direction })
    }
}

fn parse_positive(params: &HashMap<String, String>, param: &'static str) -> QueryResult<Option<u64>> {
    let Some(raw) = params.get(param) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(QueryError::InvalidNumber {
            param,
            value: raw.clone(),
        }),
        Ok(value) => Ok(Some(value)),
    }
}

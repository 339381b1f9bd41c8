//! Search request types and full-text query sanitization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::models::EntryType;
use crate::pagination::PageRequest;
use crate::validation::ValidationErrors;

/// Result ordering for text searches.
///
/// Filter-only searches (blank query) are always ordered by recency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    /// `updated_at` descending, id descending.
    #[default]
    Recency,
    /// Field-weighted text rank descending, then recency.
    Relevance,
}

/// A search as requested by a caller.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub project_id: Option<Uuid>,
    pub entry_type: Option<EntryType>,
    /// Inclusive lower bound on `created_at`.
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to_date: Option<DateTime<Utc>>,
    pub page: PageRequest,
    pub order: SearchOrder,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    pub fn with_page(mut self, page_number: i64, page_size: i64) -> Self {
        self.page = PageRequest::new(page_number, page_size);
        self
    }

    pub fn with_order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    /// Reject out-of-range pagination and inverted date ranges.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.page.page_number < defaults::PAGE_NUMBER {
            errors.add("pageNumber", "Page number must be greater than 0");
        }
        if self.page.page_size < defaults::PAGE_SIZE_MIN
            || self.page.page_size > defaults::PAGE_SIZE_MAX
        {
            errors.add(
                "pageSize",
                format!(
                    "Page size must be between {} and {}",
                    defaults::PAGE_SIZE_MIN,
                    defaults::PAGE_SIZE_MAX
                ),
            );
        }
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                errors.add("fromDate", "From date must be before or equal to to date");
            }
        }
        errors.into_result()
    }

    /// Resolve the request into what the store executes.
    ///
    /// A query that sanitizes to nothing behaves exactly like a blank query:
    /// no text matching, no tag matching, recency order.
    pub fn prepare(&self) -> PreparedSearch {
        let raw = self.query.trim();
        let tsquery = sanitize_tsquery(raw);
        let text_query = tsquery.is_some();
        PreparedSearch {
            tag_substring: if text_query {
                Some(raw.to_string())
            } else {
                None
            },
            tsquery,
            project_id: self.project_id,
            entry_type: self.entry_type,
            from_date: self.from_date,
            to_date: self.to_date,
            page: self.page.clamped(),
            order: if text_query {
                self.order
            } else {
                SearchOrder::Recency
            },
        }
    }
}

/// A validated, sanitized search ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSearch {
    /// `to_tsquery` input; `None` means filter-only.
    pub tsquery: Option<String>,
    /// Raw query for case-insensitive tag-name substring matching.
    pub tag_substring: Option<String>,
    pub project_id: Option<Uuid>,
    pub entry_type: Option<EntryType>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub page: PageRequest,
    pub order: SearchOrder,
}

impl PreparedSearch {
    pub fn is_text_query(&self) -> bool {
        self.tsquery.is_some()
    }
}

/// Turn free text into a `to_tsquery` expression requiring every token.
///
/// Boolean and grouping operators (`& | ! ( )`) become whitespace, the text is
/// split on whitespace, and each token is emitted as a quoted tsquery lexeme
/// with embedded quotes and backslashes doubled. Tokens are joined with ` & `.
/// Returns `None` when no tokens remain.
pub fn sanitize_tsquery(query: &str) -> Option<String> {
    let stripped: String = query
        .chars()
        .map(|c| match c {
            '&' | '|' | '!' | '(' | ')' => ' ',
            other => other,
        })
        .collect();

    let tokens: Vec<String> = stripped
        .split_whitespace()
        .map(|token| {
            let escaped = token.replace('\\', "\\\\").replace('\'', "''");
            format!("'{}'", escaped)
        })
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" & "))
    }
}

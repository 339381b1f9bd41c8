//! Full-text search implementation.
//!
//! Entries match when the sanitized query hits the entry's own search vector
//! or its page metadata vector, parsed under either the `english` or the
//! `russian` configuration, or when any of the entry's tag names contains the
//! raw query as a case-insensitive substring. Both vectors are maintained by
//! triggers (see `migrations/`), weighted title A, body B, url/keywords C.
//!
//! Filters (project, type, inclusive `created_at` range) always apply. A
//! filter-only search skips matching entirely and orders by recency.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::{debug, instrument};

use brainshelf_core::{EntryFull, Error, FullTextSearch, Page, PreparedSearch, Result, SearchOrder};

use crate::escape_like;
use crate::rows::{entries_full_from_rows, ENTRY_FULL_COLUMNS, ENTRY_FULL_JOINS};

/// Parsed queries for both configurations; NULL for filter-only searches.
const QUERY_CTE: &str = r#"
    WITH q AS (
        SELECT to_tsquery('english', $1::text) AS en,
               to_tsquery('russian', $1::text) AS ru
    )
"#;

const RANK_LATERAL: &str = r#"
    CROSS JOIN q
    CROSS JOIN LATERAL (
        SELECT COALESCE(GREATEST(
            ts_rank(e.search_vector, q.en),
            ts_rank(e.search_vector, q.ru),
            ts_rank(m.search_vector, q.en),
            ts_rank(m.search_vector, q.ru)
        ), 0) AS rank
    ) r
"#;

const MATCH_FILTER: &str = r#"
    WHERE ($3::uuid IS NULL OR e.project_id = $3)
      AND ($4::text IS NULL OR e.entry_type = $4)
      AND ($5::timestamptz IS NULL OR e.created_at >= $5)
      AND ($6::timestamptz IS NULL OR e.created_at <= $6)
      AND (
            $1::text IS NULL
         OR e.search_vector @@ q.en
         OR e.search_vector @@ q.ru
         OR m.search_vector @@ q.en
         OR m.search_vector @@ q.ru
         OR EXISTS (
                SELECT 1 FROM entry_tag et
                JOIN tag t ON t.id = et.tag_id
                WHERE et.entry_id = e.id
                  AND t.name ILIKE '%' || $2::text || '%' ESCAPE '\'
            )
      )
"#;

/// Full-text search provider using PostgreSQL tsvector.
#[derive(Clone)]
pub struct PgFtsSearch {
    pool: Pool<Postgres>,
}

impl PgFtsSearch {
    /// Create a new PgFtsSearch with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FullTextSearch for PgFtsSearch {
    #[instrument(
        skip(self, search),
        fields(subsystem = "db", component = "search", op = "fts", text = search.is_text_query())
    )]
    async fn search(&self, search: &PreparedSearch) -> Result<Page<EntryFull>> {
        let start = Instant::now();
        let page = search.page;
        let tag_pattern = search.tag_substring.as_deref().map(escape_like);
        let entry_type = search.entry_type.map(|t| t.as_str().to_string());
        let by_relevance = search.order == SearchOrder::Relevance;

        let total: i64 = sqlx::query_scalar(&format!(
            "{} SELECT COUNT(*) {} {} {}",
            QUERY_CTE, ENTRY_FULL_JOINS, RANK_LATERAL, MATCH_FILTER
        ))
        .bind(&search.tsquery)
        .bind(&tag_pattern)
        .bind(search.project_id)
        .bind(&entry_type)
        .bind(search.from_date)
        .bind(search.to_date)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        if total == 0 {
            return Ok(Page::empty(page));
        }

        let rows = sqlx::query(&format!(
            r#"
            {} SELECT {} {} {} {}
            ORDER BY CASE WHEN $9::bool THEN r.rank ELSE 0 END DESC,
                     e.updated_at DESC, e.id DESC
            LIMIT $7 OFFSET $8
            "#,
            QUERY_CTE, ENTRY_FULL_COLUMNS, ENTRY_FULL_JOINS, RANK_LATERAL, MATCH_FILTER
        ))
        .bind(&search.tsquery)
        .bind(&tag_pattern)
        .bind(search.project_id)
        .bind(&entry_type)
        .bind(search.from_date)
        .bind(search.to_date)
        .bind(page.limit())
        .bind(page.offset())
        .bind(by_relevance)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let items = entries_full_from_rows(&self.pool, rows).await?;
        debug!(
            result_count = items.len(),
            total_count = total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search executed"
        );
        Ok(Page::new(items, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_bounds_are_inclusive() {
        assert!(MATCH_FILTER.contains("e.created_at >= $5"));
        assert!(MATCH_FILTER.contains("e.created_at <= $6"));
    }

    #[test]
    fn test_tag_match_escapes_wildcards() {
        assert!(MATCH_FILTER.contains("ESCAPE '\\'"));
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn test_matches_both_vectors_under_both_configs() {
        for needle in [
            "e.search_vector @@ q.en",
            "e.search_vector @@ q.ru",
            "m.search_vector @@ q.en",
            "m.search_vector @@ q.ru",
        ] {
            assert!(MATCH_FILTER.contains(needle), "missing {}", needle);
        }
    }
}

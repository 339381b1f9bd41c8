//! `GET /api/v1/search`

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use brainshelf_core::defaults::{PAGE_NUMBER, PAGE_SIZE};
use brainshelf_core::{EntryFull, EntryType, Page, SearchOrder, SearchRequest};
use brainshelf_search::EntrySearch;

use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::query_types::FlexibleDateTime;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub project_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    pub from_date: Option<FlexibleDateTime>,
    pub to_date: Option<FlexibleDateTime>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<SearchOrder>,
}

impl From<SearchQuery> for SearchRequest {
    fn from(query: SearchQuery) -> Self {
        SearchRequest {
            query: query.q,
            project_id: query.project_id,
            entry_type: query.entry_type,
            from_date: query.from_date.map(Into::into),
            to_date: query.to_date.map(Into::into),
            ..SearchRequest::default()
        }
        .with_page(
            query.page_number.unwrap_or(PAGE_NUMBER),
            query.page_size.unwrap_or(PAGE_SIZE),
        )
        .with_order(query.sort.unwrap_or_default())
    }
}

/// Out-of-range pagination and inverted date ranges are rejected with 400,
/// not clamped.
pub async fn search_entries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Page<EntryFull>>> {
    let page = state.search.search(&query.into()).await?;
    Ok(Json(page))
}

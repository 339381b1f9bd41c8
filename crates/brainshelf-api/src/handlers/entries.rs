//! Entry CRUD and filtered listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use brainshelf_core::defaults::{PAGE_NUMBER, PAGE_SIZE};
use brainshelf_core::validation::{validate_create_entry, validate_update_entry};
use brainshelf_core::{
    CreateEntryRequest, EntryFull, EntryRepository, EntryType, ListEntriesRequest, Page,
    PageRequest, UpdateEntryRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    pub project_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    /// Comma-separated tag names, OR-matched.
    pub tags: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListEntriesQuery {
    pub fn into_request(self) -> ListEntriesRequest {
        ListEntriesRequest {
            project_id: self.project_id,
            entry_type: self.entry_type,
            tags: split_tags(self.tags.as_deref()),
            page: PageRequest::new(
                self.page_number.unwrap_or(PAGE_NUMBER),
                self.page_size.unwrap_or(PAGE_SIZE),
            ),
        }
    }
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub async fn list_entries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEntriesQuery>,
) -> ApiResult<Json<Page<EntryFull>>> {
    Ok(Json(state.db.entries.list(query.into_request()).await?))
}

pub async fn get_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<EntryFull>> {
    state
        .db
        .entries
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Entry with ID {} not found", id)))
}

pub async fn create_entry(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateEntryRequest>,
) -> ApiResult<(StatusCode, Json<EntryFull>)> {
    validate_create_entry(&req)?;
    let entry = state.db.entries.create(req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateEntryRequest>,
) -> ApiResult<Json<EntryFull>> {
    validate_update_entry(&req)?;
    Ok(Json(state.db.entries.update(id, req).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if state.db.entries.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Entry with ID {} not found", id)))
    }
}

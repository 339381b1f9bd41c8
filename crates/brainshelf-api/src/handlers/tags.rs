//! Tag endpoints: listing, usage views, and consolidation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brainshelf_core::defaults::{TAG_LIST_LIMIT, TAG_LIST_LIMIT_MAX, TAG_STATISTICS_TOP_N};
use brainshelf_core::{TagRepository, TagWithUsage};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TagSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(TAG_LIST_LIMIT)
            .clamp(1, TAG_LIST_LIMIT_MAX)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTagBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTagBody {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTagsBody {
    pub source_tag_id: Uuid,
    pub target_tag_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTagsResponse {
    pub message: &'static str,
    pub reassigned_entries: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatisticsResponse {
    pub total_tags: i64,
    pub total_usages: i64,
    pub most_used_tags: Vec<TagWithUsage>,
    pub recently_used_tags: Vec<TagWithUsage>,
    pub unused_tags: Vec<TagWithUsage>,
}

/// All tags, or those whose name contains `?search=`.
pub async fn list_tags(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TagSearchQuery>,
) -> ApiResult<Json<Vec<TagWithUsage>>> {
    let tags = match query.search.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => state.db.tags.search(s).await?,
        _ => state.db.tags.list().await?,
    };
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TagWithUsage>> {
    state
        .db
        .tags
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Tag with ID {} not found", id)))
}

pub async fn popular_tags(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Vec<TagWithUsage>>> {
    Ok(Json(state.db.tags.list_by_usage(query.limit()).await?))
}

pub async fn recent_tags(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Vec<TagWithUsage>>> {
    Ok(Json(state.db.tags.list_recently_used(query.limit()).await?))
}

pub async fn unused_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagWithUsage>>> {
    Ok(Json(state.db.tags.list_unused().await?))
}

pub async fn tag_statistics(
    State(state): State<AppState>,
) -> ApiResult<Json<TagStatisticsResponse>> {
    let tags = &state.db.tags;
    let stats = tags.statistics().await?;
    let most_used_tags = tags.list_by_usage(TAG_STATISTICS_TOP_N).await?;
    let recently_used_tags = tags.list_recently_used(TAG_STATISTICS_TOP_N).await?;
    let unused_tags = tags.list_unused().await?;

    Ok(Json(TagStatisticsResponse {
        total_tags: stats.total_tags,
        total_usages: stats.total_usages,
        most_used_tags,
        recently_used_tags,
        unused_tags,
    }))
}

/// Returns the existing tag when the normalized name is already taken.
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTagBody>,
) -> ApiResult<(StatusCode, Json<brainshelf_core::Tag>)> {
    let tag = state.db.tags.create(&body.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn rename_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RenameTagBody>,
) -> ApiResult<Json<TagWithUsage>> {
    let tag = state.db.consolidation().rename(id, &body.new_name).await?;
    Ok(Json(tag))
}

pub async fn merge_tags(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MergeTagsBody>,
) -> ApiResult<Json<MergeTagsResponse>> {
    let outcome = state
        .db
        .consolidation()
        .merge(body.source_tag_id, body.target_tag_id)
        .await?;
    Ok(Json(MergeTagsResponse {
        message: "Tags merged successfully",
        reassigned_entries: outcome.reassigned_entries,
    }))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.db.consolidation().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(LimitQuery::default().limit(), TAG_LIST_LIMIT);
        assert_eq!(LimitQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(LimitQuery { limit: Some(-5) }.limit(), 1);
        assert_eq!(
            LimitQuery { limit: Some(i64::MAX) }.limit(),
            TAG_LIST_LIMIT_MAX
        );
    }
}

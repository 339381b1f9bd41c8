//! Project CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use brainshelf_core::validation::{validate_create_project, validate_update_project};
use brainshelf_core::{
    CreateProjectRequest, EntryFull, EntryRepository, Page, Project, ProjectRepository,
    UpdateProjectRequest,
};

use super::entries::ListEntriesQuery;
use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

fn project_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Project with ID {} not found", id))
}

pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<Project>>> {
    Ok(Json(state.db.projects.list(query.page_request()).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Project>> {
    state
        .db
        .projects
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| project_not_found(id))
}

pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    validate_create_project(&req)?;
    let project = state.db.projects.create(req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    validate_update_project(&req)?;
    Ok(Json(state.db.projects.update(id, req).await?))
}

/// Deleting a project removes its entries.
pub async fn delete_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if state.db.projects.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(project_not_found(id))
    }
}

/// Entries of one project; accepts the same filters as `/entries` except
/// `projectId`, which the path supplies.
pub async fn list_project_entries(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListEntriesQuery>,
) -> ApiResult<Json<Page<EntryFull>>> {
    if state.db.projects.get(id).await?.is_none() {
        return Err(project_not_found(id));
    }
    let mut req = query.into_request();
    req.project_id = Some(id);
    Ok(Json(state.db.entries.list(req).await?))
}

//! Entry template CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use brainshelf_core::validation::{validate_create_template, validate_update_template};
use brainshelf_core::{
    CreateTemplateRequest, Template, TemplateRepository, UpdateTemplateRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    /// Restrict to this project's templates plus shared ones.
    pub project_id: Option<Uuid>,
}

fn template_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Template with ID {} not found", id))
}

pub async fn list_templates(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TemplateQuery>,
) -> ApiResult<Json<Vec<Template>>> {
    Ok(Json(state.db.templates.list(query.project_id).await?))
}

pub async fn default_templates(State(state): State<AppState>) -> ApiResult<Json<Vec<Template>>> {
    Ok(Json(state.db.templates.list_defaults().await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Template>> {
    state
        .db
        .templates
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| template_not_found(id))
}

pub async fn create_template(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    validate_create_template(&req)?;
    let template = state.db.templates.create(req).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTemplateRequest>,
) -> ApiResult<Json<Template>> {
    validate_update_template(&req)?;
    Ok(Json(state.db.templates.update(id, req).await?))
}

pub async fn delete_template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if state.db.templates.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(template_not_found(id))
    }
}

//! # brainshelf-api
//!
//! HTTP surface for brainshelf. Handlers are thin: they decode the request,
//! run validation, call a repository or the search engine, and map the
//! outcome through [`ApiError`].
//!
//! All resource routes live under `/api/v1`; `/health` sits at the root.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod query_types;

use axum::routing::{get, post, put};
use axum::Router;

use brainshelf_db::Database;
use brainshelf_search::SearchEngine;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub search: SearchEngine,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let search = SearchEngine::new(&db);
        Self { db, search }
    }
}

/// Build the route table. Middleware is layered on by the caller.
pub fn router(state: AppState) -> Router {
    use handlers::{entries, health, projects, search, tags, templates};

    let api = Router::new()
        .route("/search", get(search::search_entries))
        // Tags
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/popular", get(tags::popular_tags))
        .route("/tags/recent", get(tags::recent_tags))
        .route("/tags/unused", get(tags::unused_tags))
        .route("/tags/statistics", get(tags::tag_statistics))
        .route("/tags/merge", post(tags::merge_tags))
        .route("/tags/:id", get(tags::get_tag).delete(tags::delete_tag))
        .route("/tags/:id/rename", put(tags::rename_tag))
        // Entries
        .route(
            "/entries",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route(
            "/entries/:id",
            get(entries::get_entry)
                .put(entries::update_entry)
                .delete(entries::delete_entry),
        )
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/projects/:id/entries", get(projects::list_project_entries))
        // Templates
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/templates/defaults", get(templates::default_templates))
        .route(
            "/templates/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .with_state(state)
}

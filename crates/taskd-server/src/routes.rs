//! REST handlers for the /tasks resource.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use taskd_core::{NewTask, Task, TaskPatch, TaskStats};

use crate::manager::{TaskError, TaskManager};

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TaskManager>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/statistics", get(statistics))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/complete", patch(complete_task))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Boundary error: maps manager results to HTTP statuses with a
/// descriptive JSON body. Store failures become a generic 500; the detail
/// is logged, never exposed.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Internal,
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Validation(msg) => Self::Validation(msg),
            TaskError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("task not found with id: {id}"))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub completed: Option<bool>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteParams {
    pub completed: Option<bool>,
}

/// GET /tasks — completed filter wins over title search; else list all.
async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = match (params.completed, params.title.as_deref()) {
        (Some(flag), _) => state.manager.list_by_completed(flag)?,
        (None, Some(title)) if !title.trim().is_empty() => {
            state.manager.search_by_title(title)?
        }
        _ => state.manager.list_all()?,
    };
    Ok(Json(tasks))
}

/// GET /tasks/{id}
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    match state.manager.get_by_id(id)? {
        Some(task) => Ok(Json(task)),
        None => Err(not_found(id)),
    }
}

/// POST /tasks
async fn create_task(
    State(state): State<AppState>,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.manager.create(new)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /tasks/{id}
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    match state.manager.update(id, patch)? {
        Some(task) => Ok(Json(task)),
        None => Err(not_found(id)),
    }
}

/// DELETE /tasks/{id}
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.manager.delete(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// PATCH /tasks/{id}/complete?completed={bool, default true}
async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<CompleteParams>,
) -> Result<Json<Task>, ApiError> {
    match state.manager.set_completed(id, params.completed)? {
        Some(task) => Ok(Json(task)),
        None => Err(not_found(id)),
    }
}

/// GET /tasks/statistics
async fn statistics(State(state): State<AppState>) -> Result<Json<TaskStats>, ApiError> {
    Ok(Json(state.manager.stats()?))
}

/// Health check HTTP endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

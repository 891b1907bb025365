//! Note and Task REST API Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rolodex_core::{EntityId, Note, NoteForm, NoteUpdate, Task, TaskForm, TaskUpdate};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{
        CompleteTaskRequest, ListNotesRequest, ListNotesResponse, ListTasksRequest,
        ListTasksResponse,
    },
};

// ============================================================================
// NOTES
// ============================================================================

/// GET /api/v1/notes - Notes attached to one entity
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    tag = "Notes",
    params(
        ("entity_type" = String, Query, description = "contact, company, group or tag"),
        ("entity_id" = String, Query, description = "ID of the entity"),
    ),
    responses(
        (status = 200, description = "Notes, newest first", body = ListNotesResponse),
        (status = 400, description = "Missing or invalid query parameters", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notes(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListNotesRequest>,
) -> ApiResult<Json<ListNotesResponse>> {
    let backend = state.backend_for(&auth);
    let notes =
        services::list_notes(backend.as_ref(), &auth, params.entity_type, params.entity_id)
            .await?;
    Ok(Json(ListNotesResponse { notes }))
}

/// POST /api/v1/notes - Create a note
#[utoipa::path(
    post,
    path = "/api/v1/notes",
    tag = "Notes",
    request_body = NoteForm,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_note(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<NoteForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let note = services::create_note(backend.as_ref(), &auth, form).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PATCH /api/v1/notes/{id} - Edit a note's content
#[utoipa::path(
    patch,
    path = "/api/v1/notes/{id}",
    tag = "Notes",
    params(("id" = String, Path, description = "Note ID")),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated", body = Note),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Note not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_note(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<NoteUpdate>,
) -> ApiResult<Json<Note>> {
    let backend = state.backend_for(&auth);
    let note = services::update_note(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(note))
}

/// DELETE /api/v1/notes/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{id}",
    tag = "Notes",
    params(("id" = String, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "Note not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_note(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(&auth);
    services::delete_note(backend.as_ref(), &auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// TASKS
// ============================================================================

/// GET /api/v1/tasks - List tasks, optionally for one entity or completion state
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "Tasks",
    params(
        ("entity_type" = Option<String>, Query, description = "contact, company, group or tag"),
        ("entity_id" = Option<String>, Query, description = "ID of the entity"),
        ("completed" = Option<bool>, Query, description = "Only completed (true) or open (false) tasks"),
    ),
    responses(
        (status = 200, description = "Tasks, earliest due first", body = ListTasksResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListTasksRequest>,
) -> ApiResult<Json<ListTasksResponse>> {
    let backend = state.backend_for(&auth);
    let tasks = services::list_tasks(backend.as_ref(), &auth, &params).await?;
    Ok(Json(ListTasksResponse { tasks }))
}

/// POST /api/v1/tasks - Create a task
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "Tasks",
    request_body = TaskForm,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<TaskForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let task = services::create_task(backend.as_ref(), &auth, form).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PATCH /api/v1/tasks/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task ID")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    let backend = state.backend_for(&auth);
    let task = services::update_task(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(task))
}

/// POST /api/v1/tasks/{id}/complete - Complete or reopen a task
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/complete",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task ID")),
    request_body = CompleteTaskRequest,
    responses(
        (status = 200, description = "Task completion state changed", body = Task),
        (status = 404, description = "Task not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_task(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(req): Json<CompleteTaskRequest>,
) -> ApiResult<Json<Task>> {
    let backend = state.backend_for(&auth);
    let task = services::set_task_completed(backend.as_ref(), &auth, id, req.completed).await?;
    Ok(Json(task))
}

/// DELETE /api/v1/tasks/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(&auth);
    services::delete_task(backend.as_ref(), &auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTERS
// ============================================================================

pub fn note_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/:id", axum::routing::patch(update_note).delete(delete_note))
}

pub fn task_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", axum::routing::patch(update_task).delete(delete_task))
        .route("/:id/complete", post(complete_task))
}

//! Activity Feed, Dashboard and Demo Data Routes

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{
        ClearDemoResponse, DashboardSummary, ListActivityRequest, ListActivityResponse,
        SeedSummary,
    },
};

/// GET /api/v1/activity - The caller's activity feed
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    tag = "Activity",
    params(
        ("entity_type" = Option<String>, Query, description = "Only entries about this kind of entity"),
        ("entity_id" = Option<String>, Query, description = "Only entries about this entity"),
        ("limit" = Option<usize>, Query, description = "Maximum number of entries (default 50, max 200)"),
    ),
    responses(
        (status = 200, description = "Entries, newest first", body = ListActivityResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_activity(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListActivityRequest>,
) -> ApiResult<Json<ListActivityResponse>> {
    let backend = state.backend_for(&auth);
    let entries = services::list_activity(backend.as_ref(), &auth, &params).await?;
    Ok(Json(ListActivityResponse { entries }))
}

/// GET /api/v1/dashboard - Counts and recent items
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<DashboardSummary>> {
    let backend = state.backend_for(&auth);
    let summary = services::dashboard_summary(backend.as_ref(), &auth).await?;
    Ok(Json(summary))
}

/// POST /api/v1/demo/seed - Replace the caller's demo data
#[utoipa::path(
    post,
    path = "/api/v1/demo/seed",
    tag = "Demo",
    responses(
        (status = 200, description = "Demo data loaded", body = SeedSummary),
        (status = 502, description = "Backend write failed part way", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn seed_demo(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<SeedSummary>> {
    let backend = state.backend_for(&auth);
    let summary = services::seed_mock_data(backend.as_ref(), &auth).await?;
    Ok(Json(summary))
}

/// DELETE /api/v1/demo - Remove the caller's demo data
#[utoipa::path(
    delete,
    path = "/api/v1/demo",
    tag = "Demo",
    responses(
        (status = 200, description = "Demo data removed", body = ClearDemoResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_demo(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<ClearDemoResponse>> {
    let backend = state.backend_for(&auth);
    let removed = services::clear_mock_data(backend.as_ref(), &auth).await?;
    Ok(Json(ClearDemoResponse { removed }))
}

pub fn activity_router() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

pub fn dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

pub fn demo_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::delete(clear_demo))
        .route("/seed", post(seed_demo))
}

//! Company, Group and Tag REST API Routes
//!
//! The three kinds share the same shape: CRUD on the entity plus
//! `/{id}/contacts` for assigning and unassigning contacts.

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use rolodex_core::{
    AssignableKind, Company, CompanyForm, CompanyUpdate, EntityId, Group, GroupForm, GroupUpdate,
    Tag, TagForm, TagUpdate,
};

use crate::{
    auth::AuthContext,
    error::{ApiError, ApiResult},
    extractors::ImageForm,
    middleware::AuthExtractor,
    services::{self, AssignOutcome},
    state::AppState,
    types::{
        AssignContactRequest, AssignContactResponse, CompanySummary, EntityContactsResponse,
        GroupSummary, ListCompaniesResponse, ListDirectoryRequest, ListGroupsResponse,
        ListTagsResponse, TagSummary, UploadResponse,
    },
};

// ============================================================================
// SHARED HANDLER BODIES
// ============================================================================

async fn entity_contacts(
    state: &AppState,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
) -> ApiResult<Json<EntityContactsResponse>> {
    let backend = state.backend_for(auth);
    let data = services::fetch_entity_data(backend.as_ref(), auth, kind, entity_id).await?;
    Ok(Json(data))
}

async fn assign(
    state: &AppState,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
    req: AssignContactRequest,
) -> ApiResult<(StatusCode, Json<AssignContactResponse>)> {
    let backend = state.backend_for(auth);
    match services::assign_contact(backend.as_ref(), auth, kind, entity_id, req.contact_id).await? {
        AssignOutcome::Assigned { assignment_id } => Ok((
            StatusCode::CREATED,
            Json(AssignContactResponse {
                entity_id,
                contact_id: req.contact_id,
                assignment_id,
            }),
        )),
        AssignOutcome::AlreadyAssigned => Err(AssignOutcome::conflict(kind)),
    }
}

async fn unassign(
    state: &AppState,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
    contact_id: EntityId,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(auth);
    let removed =
        services::remove_contact(backend.as_ref(), auth, kind, entity_id, contact_id).await?;
    if removed == 0 {
        return Err(ApiError::entity_not_found(
            "assignment",
            format!("{}/{}", entity_id, contact_id),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    state: &AppState,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(auth);
    let unlinked = services::delete_assignable(backend.as_ref(), auth, kind, entity_id).await?;
    tracing::debug!(%kind, %entity_id, unlinked, "Deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// COMPANIES
// ============================================================================

/// GET /api/v1/companies - List companies with contact counts
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "Companies",
    params(
        ("search" = Option<String>, Query, description = "Match on name"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results"),
        ("offset" = Option<usize>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, description = "Companies", body = ListCompaniesResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_companies(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListDirectoryRequest>,
) -> ApiResult<Json<ListCompaniesResponse>> {
    let backend = state.backend_for(&auth);
    let response = services::list_companies(backend.as_ref(), &auth, &params).await?;
    Ok(Json(response))
}

/// POST /api/v1/companies - Create a company
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    tag = "Companies",
    request_body = CompanyForm,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_company(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<CompanyForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let company = services::create_company(backend.as_ref(), &auth, form).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/v1/companies/{id}
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company with contact count", body = CompanySummary),
        (status = 404, description = "Company not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_company(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<CompanySummary>> {
    let backend = state.backend_for(&auth);
    let company = services::get_company(backend.as_ref(), &auth, id).await?;
    Ok(Json(company))
}

/// PATCH /api/v1/companies/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    request_body = CompanyUpdate,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_company(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<CompanyUpdate>,
) -> ApiResult<Json<Company>> {
    let backend = state.backend_for(&auth);
    let company = services::update_company(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(company))
}

/// DELETE /api/v1/companies/{id} - Unlink all contacts, then delete
#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 404, description = "Company not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_company(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    remove(&state, &auth, AssignableKind::Company, id).await
}

/// POST /api/v1/companies/{id}/logo - Upload a logo image
#[utoipa::path(
    post,
    path = "/api/v1/companies/{id}/logo",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    request_body(content_type = "multipart/form-data", description = "Image in the `file` part"),
    responses(
        (status = 200, description = "Logo stored", body = UploadResponse),
        (status = 413, description = "Image too large", body = ApiError),
        (status = 415, description = "Not an image", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_logo(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    ImageForm(upload): ImageForm,
) -> ApiResult<Json<UploadResponse>> {
    let backend = state.backend_for(&auth);
    let objects = state.objects_for(&auth);
    let response = services::upload_company_logo(
        backend.as_ref(),
        objects.as_ref(),
        &auth,
        id,
        upload,
        state.config.max_upload_bytes,
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/companies/{id}/contacts - Assigned and available contacts
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}/contacts",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Assigned contacts and contacts without a company", body = EntityContactsResponse),
        (status = 404, description = "Company not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn company_contacts(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<EntityContactsResponse>> {
    entity_contacts(&state, &auth, AssignableKind::Company, id).await
}

/// POST /api/v1/companies/{id}/contacts - Assign a contact
#[utoipa::path(
    post,
    path = "/api/v1/companies/{id}/contacts",
    tag = "Companies",
    params(("id" = String, Path, description = "Company ID")),
    request_body = AssignContactRequest,
    responses(
        (status = 201, description = "Contact assigned", body = AssignContactResponse),
        (status = 404, description = "Company or contact not found", body = ApiError),
        (status = 409, description = "Contact already has a company", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_company_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(req): Json<AssignContactRequest>,
) -> ApiResult<(StatusCode, Json<AssignContactResponse>)> {
    assign(&state, &auth, AssignableKind::Company, id, req).await
}

/// DELETE /api/v1/companies/{id}/contacts/{contact_id} - Unassign a contact
#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}/contacts/{contact_id}",
    tag = "Companies",
    params(
        ("id" = String, Path, description = "Company ID"),
        ("contact_id" = String, Path, description = "Contact ID"),
    ),
    responses(
        (status = 204, description = "Contact unassigned"),
        (status = 404, description = "Contact is not assigned to this company", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_company_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((id, contact_id)): Path<(EntityId, EntityId)>,
) -> ApiResult<StatusCode> {
    unassign(&state, &auth, AssignableKind::Company, id, contact_id).await
}

// ============================================================================
// GROUPS
// ============================================================================

/// GET /api/v1/groups - List groups with contact counts
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "Groups",
    params(
        ("search" = Option<String>, Query, description = "Match on name"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results"),
        ("offset" = Option<usize>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, description = "Groups", body = ListGroupsResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_groups(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListDirectoryRequest>,
) -> ApiResult<Json<ListGroupsResponse>> {
    let backend = state.backend_for(&auth);
    let response = services::list_groups(backend.as_ref(), &auth, &params).await?;
    Ok(Json(response))
}

/// POST /api/v1/groups
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "Groups",
    request_body = GroupForm,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_group(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<GroupForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let group = services::create_group(backend.as_ref(), &auth, form).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups/{id}
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    tag = "Groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group with contact count", body = GroupSummary),
        (status = 404, description = "Group not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_group(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<GroupSummary>> {
    let backend = state.backend_for(&auth);
    let group = services::get_group(backend.as_ref(), &auth, id).await?;
    Ok(Json(group))
}

/// PATCH /api/v1/groups/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/groups/{id}",
    tag = "Groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = GroupUpdate,
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Group not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_group(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<GroupUpdate>,
) -> ApiResult<Json<Group>> {
    let backend = state.backend_for(&auth);
    let group = services::update_group(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(group))
}

/// DELETE /api/v1/groups/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}",
    tag = "Groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    remove(&state, &auth, AssignableKind::Group, id).await
}

/// GET /api/v1/groups/{id}/contacts
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/contacts",
    tag = "Groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Assigned contacts and contacts not in the group", body = EntityContactsResponse),
        (status = 404, description = "Group not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn group_contacts(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<EntityContactsResponse>> {
    entity_contacts(&state, &auth, AssignableKind::Group, id).await
}

/// POST /api/v1/groups/{id}/contacts
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/contacts",
    tag = "Groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = AssignContactRequest,
    responses(
        (status = 201, description = "Contact assigned", body = AssignContactResponse),
        (status = 404, description = "Group or contact not found", body = ApiError),
        (status = 409, description = "Contact already in this group", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_group_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(req): Json<AssignContactRequest>,
) -> ApiResult<(StatusCode, Json<AssignContactResponse>)> {
    assign(&state, &auth, AssignableKind::Group, id, req).await
}

/// DELETE /api/v1/groups/{id}/contacts/{contact_id}
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}/contacts/{contact_id}",
    tag = "Groups",
    params(
        ("id" = String, Path, description = "Group ID"),
        ("contact_id" = String, Path, description = "Contact ID"),
    ),
    responses(
        (status = 204, description = "Contact removed from group"),
        (status = 404, description = "Contact is not in this group", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_group_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((id, contact_id)): Path<(EntityId, EntityId)>,
) -> ApiResult<StatusCode> {
    unassign(&state, &auth, AssignableKind::Group, id, contact_id).await
}

// ============================================================================
// TAGS
// ============================================================================

/// GET /api/v1/tags - List tags with contact counts
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    params(
        ("search" = Option<String>, Query, description = "Match on name"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results"),
        ("offset" = Option<usize>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, description = "Tags", body = ListTagsResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListDirectoryRequest>,
) -> ApiResult<Json<ListTagsResponse>> {
    let backend = state.backend_for(&auth);
    let response = services::list_tags(backend.as_ref(), &auth, &params).await?;
    Ok(Json(response))
}

/// POST /api/v1/tags
#[utoipa::path(
    post,
    path = "/api/v1/tags",
    tag = "Tags",
    request_body = TagForm,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<TagForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let tag = services::create_tag(backend.as_ref(), &auth, form).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /api/v1/tags/{id}
#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag with contact count", body = TagSummary),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<TagSummary>> {
    let backend = state.backend_for(&auth);
    let tag = services::get_tag(backend.as_ref(), &auth, id).await?;
    Ok(Json(tag))
}

/// PATCH /api/v1/tags/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(("id" = String, Path, description = "Tag ID")),
    request_body = TagUpdate,
    responses(
        (status = 200, description = "Tag updated", body = Tag),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<TagUpdate>,
) -> ApiResult<Json<Tag>> {
    let backend = state.backend_for(&auth);
    let tag = services::update_tag(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(tag))
}

/// DELETE /api/v1/tags/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    remove(&state, &auth, AssignableKind::Tag, id).await
}

/// GET /api/v1/tags/{id}/contacts
#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}/contacts",
    tag = "Tags",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tagged contacts and contacts without the tag", body = EntityContactsResponse),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn tag_contacts(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<EntityContactsResponse>> {
    entity_contacts(&state, &auth, AssignableKind::Tag, id).await
}

/// POST /api/v1/tags/{id}/contacts
#[utoipa::path(
    post,
    path = "/api/v1/tags/{id}/contacts",
    tag = "Tags",
    params(("id" = String, Path, description = "Tag ID")),
    request_body = AssignContactRequest,
    responses(
        (status = 201, description = "Tag applied", body = AssignContactResponse),
        (status = 404, description = "Tag or contact not found", body = ApiError),
        (status = 409, description = "Contact already has this tag", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_tag_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(req): Json<AssignContactRequest>,
) -> ApiResult<(StatusCode, Json<AssignContactResponse>)> {
    assign(&state, &auth, AssignableKind::Tag, id, req).await
}

/// DELETE /api/v1/tags/{id}/contacts/{contact_id}
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}/contacts/{contact_id}",
    tag = "Tags",
    params(
        ("id" = String, Path, description = "Tag ID"),
        ("contact_id" = String, Path, description = "Contact ID"),
    ),
    responses(
        (status = 204, description = "Tag removed from contact"),
        (status = 404, description = "Contact does not have this tag", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_tag_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((id, contact_id)): Path<(EntityId, EntityId)>,
) -> ApiResult<StatusCode> {
    unassign(&state, &auth, AssignableKind::Tag, id, contact_id).await
}

// ============================================================================
// ROUTERS
// ============================================================================

pub fn company_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:id",
            get(get_company).patch(update_company).delete(delete_company),
        )
        .route(
            "/:id/logo",
            post(upload_logo).layer(DefaultBodyLimit::max(
                max_upload_bytes + super::MULTIPART_OVERHEAD,
            )),
        )
        .route(
            "/:id/contacts",
            get(company_contacts).post(assign_company_contact),
        )
        .route(
            "/:id/contacts/:contact_id",
            delete(unassign_company_contact),
        )
}

pub fn group_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:id", get(get_group).patch(update_group).delete(delete_group))
        .route("/:id/contacts", get(group_contacts).post(assign_group_contact))
        .route("/:id/contacts/:contact_id", delete(unassign_group_contact))
}

pub fn tag_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/:id", get(get_tag).patch(update_tag).delete(delete_tag))
        .route("/:id/contacts", get(tag_contacts).post(assign_tag_contact))
        .route("/:id/contacts/:contact_id", delete(unassign_tag_contact))
}

//! Contact REST API Routes
//!
//! Contacts, their favourite flag, avatar and professional details.

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rolodex_core::{ContactForm, ContactUpdate, EntityId, ProfessionalInfoForm};

use crate::{
    error::{ApiError, ApiResult},
    extractors::ImageForm,
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{
        ContactDetail, ContactMutationResponse, FavouriteResponse, ListContactsRequest,
        ListContactsResponse, ToggleFavouriteRequest, UploadResponse,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/contacts - Create a contact
#[utoipa::path(
    post,
    path = "/api/v1/contacts",
    tag = "Contacts",
    request_body = ContactForm,
    responses(
        (status = 201, description = "Contact created; follow-up failures listed in warnings", body = ContactMutationResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(form): Json<ContactForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let response = services::create_contact(backend.as_ref(), &auth, form).await?;
    state
        .favourites
        .observe(auth.user_id, response.contact.id, response.contact.is_favourite);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/contacts - List, search and filter contacts
#[utoipa::path(
    get,
    path = "/api/v1/contacts",
    tag = "Contacts",
    params(
        ("search" = Option<String>, Query, description = "Match on first name, surname or email"),
        ("favourite" = Option<bool>, Query, description = "Only favourites (true) or non-favourites (false)"),
        ("tag_id" = Option<String>, Query, description = "Only contacts with this tag"),
        ("group_id" = Option<String>, Query, description = "Only contacts in this group"),
        ("company_id" = Option<String>, Query, description = "Only contacts at this company"),
        ("sort" = Option<String>, Query, description = "name (default) or recent"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results"),
        ("offset" = Option<usize>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, description = "Matching contacts", body = ListContactsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<ListContactsRequest>,
) -> ApiResult<Json<ListContactsResponse>> {
    let backend = state.backend_for(&auth);
    let response = services::list_contacts(backend.as_ref(), &auth, &params).await?;
    for summary in &response.contacts {
        state
            .favourites
            .observe(auth.user_id, summary.contact.id, summary.contact.is_favourite);
    }
    Ok(Json(response))
}

/// GET /api/v1/contacts/{id} - Contact detail
#[utoipa::path(
    get,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact with tags, group, company and professional info", body = ContactDetail),
        (status = 404, description = "Contact not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<ContactDetail>> {
    let backend = state.backend_for(&auth);
    let detail = services::get_contact_detail(backend.as_ref(), &auth, id).await?;
    state
        .favourites
        .observe(auth.user_id, detail.contact.id, detail.contact.is_favourite);
    Ok(Json(detail))
}

/// PATCH /api/v1/contacts/{id} - Edit a contact
#[utoipa::path(
    patch,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    request_body = ContactUpdate,
    responses(
        (status = 200, description = "Contact updated; follow-up failures listed in warnings", body = ContactMutationResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Contact not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(update): Json<ContactUpdate>,
) -> ApiResult<Json<ContactMutationResponse>> {
    let backend = state.backend_for(&auth);
    let response = services::update_contact(backend.as_ref(), &auth, id, update).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/contacts/{id} - Delete a contact and its dependents
#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(&auth);
    services::delete_contact(backend.as_ref(), &auth, id).await?;
    state.favourites.forget(auth.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/contacts/{id}/favourite - Flip the favourite flag
#[utoipa::path(
    post,
    path = "/api/v1/contacts/{id}/favourite",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    request_body = ToggleFavouriteRequest,
    responses(
        (status = 200, description = "New favourite status", body = FavouriteResponse),
        (status = 404, description = "Contact not found", body = ApiError),
        (status = 409, description = "A toggle for this contact is already in flight", body = ApiError),
        (status = 502, description = "Backend write failed; status unchanged", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_favourite(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    body: Option<Json<ToggleFavouriteRequest>>,
) -> ApiResult<Json<FavouriteResponse>> {
    let known = body.and_then(|Json(req)| req.current_status);
    let backend = state.backend_for(&auth);
    let is_favourite = state
        .favourites
        .toggle(backend.as_ref(), &auth, id, known)
        .await?;
    Ok(Json(FavouriteResponse {
        contact_id: id,
        is_favourite,
    }))
}

/// POST /api/v1/contacts/{id}/avatar - Upload an avatar image
#[utoipa::path(
    post,
    path = "/api/v1/contacts/{id}/avatar",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    request_body(content_type = "multipart/form-data", description = "Image in the `file` part"),
    responses(
        (status = 200, description = "Avatar stored", body = UploadResponse),
        (status = 413, description = "Image too large", body = ApiError),
        (status = 415, description = "Not an image", body = ApiError),
        (status = 404, description = "Contact not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    ImageForm(upload): ImageForm,
) -> ApiResult<Json<UploadResponse>> {
    let backend = state.backend_for(&auth);
    let objects = state.objects_for(&auth);
    let response = services::upload_contact_avatar(
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

/// GET /api/v1/contacts/{id}/professional-info
#[utoipa::path(
    get,
    path = "/api/v1/contacts/{id}/professional-info",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Professional details", body = rolodex_core::ProfessionalInfo),
        (status = 404, description = "No professional details for this contact", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_professional_info(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let info = services::get_professional_info(backend.as_ref(), &auth, id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("professional_info", id))?;
    Ok(Json(info))
}

/// PUT /api/v1/contacts/{id}/professional-info - Create or replace
#[utoipa::path(
    put,
    path = "/api/v1/contacts/{id}/professional-info",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    request_body = ProfessionalInfoForm,
    responses(
        (status = 200, description = "Professional details saved", body = rolodex_core::ProfessionalInfo),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Contact not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_professional_info(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
    Json(form): Json<ProfessionalInfoForm>,
) -> ApiResult<impl IntoResponse> {
    let backend = state.backend_for(&auth);
    let info = services::upsert_professional_info(backend.as_ref(), &auth, id, form).await?;
    Ok(Json(info))
}

/// DELETE /api/v1/contacts/{id}/professional-info
#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}/professional-info",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Professional details removed"),
        (status = 404, description = "No professional details for this contact", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_professional_info(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    let backend = state.backend_for(&auth);
    services::delete_professional_info(backend.as_ref(), &auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/:id",
            get(get_contact).patch(update_contact).delete(delete_contact),
        )
        .route("/:id/favourite", post(toggle_favourite))
        .route(
            "/:id/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(max_upload_bytes + super::MULTIPART_OVERHEAD)),
        )
        .route(
            "/:id/professional-info",
            get(get_professional_info)
                .put(put_professional_info)
                .delete(delete_professional_info),
        )
}

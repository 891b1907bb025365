//! Contact-related API types

use rolodex_core::{Company, Contact, EntityId, Group, ProfessionalInfo, Tag};
use serde::{Deserialize, Serialize};

/// Ordering of the contact list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ContactSort {
    /// First name, then surname.
    #[default]
    Name,
    /// Newest first.
    Recent,
}

/// Query parameters for `GET /api/v1/contacts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListContactsRequest {
    /// Case-insensitive match on first name, surname or email
    pub search: Option<String>,
    pub favourite: Option<bool>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub tag_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub group_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub company_id: Option<EntityId>,
    pub sort: Option<ContactSort>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A contact as shown in list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactSummary {
    pub contact: Contact,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListContactsResponse {
    pub contacts: Vec<ContactSummary>,
    /// Matching contacts before paging
    pub total: u64,
}

/// Everything the contact detail page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactDetail {
    pub contact: Contact,
    pub tags: Vec<Tag>,
    pub group: Option<Group>,
    pub company: Option<Company>,
    pub professional_info: Option<ProfessionalInfo>,
}

/// Result of creating or editing a contact.
///
/// The contact row itself was written. `warnings` lists the follow-up
/// writes (tags, group, company, professional info) that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactMutationResponse {
    pub contact: Contact,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Body of `POST /api/v1/contacts/{id}/favourite`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ToggleFavouriteRequest {
    /// Status the client currently displays. When omitted the server's
    /// view is used.
    pub current_status: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FavouriteResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub contact_id: EntityId,
    pub is_favourite: bool,
}

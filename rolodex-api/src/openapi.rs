//! OpenAPI Specification for the Rolodex API
//!
//! Generated by utoipa from the route annotations and the schema derives
//! on request, response and domain types.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::{AuthEvent, AuthUser, Session};
use crate::error::{ApiError, ErrorCode};
use crate::routes::{activity, auth, contact, directory, health, note};
use crate::types::*;

use rolodex_core::{
    ActivityAction, ActivityLog, Company, CompanyForm, CompanyUpdate, Contact, ContactForm,
    ContactUpdate, EntityType, Gender, Group, GroupForm, GroupUpdate, Note, NoteForm, NoteUpdate,
    ProfessionalInfo, ProfessionalInfoForm, Tag, TagForm, TagUpdate, Task, TaskForm,
    TaskPriority, TaskUpdate,
};

/// OpenAPI document for the Rolodex API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rolodex API",
        version = "0.1.0",
        description = "Personal contact manager: contacts, companies, groups, tags, notes, tasks and an activity feed",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Auth", description = "OAuth sign-in and session management"),
        (name = "Contacts", description = "Contacts, favourites, avatars and professional details"),
        (name = "Companies", description = "Companies and their contacts (one company per contact)"),
        (name = "Groups", description = "Groups and their members"),
        (name = "Tags", description = "Colored labels on contacts"),
        (name = "Notes", description = "Free-text notes on contacts, companies, groups and tags"),
        (name = "Tasks", description = "To-dos with due dates and priorities"),
        (name = "Activity", description = "Audit trail of the caller's changes"),
        (name = "Dashboard", description = "Counts and recent items"),
        (name = "Demo", description = "Fictional demo data"),
        (name = "Health", description = "Liveness and readiness checks")
    ),
    paths(
        // === Auth ===
        auth::login,
        auth::callback,
        auth::session,
        auth::logout,
        auth::events,

        // === Contacts ===
        contact::list_contacts,
        contact::create_contact,
        contact::get_contact,
        contact::update_contact,
        contact::delete_contact,
        contact::toggle_favourite,
        contact::upload_avatar,
        contact::get_professional_info,
        contact::put_professional_info,
        contact::delete_professional_info,

        // === Companies ===
        directory::list_companies,
        directory::create_company,
        directory::get_company,
        directory::update_company,
        directory::delete_company,
        directory::upload_logo,
        directory::company_contacts,
        directory::assign_company_contact,
        directory::unassign_company_contact,

        // === Groups ===
        directory::list_groups,
        directory::create_group,
        directory::get_group,
        directory::update_group,
        directory::delete_group,
        directory::group_contacts,
        directory::assign_group_contact,
        directory::unassign_group_contact,

        // === Tags ===
        directory::list_tags,
        directory::create_tag,
        directory::get_tag,
        directory::update_tag,
        directory::delete_tag,
        directory::tag_contacts,
        directory::assign_tag_contact,
        directory::unassign_tag_contact,

        // === Notes & Tasks ===
        note::list_notes,
        note::create_note,
        note::update_note,
        note::delete_note,
        note::list_tasks,
        note::create_task,
        note::update_task,
        note::complete_task,
        note::delete_task,

        // === Activity, Dashboard, Demo ===
        activity::list_activity,
        activity::dashboard,
        activity::seed_demo,
        activity::clear_demo,

        // === Health ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Auth Types ===
            AuthUser, Session, AuthEvent, auth::SessionInfo,

            // === Contact Types ===
            ListContactsRequest, ListContactsResponse, ContactSummary, ContactDetail,
            ContactMutationResponse, ContactSort, ToggleFavouriteRequest, FavouriteResponse,

            // === Directory Types ===
            ListDirectoryRequest, ListCompaniesResponse, ListGroupsResponse, ListTagsResponse,
            CompanySummary, GroupSummary, TagSummary,
            EntityContactsResponse, AssignContactRequest, AssignContactResponse,

            // === Note & Task Types ===
            ListNotesRequest, ListNotesResponse, ListTasksRequest, ListTasksResponse,
            CompleteTaskRequest,

            // === Activity & Dashboard Types ===
            ListActivityRequest, ListActivityResponse, DashboardSummary, TagUsage,

            // === Demo & Upload Types ===
            SeedSummary, ClearDemoResponse, UploadResponse,

            // === Health Types ===
            health::HealthResponse, health::HealthStatus, health::HealthDetails,
            health::ComponentHealth,

            // === Domain Types (from rolodex-core) ===
            Contact, Company, Group, Tag, Note, Task, ProfessionalInfo, ActivityLog,
            Gender, TaskPriority, EntityType, ActivityAction,

            // === Forms (from rolodex-core) ===
            ContactForm, ContactUpdate, CompanyForm, CompanyUpdate, GroupForm, GroupUpdate,
            TagForm, TagUpdate, NoteForm, NoteUpdate, TaskForm, TaskUpdate,
            ProfessionalInfoForm,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Access token issued by the BaaS auth API
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /auth/callback"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Rolodex API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert!(tags.len() >= 10);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("bearer_auth"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("Rolodex API"));
        assert!(json.contains("\"bearer_auth\""));
        Ok(())
    }

    #[test]
    fn test_id_and_timestamp_fields_are_formatted_strings() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let doc: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;
        let contact = doc
            .pointer("/components/schemas/Contact/properties")
            .ok_or_else(|| "Contact schema missing".to_string())?;

        assert_eq!(contact["id"]["type"], "string");
        assert_eq!(contact["id"]["format"], "uuid");
        assert_eq!(contact["created_at"]["format"], "date-time");
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        for path in [
            "/api/v1/contacts",
            "/api/v1/contacts/{id}",
            "/api/v1/contacts/{id}/favourite",
            "/api/v1/companies/{id}/contacts",
            "/api/v1/groups/{id}/contacts/{contact_id}",
            "/api/v1/tags",
            "/api/v1/notes",
            "/api/v1/tasks/{id}/complete",
            "/api/v1/activity",
            "/api/v1/dashboard",
            "/api/v1/demo/seed",
            "/auth/login",
            "/auth/callback",
            "/health/ready",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }
}

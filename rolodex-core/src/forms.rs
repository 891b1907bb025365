//! Form schemas and their validation rules
//!
//! Every create/update payload is validated here before any backend call is
//! made. Validation collects all failing fields instead of stopping at the
//! first one, so a client can highlight the whole form at once.
//!
//! Required string fields deserialize with `#[serde(default)]`: a missing
//! field becomes an empty string and fails validation with a field error
//! rather than a JSON decoding error.

use crate::{EntityId, EntityType, FieldError, Gender, TaskPriority, ValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// A contact may hold at most this many tags.
pub const MAX_TAGS_PER_CONTACT: usize = 3;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_TAG_NAME_LEN: usize = 30;
pub const MAX_NOTE_LEN: usize = 5000;
pub const MAX_TASK_TITLE_LEN: usize = 200;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-() ]{6,20}$").expect("phone regex is valid"));

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color regex is valid"));

/// Whether `value` looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Trim an optional string, mapping blank values to `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Distinguish "field absent" (`None`) from "field set to null" (`Some(None)`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// ============================================================================
// FIELD CHECKS
// ============================================================================

/// Accumulates field errors for one form.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required(&mut self, field: &str, value: &str, max_len: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.fail(field, "is required");
        } else if trimmed.chars().count() > max_len {
            self.fail(field, format!("must be at most {} characters", max_len));
        }
    }

    fn optional_len(&mut self, field: &str, value: Option<&str>, max_len: usize) {
        if let Some(v) = value {
            if v.trim().chars().count() > max_len {
                self.fail(field, format!("must be at most {} characters", max_len));
            }
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.fail(field, "is required");
        } else if !is_valid_email(trimmed) {
            self.fail(field, "must be a valid email address");
        }
    }

    fn optional_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !is_valid_email(v) {
                self.fail(field, "must be a valid email address");
            }
        }
    }

    fn optional_phone(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !PHONE_RE.is_match(v) {
                self.fail(field, "must be 6-20 digits, spaces or +-()");
            }
        }
    }

    fn optional_url(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let ok = url::Url::parse(v)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                self.fail(field, "must be an http(s) URL");
            }
        }
    }

    fn color(&mut self, field: &str, value: &str) {
        if !COLOR_RE.is_match(value.trim()) {
            self.fail(field, "must be a #rrggbb colour");
        }
    }

    fn tags(&mut self, field: &str, tag_ids: &[EntityId]) {
        if tag_ids.len() > MAX_TAGS_PER_CONTACT {
            self.fail(
                field,
                format!("a contact may hold at most {} tags", MAX_TAGS_PER_CONTACT),
            );
        }
        let mut seen = std::collections::HashSet::new();
        if !tag_ids.iter().all(|id| seen.insert(*id)) {
            self.fail(field, "must not contain duplicates");
        }
    }

    fn attachment_target(&mut self, field: &str, entity_type: EntityType) {
        if !entity_type.accepts_attachments() {
            self.fail(
                field,
                format!("notes and tasks cannot be attached to a {}", entity_type),
            );
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self.errors))
        }
    }
}

// ============================================================================
// CONTACT FORMS
// ============================================================================

/// Professional details captured alongside a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfessionalInfoForm {
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub work_email: Option<String>,
    pub work_phone: Option<String>,
    pub linkedin_url: Option<String>,
}

impl ProfessionalInfoForm {
    /// True when no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        [
            &self.job_title,
            &self.department,
            &self.work_email,
            &self.work_phone,
            &self.linkedin_url,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    fn check(&self, checks: &mut Checks) {
        checks.optional_len("job_title", self.job_title.as_deref(), 100);
        checks.optional_len("department", self.department.as_deref(), 100);
        checks.optional_email("work_email", self.work_email.as_deref());
        checks.optional_phone("work_phone", self.work_phone.as_deref());
        checks.optional_url("linkedin_url", self.linkedin_url.as_deref());
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        self.check(&mut checks);
        checks.finish()
    }
}

/// Add-contact form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub birthday: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub tag_ids: Vec<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub group_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub company_id: Option<EntityId>,
    #[serde(default)]
    pub professional: ProfessionalInfoForm,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.required("first_name", &self.first_name, MAX_NAME_LEN);
        checks.required("surname", &self.surname, MAX_NAME_LEN);
        checks.email("email", &self.email);
        checks.optional_phone("phone", self.phone.as_deref());
        if self.gender.is_none() {
            checks.fail("gender", "is required");
        }
        checks.optional_len("address", self.address.as_deref(), 250);
        checks.tags("tag_ids", &self.tag_ids);
        self.professional.check(&mut checks);
        checks.finish()
    }
}

/// Edit-contact form. Absent fields are left unchanged.
///
/// `group_id`/`company_id` distinguish absent (keep) from `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub birthday: Option<NaiveDate>,
    pub address: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<String>>))]
    pub tag_ids: Option<Vec<EntityId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub group_id: Option<Option<EntityId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub company_id: Option<Option<EntityId>>,
}

impl ContactUpdate {
    pub fn has_any_updates(&self) -> bool {
        self.first_name.is_some()
            || self.surname.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.gender.is_some()
            || self.birthday.is_some()
            || self.address.is_some()
            || self.tag_ids.is_some()
            || self.group_id.is_some()
            || self.company_id.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_any_updates() {
            return Err(ValidationError::EmptyUpdate);
        }
        let mut checks = Checks::default();
        if let Some(v) = &self.first_name {
            checks.required("first_name", v, MAX_NAME_LEN);
        }
        if let Some(v) = &self.surname {
            checks.required("surname", v, MAX_NAME_LEN);
        }
        if let Some(v) = &self.email {
            checks.email("email", v);
        }
        checks.optional_phone("phone", self.phone.as_deref());
        checks.optional_len("address", self.address.as_deref(), 250);
        if let Some(tags) = &self.tag_ids {
            checks.tags("tag_ids", tags);
        }
        checks.finish()
    }
}

// ============================================================================
// COMPANY / GROUP / TAG FORMS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyForm {
    #[serde(default)]
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

impl CompanyForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, 100);
        checks.optional_len("industry", self.industry.as_deref(), 100);
        checks.optional_url("website", self.website.as_deref());
        checks.optional_len("description", self.description.as_deref(), 1000);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

impl CompanyUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none()
            && self.industry.is_none()
            && self.website.is_none()
            && self.description.is_none()
        {
            return Err(ValidationError::EmptyUpdate);
        }
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, 100);
        }
        checks.optional_len("industry", self.industry.as_deref(), 100);
        checks.optional_url("website", self.website.as_deref());
        checks.optional_len("description", self.description.as_deref(), 1000);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GroupForm {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

impl GroupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, MAX_NAME_LEN);
        checks.optional_len("description", self.description.as_deref(), 500);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GroupUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none() && self.description.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_NAME_LEN);
        }
        checks.optional_len("description", self.description.as_deref(), 500);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl TagForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.required("name", &self.name, MAX_TAG_NAME_LEN);
        checks.color("color", &self.color);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl TagUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none() && self.color.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.required("name", name, MAX_TAG_NAME_LEN);
        }
        if let Some(color) = &self.color {
            checks.color("color", color);
        }
        checks.finish()
    }
}

// ============================================================================
// NOTE / TASK FORMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteForm {
    pub entity_type: EntityType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    #[serde(default)]
    pub content: String,
}

impl NoteForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.attachment_target("entity_type", self.entity_type);
        checks.required("content", &self.content, MAX_NOTE_LEN);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteUpdate {
    #[serde(default)]
    pub content: String,
}

impl NoteUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.required("content", &self.content, MAX_NOTE_LEN);
        checks.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskForm {
    pub entity_type: EntityType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl TaskForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::default();
        checks.attachment_target("entity_type", self.entity_type);
        checks.required("title", &self.title, MAX_TASK_TITLE_LEN);
        checks.optional_len("description", self.description.as_deref(), 2000);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<TaskPriority>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
        {
            return Err(ValidationError::EmptyUpdate);
        }
        let mut checks = Checks::default();
        if let Some(title) = &self.title {
            checks.required("title", title, MAX_TASK_TITLE_LEN);
        }
        checks.optional_len("description", self.description.as_deref(), 2000);
        checks.finish()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any well-formed contact passes validation.
        #[test]
        fn prop_well_formed_contact_is_valid(
            first in "[A-Z][a-z]{1,20}",
            surname in "[A-Z][a-z]{1,20}",
            local in "[a-z]{1,10}",
            domain in "[a-z]{2,10}",
            female in any::<bool>(),
        ) {
            let form = ContactForm {
                first_name: first,
                surname,
                email: format!("{}@{}.com", local, domain),
                gender: Some(if female { Gender::Female } else { Gender::Male }),
                ..Default::default()
            };
            prop_assert!(form.validate().is_ok());
        }

        /// Whitespace-only names never pass.
        #[test]
        fn prop_blank_first_name_is_invalid(blank in "[ \t]{0,5}") {
            let form = ContactForm {
                first_name: blank,
                surname: "Doe".to_string(),
                email: "jane@doe.com".to_string(),
                gender: Some(Gender::Female),
                ..Default::default()
            };
            prop_assert!(form.validate().is_err());
        }

        /// More than three tags never pass.
        #[test]
        fn prop_more_than_three_tags_is_invalid(extra in 1usize..5) {
            let form = ContactForm {
                first_name: "Jane".to_string(),
                surname: "Doe".to_string(),
                email: "jane@doe.com".to_string(),
                gender: Some(Gender::Female),
                tag_ids: (0..MAX_TAGS_PER_CONTACT + extra).map(|_| crate::new_entity_id()).collect(),
                ..Default::default()
            };
            prop_assert!(form.validate().is_err());
        }
    }
}

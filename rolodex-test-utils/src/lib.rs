//! Rolodex Test Utilities
//!
//! Shared test infrastructure for the Rolodex workspace:
//! - Proptest generators for entities and forms
//! - Test fixtures for common scenarios
//! - Custom assertions for validation and storage results

// Re-export the in-memory backends from their source crate
pub use rolodex_storage::{MockBackend, MockObjectStore, StoredObject};

// Re-export core types for convenience
pub use rolodex_core::{
    new_entity_id, now, ActivityAction, ActivityLog, AssignableKind, Company, CompanyForm,
    Contact, ContactCompany, ContactForm, ContactGroup, ContactTag, EntityId, EntityType,
    FieldError, Gender, Group, GroupForm, Note, NoteForm, ProfessionalInfo,
    ProfessionalInfoForm, RolodexError, RolodexResult, StorageError, StorageResult, Table, Tag,
    TagForm, Task, TaskForm, TaskPriority, Timestamp, UserId, ValidationError,
    MAX_TAGS_PER_CONTACT,
};

use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Rolodex entities and forms.

    use super::*;
    use proptest::prelude::*;

    // === Identity Generators ===

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    // === Enum Generators ===

    pub fn arb_gender() -> impl Strategy<Value = Gender> {
        prop::sample::select(Gender::ALL.to_vec())
    }

    pub fn arb_task_priority() -> impl Strategy<Value = TaskPriority> {
        prop::sample::select(TaskPriority::ALL.to_vec())
    }

    pub fn arb_entity_type() -> impl Strategy<Value = EntityType> {
        prop::sample::select(EntityType::ALL.to_vec())
    }

    /// Entity types notes and tasks may be attached to.
    pub fn arb_attachable_entity_type() -> impl Strategy<Value = EntityType> {
        prop_oneof![
            Just(EntityType::Contact),
            Just(EntityType::Company),
            Just(EntityType::Group),
            Just(EntityType::Tag),
        ]
    }

    pub fn arb_assignable_kind() -> impl Strategy<Value = AssignableKind> {
        prop::sample::select(AssignableKind::ALL.to_vec())
    }

    // === Field Generators ===

    /// A non-blank name of at most `max_len` characters.
    pub fn arb_name(max_len: usize) -> impl Strategy<Value = String> {
        let pattern = format!("[A-Za-z][A-Za-z '-]{{0,{}}}", max_len.saturating_sub(1));
        proptest::string::string_regex(&pattern).expect("name pattern is a valid regex")
    }

    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9.]{0,15}", "[a-z]{1,12}", "[a-z]{2,6}")
            .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
    }

    pub fn arb_phone() -> impl Strategy<Value = String> {
        "\\+?[0-9]{6,15}".prop_map(|s| s)
    }

    /// A valid `#rrggbb` colour.
    pub fn arb_tag_color() -> impl Strategy<Value = String> {
        any::<[u8; 3]>().prop_map(|[r, g, b]| format!("#{:02x}{:02x}{:02x}", r, g, b))
    }

    // === Form Generators ===

    /// A contact form that passes validation.
    pub fn arb_contact_form() -> impl Strategy<Value = ContactForm> {
        (
            arb_name(50),
            arb_name(50),
            arb_email(),
            prop::option::of(arb_phone()),
            arb_gender(),
        )
            .prop_map(|(first_name, surname, email, phone, gender)| ContactForm {
                first_name,
                surname,
                email,
                phone,
                gender: Some(gender),
                ..Default::default()
            })
    }

    /// A tag form that passes validation.
    pub fn arb_tag_form() -> impl Strategy<Value = TagForm> {
        (arb_name(30), arb_tag_color()).prop_map(|(name, color)| TagForm { name, color })
    }

    /// A note form that passes validation.
    pub fn arb_note_form() -> impl Strategy<Value = NoteForm> {
        (arb_attachable_entity_type(), arb_uuid(), "[A-Za-z0-9 .,!?]{1,500}").prop_map(
            |(entity_type, entity_id, content)| NoteForm {
                entity_type,
                entity_id,
                content: format!("n{}", content),
            },
        )
    }

    /// A task form that passes validation.
    pub fn arb_task_form() -> impl Strategy<Value = TaskForm> {
        (
            arb_attachable_entity_type(),
            arb_uuid(),
            arb_name(200),
            arb_task_priority(),
        )
            .prop_map(|(entity_type, entity_id, title, priority)| TaskForm {
                entity_type,
                entity_id,
                title,
                description: None,
                due_date: None,
                priority,
            })
    }

    // === Entity Generators ===

    /// Generate a Contact owned by `user_id`.
    pub fn arb_contact(user_id: UserId) -> impl Strategy<Value = Contact> {
        (
            arb_uuid(),
            arb_name(50),
            arb_name(50),
            arb_email(),
            arb_gender(),
            any::<bool>(),
            arb_timestamp(),
        )
            .prop_map(
                move |(id, first_name, surname, email, gender, is_favourite, created_at)| Contact {
                    id,
                    user_id,
                    first_name,
                    surname,
                    email,
                    phone: None,
                    gender,
                    birthday: None,
                    address: None,
                    avatar_url: None,
                    is_favourite,
                    is_demo: false,
                    created_at,
                    updated_at: created_at,
                },
            )
    }

    /// Generate a Tag owned by `user_id`.
    pub fn arb_tag(user_id: UserId) -> impl Strategy<Value = Tag> {
        (arb_uuid(), arb_name(30), arb_tag_color(), arb_timestamp()).prop_map(
            move |(id, name, color, created_at)| Tag {
                id,
                user_id,
                name,
                color,
                is_demo: false,
                created_at,
            },
        )
    }

    /// Generate a Task attached to `entity_id`.
    pub fn arb_task(user_id: UserId, entity_id: EntityId) -> impl Strategy<Value = Task> {
        (
            arb_uuid(),
            arb_name(200),
            arb_task_priority(),
            any::<bool>(),
            arb_timestamp(),
        )
            .prop_map(move |(id, title, priority, is_completed, created_at)| Task {
                id,
                user_id,
                entity_type: EntityType::Contact,
                entity_id,
                title,
                description: None,
                due_date: Some(created_at.date_naive()),
                priority,
                is_completed,
                completed_at: is_completed.then_some(created_at),
                created_at,
                updated_at: created_at,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common testing scenarios.

    use super::*;

    /// A fresh user id.
    pub fn test_user() -> UserId {
        Uuid::now_v7()
    }

    /// A contact form that passes validation.
    pub fn contact_form() -> ContactForm {
        ContactForm {
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
            gender: Some(Gender::Female),
            ..Default::default()
        }
    }

    pub fn contact(user_id: UserId, first_name: &str, surname: &str) -> Contact {
        let ts = now();
        Contact {
            id: new_entity_id(),
            user_id,
            first_name: first_name.to_string(),
            surname: surname.to_string(),
            email: format!(
                "{}.{}@example.com",
                first_name.to_lowercase(),
                surname.to_lowercase()
            ),
            phone: None,
            gender: Gender::Female,
            birthday: None,
            address: None,
            avatar_url: None,
            is_favourite: false,
            is_demo: false,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn company(user_id: UserId, name: &str) -> Company {
        let ts = now();
        Company {
            id: new_entity_id(),
            user_id,
            name: name.to_string(),
            industry: Some("Software".to_string()),
            website: None,
            description: None,
            logo_url: None,
            is_demo: false,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn group(user_id: UserId, name: &str) -> Group {
        Group {
            id: new_entity_id(),
            user_id,
            name: name.to_string(),
            description: None,
            is_demo: false,
            created_at: now(),
        }
    }

    pub fn tag(user_id: UserId, name: &str, color: &str) -> Tag {
        Tag {
            id: new_entity_id(),
            user_id,
            name: name.to_string(),
            color: color.to_string(),
            is_demo: false,
            created_at: now(),
        }
    }

    pub fn note(user_id: UserId, contact_id: EntityId, content: &str) -> Note {
        let ts = now();
        Note {
            id: new_entity_id(),
            user_id,
            entity_type: EntityType::Contact,
            entity_id: contact_id,
            content: content.to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    /// An open task on a contact, due on `due_date`.
    pub fn task(
        user_id: UserId,
        contact_id: EntityId,
        title: &str,
        due_date: Option<chrono::NaiveDate>,
    ) -> Task {
        let ts = now();
        Task {
            id: new_entity_id(),
            user_id,
            entity_type: EntityType::Contact,
            entity_id: contact_id,
            title: title.to_string(),
            description: None,
            due_date,
            priority: TaskPriority::Medium,
            is_completed: false,
            completed_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn contact_tag(user_id: UserId, contact_id: EntityId, tag_id: EntityId) -> ContactTag {
        ContactTag {
            id: new_entity_id(),
            user_id,
            contact_id,
            tag_id,
            is_demo: false,
            created_at: now(),
        }
    }

    pub fn contact_group(user_id: UserId, contact_id: EntityId, group_id: EntityId) -> ContactGroup {
        ContactGroup {
            id: new_entity_id(),
            user_id,
            contact_id,
            group_id,
            is_demo: false,
            created_at: now(),
        }
    }

    pub fn contact_company(
        user_id: UserId,
        contact_id: EntityId,
        company_id: EntityId,
    ) -> ContactCompany {
        ContactCompany {
            id: new_entity_id(),
            user_id,
            contact_id,
            company_id,
            is_demo: false,
            created_at: now(),
        }
    }

    /// A tiny valid PNG (1x1, transparent).
    pub fn png_bytes() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Rolodex results.

    use super::*;

    /// Assert that validation failed and `field` is among the failing fields.
    #[track_caller]
    pub fn assert_field_error<T: std::fmt::Debug>(result: &Result<T, ValidationError>, field: &str) {
        match result {
            Err(err) => {
                let fields: Vec<String> = err.field_errors().into_iter().map(|f| f.field).collect();
                assert!(
                    fields.iter().any(|f| f == field),
                    "Expected a failure on {}, got {:?}",
                    field,
                    fields
                );
            }
            Ok(value) => panic!("Expected validation to fail on {}, got Ok({:?})", field, value),
        }
    }

    /// Assert that validation failed with exactly these fields, in order.
    #[track_caller]
    pub fn assert_failed_fields<T: std::fmt::Debug>(
        result: &Result<T, ValidationError>,
        expected: &[&str],
    ) {
        match result {
            Err(err) => {
                let fields: Vec<String> = err.field_errors().into_iter().map(|f| f.field).collect();
                assert_eq!(fields, expected, "Unexpected failing fields");
            }
            Ok(value) => panic!("Expected validation to fail, got Ok({:?})", value),
        }
    }

    /// Assert that a Rolodex result is a validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &RolodexResult<T>) {
        match result {
            Err(RolodexError::Validation(_)) => {}
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    /// Assert that a storage result is NotFound on `table`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &StorageResult<T>, table: Table) {
        match result {
            Err(StorageError::NotFound { table: t, .. }) => {
                assert_eq!(*t, table, "NotFound on the wrong table");
            }
            other => panic!("Expected NotFound on {}, got {:?}", table, other),
        }
    }

    /// Assert that every row in `records` belongs to `user_id`.
    #[track_caller]
    pub fn assert_owned_by<'a, I>(user_ids: I, user_id: UserId)
    where
        I: IntoIterator<Item = &'a UserId>,
    {
        for owner in user_ids {
            assert_eq!(*owner, user_id, "Found a row owned by another user");
        }
    }

    /// Assert that no contact holds more tags than allowed.
    #[track_caller]
    pub fn assert_tag_cap(links: &[ContactTag]) {
        let mut counts = std::collections::HashMap::new();
        for link in links {
            *counts.entry(link.contact_id).or_insert(0usize) += 1;
        }
        for (contact_id, count) in counts {
            assert!(
                count <= MAX_TAGS_PER_CONTACT,
                "Contact {} holds {} tags",
                contact_id,
                count
            );
        }
    }
}

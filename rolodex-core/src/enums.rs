//! Enum types for Rolodex entities
//!
//! Every enum here is stored as a plain string column by the BaaS, so each
//! one carries its wire literal and round-trips through `Display`/`FromStr`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Declare a string-backed enum with its wire literals.
macro_rules! db_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $lit:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $lit)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire/database string representation.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $lit),+
                }
            }

            /// Parse from database string representation.
            pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
                match s {
                    $($lit => Ok($name::$variant),)+
                    _ => Err(EnumParseError { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

db_string_enum! {
    /// Gender of a contact. The add-contact form only offers these two.
    Gender: "gender" {
        Male => "male",
        Female => "female",
    }
}

db_string_enum! {
    /// Priority of a task.
    TaskPriority: "task priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

db_string_enum! {
    /// Entity type discriminator for polymorphic references
    /// (notes, tasks and activity rows point at one of these).
    EntityType: "entity type" {
        Contact => "contact",
        Company => "company",
        Group => "group",
        Tag => "tag",
        Note => "note",
        Task => "task",
        ProfessionalInfo => "professional_info",
        User => "user",
        DemoData => "demo_data",
    }
}

impl EntityType {
    /// Whether notes and tasks may be attached to this entity type.
    pub fn accepts_attachments(&self) -> bool {
        matches!(
            self,
            EntityType::Contact | EntityType::Company | EntityType::Group | EntityType::Tag
        )
    }
}

db_string_enum! {
    /// BaaS table names.
    Table: "table" {
        Contacts => "contacts",
        Companies => "companies",
        Groups => "groups",
        Tags => "tags",
        Notes => "notes",
        Tasks => "tasks",
        ProfessionalInfo => "professional_info",
        ContactGroups => "contact_groups",
        ContactTags => "contact_tags",
        ContactCompanies => "contact_companies",
        ActivityLogs => "activity_logs",
    }
}

db_string_enum! {
    /// Entity kinds that contacts can be assigned to through a join table.
    AssignableKind: "assignable kind" {
        Group => "group",
        Tag => "tag",
        Company => "company",
    }
}

impl AssignableKind {
    /// Table holding the entity rows.
    pub fn entity_table(&self) -> Table {
        match self {
            AssignableKind::Group => Table::Groups,
            AssignableKind::Tag => Table::Tags,
            AssignableKind::Company => Table::Companies,
        }
    }

    /// Join table linking contacts to this kind.
    pub fn join_table(&self) -> Table {
        match self {
            AssignableKind::Group => Table::ContactGroups,
            AssignableKind::Tag => Table::ContactTags,
            AssignableKind::Company => Table::ContactCompanies,
        }
    }

    /// Foreign-key column in the join table.
    pub fn join_column(&self) -> &'static str {
        match self {
            AssignableKind::Group => "group_id",
            AssignableKind::Tag => "tag_id",
            AssignableKind::Company => "company_id",
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            AssignableKind::Group => EntityType::Group,
            AssignableKind::Tag => EntityType::Tag,
            AssignableKind::Company => EntityType::Company,
        }
    }

    /// Activity recorded when a contact is assigned.
    pub fn assigned_action(&self) -> ActivityAction {
        match self {
            AssignableKind::Group => ActivityAction::GroupContactAssigned,
            AssignableKind::Tag => ActivityAction::TagContactAssigned,
            AssignableKind::Company => ActivityAction::CompanyContactAssigned,
        }
    }

    /// Activity recorded when a contact is removed.
    pub fn removed_action(&self) -> ActivityAction {
        match self {
            AssignableKind::Group => ActivityAction::GroupContactRemoved,
            AssignableKind::Tag => ActivityAction::TagContactRemoved,
            AssignableKind::Company => ActivityAction::CompanyContactRemoved,
        }
    }
}

db_string_enum! {
    /// Discrete actions recorded in the activity log.
    ActivityAction: "activity action" {
        ContactCreated => "contact_created",
        ContactUpdated => "contact_updated",
        ContactDeleted => "contact_deleted",
        ContactFavourited => "contact_favourited",
        ContactUnfavourited => "contact_unfavourited",
        ContactAvatarUploaded => "contact_avatar_uploaded",
        CompanyCreated => "company_created",
        CompanyUpdated => "company_updated",
        CompanyDeleted => "company_deleted",
        CompanyLogoUploaded => "company_logo_uploaded",
        CompanyContactAssigned => "company_contact_assigned",
        CompanyContactRemoved => "company_contact_removed",
        GroupCreated => "group_created",
        GroupUpdated => "group_updated",
        GroupDeleted => "group_deleted",
        GroupContactAssigned => "group_contact_assigned",
        GroupContactRemoved => "group_contact_removed",
        TagCreated => "tag_created",
        TagUpdated => "tag_updated",
        TagDeleted => "tag_deleted",
        TagContactAssigned => "tag_contact_assigned",
        TagContactRemoved => "tag_contact_removed",
        NoteCreated => "note_created",
        NoteUpdated => "note_updated",
        NoteDeleted => "note_deleted",
        TaskCreated => "task_created",
        TaskUpdated => "task_updated",
        TaskDeleted => "task_deleted",
        TaskCompleted => "task_completed",
        TaskReopened => "task_reopened",
        ProfessionalInfoCreated => "professional_info_created",
        ProfessionalInfoUpdated => "professional_info_updated",
        ProfessionalInfoDeleted => "professional_info_deleted",
        DemoDataSeeded => "demo_data_seeded",
        DemoDataCleared => "demo_data_cleared",
        UserSignedIn => "user_signed_in",
        UserSignedOut => "user_signed_out",
    }
}

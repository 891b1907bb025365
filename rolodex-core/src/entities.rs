//! Core entity structures
//!
//! Field names match the BaaS column names, so these types serialize
//! directly into insert payloads and deserialize from selected rows.

use crate::{
    ActivityAction, EntityId, EntityType, Gender, Table, TaskPriority, Timestamp, UserId,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A row type stored in one BaaS table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table this record lives in.
    const TABLE: Table;

    /// Primary key.
    fn id(&self) -> EntityId;
}

macro_rules! impl_record {
    ($type:ty, $table:expr) => {
        impl Record for $type {
            const TABLE: Table = $table;

            fn id(&self) -> EntityId {
                self.id
            }
        }
    };
}

/// Contact - a person in the address book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Contact {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_favourite: bool,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Contact {
    /// "First Surname", as shown on cards and in the activity feed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Company a contact may work for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Company {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Named group of contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Group {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Coloured label attached to contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Tag {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub name: String,
    /// `#rrggbb`
    pub color: String,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Free-text note attached to a contact, company, group or tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Note {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub entity_type: EntityType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// To-do item attached to a contact, company, group or tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Task {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub entity_type: EntityType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub is_completed: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub completed_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Task {
    /// Open and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Work details for a contact. At most one row per contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfessionalInfo {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub contact_id: EntityId,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub work_email: Option<String>,
    pub work_phone: Option<String>,
    pub linkedin_url: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Join row: contact ↔ group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactGroup {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub contact_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub group_id: EntityId,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Join row: contact ↔ tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactTag {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub contact_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub tag_id: EntityId,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Join row: contact ↔ company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactCompany {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub contact_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub company_id: EntityId,
    #[serde(default)]
    pub is_demo: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// One discrete action in the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityLog {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub entity_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    #[serde(default)]
    pub details: serde_json::Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl_record!(Contact, Table::Contacts);
impl_record!(Company, Table::Companies);
impl_record!(Group, Table::Groups);
impl_record!(Tag, Table::Tags);
impl_record!(Note, Table::Notes);
impl_record!(Task, Table::Tasks);
impl_record!(ProfessionalInfo, Table::ProfessionalInfo);
impl_record!(ContactGroup, Table::ContactGroups);
impl_record!(ContactTag, Table::ContactTags);
impl_record!(ContactCompany, Table::ContactCompanies);
impl_record!(ActivityLog, Table::ActivityLogs);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_entity_id, now};
    use uuid::Uuid;

    fn make_task(due: Option<NaiveDate>, completed: bool) -> Task {
        Task {
            id: new_entity_id(),
            user_id: Uuid::nil(),
            entity_type: EntityType::Contact,
            entity_id: new_entity_id(),
            title: "Call back".to_string(),
            description: None,
            due_date: due,
            priority: TaskPriority::High,
            is_completed: completed,
            completed_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_task_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();

        assert!(make_task(Some(yesterday), false).is_overdue(today));
        assert!(!make_task(Some(today), false).is_overdue(today));
        assert!(!make_task(Some(yesterday), true).is_overdue(today));
        assert!(!make_task(None, false).is_overdue(today));
    }

    #[test]
    fn test_contact_row_uses_column_names() -> Result<(), serde_json::Error> {
        let contact = Contact {
            id: new_entity_id(),
            user_id: Uuid::nil(),
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            gender: Gender::Female,
            birthday: NaiveDate::from_ymd_opt(1815, 12, 10),
            address: None,
            avatar_url: None,
            is_favourite: false,
            is_demo: false,
            created_at: now(),
            updated_at: now(),
        };

        let row = serde_json::to_value(&contact)?;
        assert_eq!(row["first_name"], "Ada");
        assert_eq!(row["gender"], "female");
        assert_eq!(row["birthday"], "1815-12-10");
        assert_eq!(contact.full_name(), "Ada Lovelace");
        assert_eq!(contact.id(), contact.id);
        assert_eq!(Contact::TABLE, Table::Contacts);
        Ok(())
    }

    #[test]
    fn test_join_rows_default_is_demo() -> Result<(), serde_json::Error> {
        let id = new_entity_id();
        let json = serde_json::json!({
            "id": id,
            "user_id": Uuid::nil(),
            "contact_id": new_entity_id(),
            "tag_id": new_entity_id(),
            "created_at": "2024-01-01T00:00:00Z",
        });
        let row: ContactTag = serde_json::from_value(json)?;
        assert!(!row.is_demo);
        assert_eq!(row.id(), id);
        Ok(())
    }
}

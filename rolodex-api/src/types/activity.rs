//! Activity feed and dashboard API types

use rolodex_core::{ActivityLog, Contact, EntityId, EntityType, Task};
use serde::{Deserialize, Serialize};

/// Default and maximum page size of the activity feed.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const MAX_ACTIVITY_LIMIT: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListActivityRequest {
    pub entity_type: Option<EntityType>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub entity_id: Option<EntityId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListActivityResponse {
    /// Newest first
    pub entries: Vec<ActivityLog>,
}

/// How many contacts carry a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagUsage {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub tag_id: EntityId,
    pub name: String,
    pub color: String,
    pub contact_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardSummary {
    pub contact_count: u64,
    pub company_count: u64,
    pub group_count: u64,
    pub tag_count: u64,
    pub favourite_count: u64,
    pub open_task_count: u64,
    pub overdue_task_count: u64,
    pub recent_contacts: Vec<Contact>,
    pub upcoming_tasks: Vec<Task>,
    pub recent_activity: Vec<ActivityLog>,
    /// Most used first
    pub tag_usage: Vec<TagUsage>,
}

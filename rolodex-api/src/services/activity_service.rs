//! Activity Service
//!
//! Writes the audit trail shown in the activity feed and on the dashboard.

use rolodex_core::{new_entity_id, now, ActivityAction, ActivityLog, EntityId, EntityType, Table};
use rolodex_storage::{Backend, BackendExt, Filter, Query};
use serde_json::Value;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::types::{ListActivityRequest, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};

/// Appends one activity row after a primary mutation.
///
/// Logging never fails the caller: a failed insert is reported through
/// `tracing` and dropped. There is no retry and no deduplication.
pub struct ActivityLogger<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ActivityLogger<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    pub async fn log(
        &self,
        auth: &AuthContext,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: Option<EntityId>,
        details: Value,
    ) {
        let entry = ActivityLog {
            id: new_entity_id(),
            user_id: auth.user_id,
            action,
            entity_type,
            entity_id,
            details,
            created_at: now(),
        };

        match self.backend.insert_record(&entry).await {
            Ok(_) => tracing::debug!(%action, ?entity_id, "Activity logged"),
            Err(e) => tracing::warn!(
                error = %e,
                %action,
                ?entity_id,
                "Failed to write activity log"
            ),
        }
    }
}

/// The caller's activity feed, newest first.
pub async fn list_activity(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListActivityRequest,
) -> ApiResult<Vec<ActivityLog>> {
    let mut filter = Filter::owned_by(auth.user_id);
    if let Some(entity_type) = params.entity_type {
        filter = filter.eq("entity_type", entity_type);
    }
    if let Some(entity_id) = params.entity_id {
        filter = filter.eq("entity_id", entity_id);
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);

    let query = Query::table(Table::ActivityLogs)
        .filter(filter)
        .order_by("created_at", false)
        .limit(limit);

    Ok(backend.fetch_query::<ActivityLog>(&query).await?)
}

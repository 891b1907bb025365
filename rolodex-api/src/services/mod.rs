//! Service Layer
//!
//! Data access and business rules per entity. Every function takes the
//! backend handle scoped to the caller plus the caller's [`AuthContext`],
//! and every read and write is filtered by the caller's user id.
//!
//! Multi-step writes are sequential calls without a transaction. When a
//! follow-up step fails after the primary write succeeded, the failure is
//! logged and returned as a warning instead of an error.

mod activity_service;
mod assignment_service;
mod contact_service;
mod dashboard_service;
mod directory_service;
mod favourite_service;
mod note_service;
mod professional_info_service;
mod seed_service;
mod task_service;
mod upload_service;

pub use activity_service::*;
pub use assignment_service::*;
pub use contact_service::*;
pub use dashboard_service::*;
pub use directory_service::*;
pub use favourite_service::*;
pub use note_service::*;
pub use professional_info_service::*;
pub use seed_service::*;
pub use task_service::*;
pub use upload_service::*;

use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use rolodex_core::{EntityId, Record};
use rolodex_storage::{Backend, BackendExt, Filter, Row};
use std::collections::HashMap;
use std::fmt;

/// Filter selecting one row of the caller by id.
pub(crate) fn owned_id(auth: &AuthContext, id: EntityId) -> Filter {
    Filter::owned_by(auth.user_id).eq("id", id)
}

/// Fetch one record of the caller or fail with 404.
pub(crate) async fn fetch_owned<T: Record>(
    backend: &dyn Backend,
    auth: &AuthContext,
    id: EntityId,
    entity_type: &str,
) -> ApiResult<T> {
    backend
        .fetch_one::<T>(owned_id(auth, id))
        .await?
        .ok_or_else(|| ApiError::entity_not_found(entity_type, id))
}

/// Log a failed follow-up step and keep it for the response.
pub(crate) fn push_warning(warnings: &mut Vec<String>, context: &str, err: impl fmt::Display) {
    tracing::warn!(error = %err, "{}", context);
    warnings.push(format!("{}: {}", context, err));
}

/// Read a uuid column from a raw row.
pub(crate) fn row_uuid(row: &Row, column: &str) -> Option<EntityId> {
    row.get(column)
        .and_then(|v| v.as_str())
        .and_then(|s| uuid::Uuid::parse_str(s).ok())
}

/// Tally raw rows by the uuid in `column`.
pub(crate) fn tally_by(rows: &[Row], column: &str) -> HashMap<EntityId, u64> {
    let mut counts = HashMap::new();
    for id in rows.iter().filter_map(|row| row_uuid(row, column)) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Trim a required text value.
pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn test_tally_by_counts_and_skips_garbage() {
        let a = uuid::Uuid::now_v7();
        let b = uuid::Uuid::now_v7();
        let rows = vec![
            row(json!({ "tag_id": a })),
            row(json!({ "tag_id": a })),
            row(json!({ "tag_id": b })),
            row(json!({ "tag_id": "not-a-uuid" })),
            row(json!({ "other": a })),
        ];
        let counts = tally_by(&rows, "tag_id");
        assert_eq!(counts.get(&a), Some(&2));
        assert_eq!(counts.get(&b), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_push_warning_keeps_context() {
        let mut warnings = Vec::new();
        push_warning(&mut warnings, "Failed to assign tags", "boom");
        assert_eq!(warnings, vec!["Failed to assign tags: boom".to_string()]);
    }
}

//! Assignment Service
//!
//! Links contacts to companies, groups and tags through the join tables.
//!
//! The company check-then-insert is not atomic: two concurrent requests
//! for the same contact can both pass the check. There is no lock and no
//! database constraint behind it.

use rolodex_core::{new_entity_id, now, AssignableKind, Contact, EntityId, Table};
use rolodex_storage::{Backend, BackendExt, Filter, Query};
use serde::Serialize;
use serde_json::json;

use super::{owned_id, row_uuid, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::types::EntityContactsResponse;

/// Result of an assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignOutcome {
    /// A join row was inserted.
    Assigned { assignment_id: EntityId },
    /// Nothing was written.
    AlreadyAssigned,
}

impl AssignOutcome {
    /// Error answered for an `AlreadyAssigned` outcome.
    pub fn conflict(kind: AssignableKind) -> ApiError {
        match kind {
            AssignableKind::Company => {
                ApiError::already_assigned("Contact is already assigned to a company")
            }
            AssignableKind::Group => {
                ApiError::already_assigned("Contact is already assigned to this group")
            }
            AssignableKind::Tag => ApiError::already_assigned("Contact already has this tag"),
        }
    }
}

async fn ensure_exists(
    backend: &dyn Backend,
    auth: &AuthContext,
    table: Table,
    entity_type: &str,
    id: EntityId,
) -> ApiResult<()> {
    if backend.count(table, &owned_id(auth, id)).await? == 0 {
        return Err(ApiError::entity_not_found(entity_type, id));
    }
    Ok(())
}

/// Contacts assigned to an entity, and all of the caller's other contacts.
pub async fn fetch_entity_data(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
) -> ApiResult<EntityContactsResponse> {
    ensure_exists(backend, auth, kind.entity_table(), kind.as_db_str(), entity_id).await?;

    let links = backend
        .select(
            &Query::table(kind.join_table())
                .filter(Filter::owned_by(auth.user_id).eq(kind.join_column(), entity_id)),
        )
        .await?;
    let assigned_ids: Vec<EntityId> = links
        .iter()
        .filter_map(|row| row_uuid(row, "contact_id"))
        .collect();

    let by_name = |filter: Filter| {
        Query::table(Table::Contacts)
            .filter(filter)
            .order_by("first_name", true)
            .order_by("surname", true)
    };

    let assigned_contacts = if assigned_ids.is_empty() {
        Vec::new()
    } else {
        backend
            .fetch_query::<Contact>(&by_name(
                Filter::owned_by(auth.user_id).is_in("id", assigned_ids.iter().copied()),
            ))
            .await?
    };

    let mut available = Filter::owned_by(auth.user_id);
    if !assigned_ids.is_empty() {
        available = available.not_in("id", assigned_ids.iter().copied());
    }
    let available_contacts = backend.fetch_query::<Contact>(&by_name(available)).await?;

    Ok(EntityContactsResponse {
        assigned_contacts,
        available_contacts,
    })
}

/// Link a contact to a company, group or tag.
///
/// A contact holds at most one company: if any company link exists the
/// outcome is `AlreadyAssigned` and nothing is inserted. For groups and
/// tags only an identical existing link counts.
pub async fn assign_contact(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
    contact_id: EntityId,
) -> ApiResult<AssignOutcome> {
    ensure_exists(backend, auth, kind.entity_table(), kind.as_db_str(), entity_id).await?;
    ensure_exists(backend, auth, Table::Contacts, "contact", contact_id).await?;

    let mut existing = Filter::owned_by(auth.user_id).eq("contact_id", contact_id);
    if kind != AssignableKind::Company {
        existing = existing.eq(kind.join_column(), entity_id);
    }
    if backend.count(kind.join_table(), &existing).await? > 0 {
        tracing::debug!(%kind, %entity_id, %contact_id, "Contact already assigned");
        return Ok(AssignOutcome::AlreadyAssigned);
    }

    let assignment_id = new_entity_id();
    let row = rolodex_storage::to_row(
        kind.join_table(),
        &json!({
            "id": assignment_id,
            "user_id": auth.user_id,
            "contact_id": contact_id,
            kind.join_column(): entity_id,
            "is_demo": false,
            "created_at": now(),
        }),
    )?;
    backend.insert(kind.join_table(), vec![row]).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            kind.assigned_action(),
            kind.entity_type(),
            Some(entity_id),
            json!({ "contact_id": contact_id }),
        )
        .await;

    Ok(AssignOutcome::Assigned { assignment_id })
}

/// Unlink a contact. Returns the number of join rows removed.
pub async fn remove_contact(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
    contact_id: EntityId,
) -> ApiResult<u64> {
    let removed = backend
        .delete(
            kind.join_table(),
            &Filter::owned_by(auth.user_id)
                .eq("contact_id", contact_id)
                .eq(kind.join_column(), entity_id),
        )
        .await?;

    if removed > 0 {
        ActivityLogger::new(backend)
            .log(
                auth,
                kind.removed_action(),
                kind.entity_type(),
                Some(entity_id),
                json!({ "contact_id": contact_id }),
            )
            .await;
    }
    Ok(removed)
}

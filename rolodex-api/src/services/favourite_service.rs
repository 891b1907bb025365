//! Favourite Service
//!
//! Flipping a contact's favourite flag, plus the process-local view the
//! server keeps of those flags so rapid repeated toggles stay consistent.

use dashmap::{DashMap, DashSet};
use rolodex_core::{now, ActivityAction, Contact, EntityId, EntityType, Record, UserId};
use rolodex_storage::{Backend, BackendExt};
use serde_json::json;

use super::{fetch_owned, owned_id, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};

/// Write `!current_status` to the contact and return the new value.
pub async fn toggle_contact_favourite(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    current_status: bool,
) -> ApiResult<bool> {
    let is_favourite = !current_status;
    let patch = rolodex_storage::to_row(
        Contact::TABLE,
        &json!({ "is_favourite": is_favourite, "updated_at": now() }),
    )?;
    let updated = backend
        .update(Contact::TABLE, &owned_id(auth, contact_id), patch)
        .await?;
    if updated.is_empty() {
        return Err(ApiError::entity_not_found("contact", contact_id));
    }

    let action = if is_favourite {
        ActivityAction::ContactFavourited
    } else {
        ActivityAction::ContactUnfavourited
    };
    ActivityLogger::new(backend)
        .log(auth, action, EntityType::Contact, Some(contact_id), json!({}))
        .await;

    Ok(is_favourite)
}

/// Optimistic favourite flags with a per-contact in-flight guard.
///
/// Entries are keyed by owner and contact, so one user's requests never
/// touch another user's view. A toggle flips the local value before the
/// backend call and puts back exactly the previous entry if the call fails.
/// A second toggle of the same contact while one is in flight is refused
/// with 409.
#[derive(Debug, Default)]
pub struct FavouriteTracker {
    flags: DashMap<FlagKey, bool>,
    in_flight: DashSet<FlagKey>,
}

type FlagKey = (UserId, EntityId);

/// Releases the in-flight slot on every exit path.
struct InFlight<'a> {
    set: &'a DashSet<FlagKey>,
    key: FlagKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

impl FavouriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locally known flag for one of the user's contacts.
    pub fn current(&self, user_id: UserId, contact_id: EntityId) -> Option<bool> {
        self.flags.get(&(user_id, contact_id)).map(|v| *v)
    }

    pub fn is_in_flight(&self, user_id: UserId, contact_id: EntityId) -> bool {
        self.in_flight.contains(&(user_id, contact_id))
    }

    /// Record a flag read from the backend.
    pub fn observe(&self, user_id: UserId, contact_id: EntityId, is_favourite: bool) {
        self.flags.insert((user_id, contact_id), is_favourite);
    }

    /// Drop the entry of a deleted contact.
    pub fn forget(&self, user_id: UserId, contact_id: EntityId) {
        self.flags.remove(&(user_id, contact_id));
    }

    /// Flip a contact's favourite flag.
    ///
    /// The starting value is `known` when the client sends it, otherwise the
    /// local view, otherwise the stored row.
    pub async fn toggle(
        &self,
        backend: &dyn Backend,
        auth: &AuthContext,
        contact_id: EntityId,
        known: Option<bool>,
    ) -> ApiResult<bool> {
        let key = (auth.user_id, contact_id);
        if !self.in_flight.insert(key) {
            return Err(ApiError::state_conflict(
                "A favourite change for this contact is already in progress",
            ));
        }
        let _guard = InFlight {
            set: &self.in_flight,
            key,
        };

        let previous = self.current(auth.user_id, contact_id);
        let current = match known.or(previous) {
            Some(current) => current,
            None => {
                let contact: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;
                contact.is_favourite
            }
        };

        self.flags.insert(key, !current);
        match toggle_contact_favourite(backend, auth, contact_id, current).await {
            Ok(is_favourite) => {
                self.flags.insert(key, is_favourite);
                Ok(is_favourite)
            }
            Err(e) => {
                tracing::warn!(error = %e, %contact_id, "Favourite toggle failed, reverting");
                match previous {
                    Some(value) => self.flags.insert(key, value),
                    None => self.flags.remove(&key).map(|(_, value)| value),
                };
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use rolodex_core::{StorageResult, Table};
    use rolodex_storage::{Filter, MockBackend, Query, Row};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn auth_for(user_id: UserId) -> AuthContext {
        AuthContext::new(
            &AuthUser {
                id: user_id,
                email: None,
            },
            "token",
        )
    }

    async fn seed_contact(backend: &MockBackend, user_id: UserId) -> EntityId {
        let contact = rolodex_test_utils::fixtures::contact(user_id, "Ada", "Lovelace");
        let id = contact.id;
        backend
            .insert_record(&contact)
            .await
            .expect("fixture contact inserts");
        id
    }

    /// Holds every contact update until released.
    struct GatedBackend {
        inner: MockBackend,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Backend for GatedBackend {
        async fn select(&self, query: &Query) -> StorageResult<Vec<Row>> {
            self.inner.select(query).await
        }

        async fn insert(&self, table: Table, rows: Vec<Row>) -> StorageResult<Vec<Row>> {
            self.inner.insert(table, rows).await
        }

        async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StorageResult<Vec<Row>> {
            if table == Table::Contacts {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.update(table, filter, patch).await
        }

        async fn delete(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
            self.inner.delete(table, filter).await
        }

        async fn count(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
            self.inner.count(table, filter).await
        }

        async fn health_check(&self) -> StorageResult<bool> {
            self.inner.health_check().await
        }

        fn with_access_token(&self, access_token: &str) -> Arc<dyn Backend> {
            self.inner.with_access_token(access_token)
        }
    }

    #[test]
    fn test_guard_releases_slot() {
        let tracker = FavouriteTracker::new();
        let key = (uuid::Uuid::now_v7(), uuid::Uuid::now_v7());
        {
            assert!(tracker.in_flight.insert(key));
            let _guard = InFlight {
                set: &tracker.in_flight,
                key,
            };
            assert!(tracker.is_in_flight(key.0, key.1));
        }
        assert!(!tracker.is_in_flight(key.0, key.1));
    }

    #[test]
    fn test_observe_is_per_user() {
        let tracker = FavouriteTracker::new();
        let (alice, bob, id) = (uuid::Uuid::now_v7(), uuid::Uuid::now_v7(), uuid::Uuid::now_v7());
        tracker.observe(alice, id, true);
        assert_eq!(tracker.current(alice, id), Some(true));
        assert_eq!(tracker.current(bob, id), None);
        tracker.forget(alice, id);
        assert_eq!(tracker.current(alice, id), None);
    }

    #[tokio::test]
    async fn test_foreign_toggle_leaves_owner_view_untouched() {
        let backend = MockBackend::new();
        let owner = uuid::Uuid::now_v7();
        let id = seed_contact(&backend, owner).await;
        let tracker = FavouriteTracker::new();
        tracker.observe(owner, id, false);

        let stranger = auth_for(uuid::Uuid::now_v7());
        let err = tracker
            .toggle(&backend, &stranger, id, Some(true))
            .await
            .expect_err("stranger cannot toggle");
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(tracker.current(stranger.user_id, id), None);
        assert_eq!(tracker.current(owner, id), Some(false));

        let flipped = tracker
            .toggle(&backend, &auth_for(owner), id, None)
            .await
            .expect("owner toggles");
        assert!(flipped);
        assert!(backend.records::<Contact>()[0].is_favourite);
    }

    #[tokio::test]
    async fn test_failed_toggle_restores_previous_entry() {
        let backend = MockBackend::new();
        let owner = uuid::Uuid::now_v7();
        let id = seed_contact(&backend, owner).await;
        let tracker = FavouriteTracker::new();
        tracker.observe(owner, id, true);

        backend.fail_next(Table::Contacts, rolodex_storage::Operation::Update);
        let result = tracker.toggle(&backend, &auth_for(owner), id, Some(false)).await;
        assert!(result.is_err());
        assert_eq!(tracker.current(owner, id), Some(true));
        assert!(!tracker.is_in_flight(owner, id));
    }

    #[tokio::test]
    async fn test_overlapping_toggle_is_refused() {
        let backend = GatedBackend {
            inner: MockBackend::new(),
            entered: Notify::new(),
            release: Notify::new(),
        };
        let owner = uuid::Uuid::now_v7();
        let id = seed_contact(&backend.inner, owner).await;
        let tracker = FavouriteTracker::new();
        let auth = auth_for(owner);

        let first = tracker.toggle(&backend, &auth, id, None);
        let second = async {
            backend.entered.notified().await;
            let result = tracker.toggle(&backend, &auth, id, None).await;
            backend.release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.expect("first toggle lands"));
        let err = second.expect_err("second toggle is refused");
        assert_eq!(err.code, ErrorCode::StateConflict);
        assert!(backend.inner.records::<Contact>()[0].is_favourite);
        assert!(!tracker.is_in_flight(owner, id));
    }
}

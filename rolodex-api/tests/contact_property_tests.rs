//! Property-based tests for contact writes over HTTP.
//!
//! - Every valid add-contact form is stored once, owned by the caller.
//! - A form carrying more tags than allowed never reaches the backend.
//! - Toggling a favourite n times leaves it set exactly when n is odd.

use axum::http::StatusCode;
use proptest::prelude::*;
use rolodex_test_utils::{
    generators::{arb_contact_form, arb_uuid},
    Contact, MAX_TAGS_PER_CONTACT,
};
use serde_json::json;
use tokio::runtime::Runtime;

#[path = "support/app.rs"]
mod app_support;
use app_support::TestApp;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_valid_contact_form_is_stored_for_caller(form in arb_contact_form()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let app = TestApp::new();
            let user = app.sign_in("prop@example.com");
            let body = serde_json::to_value(&form)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let response = app.post(&user, "/api/v1/contacts", body).await;
            prop_assert_eq!(response.status, StatusCode::CREATED);

            let stored = app.backend.records::<Contact>();
            prop_assert_eq!(stored.len(), 1);
            prop_assert_eq!(stored[0].user_id, user.id);
            prop_assert_eq!(stored[0].first_name.as_str(), form.first_name.trim());
            prop_assert_eq!(stored[0].email.as_str(), form.email.trim());
            prop_assert!(!stored[0].is_favourite);
            Ok(())
        })?;
    }

    #[test]
    fn prop_too_many_tags_never_reach_backend(
        form in arb_contact_form(),
        tag_ids in prop::collection::hash_set(arb_uuid(), (MAX_TAGS_PER_CONTACT + 1)..8),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let app = TestApp::new();
            let user = app.sign_in("prop@example.com");
            let mut body = serde_json::to_value(&form)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            body["tag_ids"] = json!(tag_ids);

            let response = app.post(&user, "/api/v1/contacts", body).await;
            prop_assert_eq!(response.status, StatusCode::BAD_REQUEST);
            prop_assert_eq!(app.backend.call_count(), 0);
            Ok(())
        })?;
    }

    #[test]
    fn prop_favourite_parity(toggles in 1usize..6) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let app = TestApp::new();
            let user = app.sign_in("prop@example.com");
            let id = app.create_contact(&user, "Ada", "Lovelace").await;
            let uri = format!("/api/v1/contacts/{}/favourite", id);

            for _ in 0..toggles {
                let response = app.post(&user, &uri, json!({})).await;
                prop_assert_eq!(response.status, StatusCode::OK);
            }

            let expected = toggles % 2 == 1;
            prop_assert_eq!(app.backend.records::<Contact>()[0].is_favourite, expected);
            prop_assert_eq!(app.state.favourites.current(user.id, id), Some(expected));
            Ok(())
        })?;
    }
}

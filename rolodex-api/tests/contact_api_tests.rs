//! HTTP tests for the contact endpoints.

use axum::http::StatusCode;
use rolodex_storage::Operation;
use rolodex_test_utils::{
    fixtures::png_bytes, Contact, ContactCompany, ContactGroup, ContactTag, ProfessionalInfo,
    Table,
};
use serde_json::json;

#[path = "support/app.rs"]
mod app_support;
use app_support::{failed_fields, id_at, TestApp};

#[tokio::test]
async fn test_create_contact_links_tags_group_and_company() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let tag = app
        .create_entity(&user, "tags", json!({ "name": "vip", "color": "#ff8800" }))
        .await;
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    let company = app.create_entity(&user, "companies", json!({ "name": "Acme" })).await;

    let response = app
        .post(
            &user,
            "/api/v1/contacts",
            json!({
                "first_name": "  Grace ",
                "surname": "Hopper",
                "email": "grace@navy.example",
                "gender": "female",
                "tag_ids": [tag],
                "group_id": group,
                "company_id": company,
                "professional": { "job_title": "Rear Admiral" }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["contact"]["first_name"], "Grace");
    assert_eq!(response.body["warnings"], json!([]));
    let contact_id = id_at(&response.body, "/contact/id");

    assert_eq!(app.backend.records::<ContactTag>().len(), 1);
    assert_eq!(app.backend.records::<ContactGroup>().len(), 1);
    assert_eq!(app.backend.records::<ContactCompany>().len(), 1);
    let info = app.backend.records::<ProfessionalInfo>();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].contact_id, contact_id);

    let detail = app
        .get(&user, &format!("/api/v1/contacts/{}", contact_id))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["tags"][0]["name"], "vip");
    assert_eq!(detail.body["group"]["name"], "Friends");
    assert_eq!(detail.body["company"]["name"], "Acme");
    assert_eq!(detail.body["professional_info"]["job_title"], "Rear Admiral");
}

#[tokio::test]
async fn test_invalid_contact_is_rejected_before_any_backend_call() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");

    let response = app
        .post(
            &user,
            "/api/v1/contacts",
            json!({ "first_name": "", "surname": "Lovelace", "email": "not-an-email" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_FAILED");
    assert_eq!(
        failed_fields(&response.body),
        vec!["first_name", "email", "gender"]
    );
    assert_eq!(app.backend.call_count(), 0);
}

#[tokio::test]
async fn test_more_than_three_tags_is_rejected() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let tag_ids: Vec<_> = (0..4).map(|_| uuid::Uuid::now_v7()).collect();

    let response = app
        .post(
            &user,
            "/api/v1/contacts",
            json!({
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "ada@example.com",
                "gender": "female",
                "tag_ids": tag_ids,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&response.body), vec!["tag_ids"]);
    assert_eq!(app.backend.row_count(Table::Contacts), 0);
}

#[tokio::test]
async fn test_contacts_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let alice = app.sign_in("alice@example.com");
    let bob = app.sign_in("bob@example.com");
    let alices = app.create_contact(&alice, "Ada", "Lovelace").await;
    app.create_contact(&bob, "Alan", "Turing").await;

    let listed = app.get(&bob, "/api/v1/contacts").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);
    assert_eq!(listed.body["contacts"][0]["contact"]["first_name"], "Alan");

    let uri = format!("/api/v1/contacts/{}", alices);
    assert_eq!(app.get(&bob, &uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.patch(&bob, &uri, json!({ "surname": "Byron" })).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&bob, &uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backend.row_count(Table::Contacts), 2);
}

#[tokio::test]
async fn test_search_matches_name_and_email() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    app.create_contact(&user, "Ada", "Lovelace").await;
    app.create_contact(&user, "Alan", "Turing").await;

    let response = app.get(&user, "/api/v1/contacts?search=turing").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["contacts"][0]["contact"]["surname"], "Turing");
}

#[tokio::test]
async fn test_update_with_no_fields_is_rejected() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let calls = app.backend.call_count();

    let response = app
        .patch(&user, &format!("/api/v1/contacts/{}", id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.call_count(), calls);
}

#[tokio::test]
async fn test_update_contact_changes_fields() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;

    let response = app
        .patch(
            &user,
            &format!("/api/v1/contacts/{}", id),
            json!({ "surname": "King", "phone": "+44 1234 5678" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["contact"]["surname"], "King");
    let stored = app.backend.records::<Contact>();
    assert_eq!(stored[0].surname, "King");
    assert_eq!(stored[0].phone.as_deref(), Some("+44 1234 5678"));
}

#[tokio::test]
async fn test_update_replaces_links_and_clears_them() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let tag = |name: &'static str| json!({ "name": name, "color": "#336699" });
    let math = app.create_entity(&user, "tags", tag("math")).await;
    let poetry = app.create_entity(&user, "tags", tag("poetry")).await;
    let music = app.create_entity(&user, "tags", tag("music")).await;
    let friends = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    let work = app.create_entity(&user, "groups", json!({ "name": "Work" })).await;
    let acme = app.create_entity(&user, "companies", json!({ "name": "Acme" })).await;
    let globex = app.create_entity(&user, "companies", json!({ "name": "Globex" })).await;

    let created = app
        .post(
            &user,
            "/api/v1/contacts",
            json!({
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "ada@example.com",
                "gender": "female",
                "tag_ids": [math],
                "group_id": friends,
                "company_id": acme,
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let uri = format!("/api/v1/contacts/{}", id_at(&created.body, "/contact/id"));

    let moved = app
        .patch(
            &user,
            &uri,
            json!({ "tag_ids": [poetry, music], "group_id": work, "company_id": globex }),
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK, "{:?}", moved.body);
    assert_eq!(moved.body["warnings"], json!([]));

    let groups = app.backend.records::<ContactGroup>();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_id, work);
    let companies = app.backend.records::<ContactCompany>();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].company_id, globex);
    let mut tag_ids: Vec<_> = app
        .backend
        .records::<ContactTag>()
        .iter()
        .map(|link| link.tag_id)
        .collect();
    tag_ids.sort();
    let mut expected = vec![poetry, music];
    expected.sort();
    assert_eq!(tag_ids, expected);

    let cleared = app
        .patch(
            &user,
            &uri,
            json!({ "tag_ids": [], "group_id": null, "company_id": null }),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK, "{:?}", cleared.body);
    assert_eq!(app.backend.row_count(Table::ContactTags), 0);
    assert_eq!(app.backend.row_count(Table::ContactGroups), 0);
    assert_eq!(app.backend.row_count(Table::ContactCompanies), 0);
}

#[tokio::test]
async fn test_failed_tag_links_on_create_become_warnings() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let tag = app
        .create_entity(&user, "tags", json!({ "name": "vip", "color": "#ff8800" }))
        .await;

    app.backend.fail_next(Table::ContactTags, Operation::Insert);
    let response = app
        .post(
            &user,
            "/api/v1/contacts",
            json!({
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "ada@example.com",
                "gender": "female",
                "tag_ids": [tag],
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    let warnings = response.body["warnings"].as_array().cloned().unwrap_or_default();
    assert_eq!(warnings.len(), 1);
    assert_eq!(app.backend.row_count(Table::Contacts), 1);
    assert_eq!(app.backend.row_count(Table::ContactTags), 0);
}

#[tokio::test]
async fn test_failed_group_change_on_update_becomes_warning() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;

    app.backend.fail_next(Table::ContactGroups, Operation::Insert);
    let response = app
        .patch(
            &user,
            &format!("/api/v1/contacts/{}", id),
            json!({ "surname": "King", "group_id": group }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["warnings"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.backend.records::<Contact>()[0].surname, "King");
    assert_eq!(app.backend.row_count(Table::ContactGroups), 0);
}

#[tokio::test]
async fn test_delete_contact_then_not_found() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let uri = format!("/api/v1/contacts/{}", id);

    assert_eq!(app.delete(&user, &uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&user, &uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backend.row_count(Table::Contacts), 0);
}

#[tokio::test]
async fn test_favourite_toggle_flips_and_flips_back() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let uri = format!("/api/v1/contacts/{}/favourite", id);

    let first = app.post(&user, &uri, json!({})).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["is_favourite"], true);
    assert!(app.backend.records::<Contact>()[0].is_favourite);

    let second = app.post(&user, &uri, json!({})).await;
    assert_eq!(second.body["is_favourite"], false);
    assert!(!app.backend.records::<Contact>()[0].is_favourite);
}

#[tokio::test]
async fn test_failed_favourite_toggle_is_rolled_back() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let uri = format!("/api/v1/contacts/{}/favourite", id);

    app.backend.fail_next(Table::Contacts, Operation::Update);
    let failed = app.post(&user, &uri, json!({})).await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.state.favourites.current(user.id, id), Some(false));
    assert!(!app.state.favourites.is_in_flight(user.id, id));

    let retried = app.post(&user, &uri, json!({})).await;
    assert_eq!(retried.status, StatusCode::OK);
    assert_eq!(retried.body["is_favourite"], true);
}

#[tokio::test]
async fn test_foreign_favourite_attempt_does_not_disturb_owner() {
    let app = TestApp::new();
    let alice = app.sign_in("alice@example.com");
    let mallory = app.sign_in("mallory@example.com");
    let id = app.create_contact(&alice, "Ada", "Lovelace").await;
    let uri = format!("/api/v1/contacts/{}/favourite", id);

    let foreign = app
        .post(&mallory, &uri, json!({ "current_status": true }))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.favourites.current(alice.id, id), Some(false));

    let own = app.post(&alice, &uri, json!({})).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["is_favourite"], true);
    assert!(app.backend.records::<Contact>()[0].is_favourite);
}

#[tokio::test]
async fn test_favourite_toggle_honours_client_status() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;

    let response = app
        .post(
            &user,
            &format!("/api/v1/contacts/{}/favourite", id),
            json!({ "current_status": true }),
        )
        .await;
    assert_eq!(response.body["is_favourite"], false);
}

#[tokio::test]
async fn test_avatar_upload_stores_object_and_sets_url() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;

    let response = app
        .upload(
            &user,
            &format!("/api/v1/contacts/{}/avatar", id),
            &png_bytes(),
            "image/png",
            "me.png",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["bucket"], "avatars");
    let path = response.body["path"].as_str().unwrap_or_default().to_string();
    assert!(path.starts_with(&format!("{}/{}-", user.id, id)));
    assert!(path.ends_with(".png"));
    assert!(app.objects.object("avatars", &path).is_some());

    let stored = app.backend.records::<Contact>();
    assert_eq!(
        stored[0].avatar_url.as_deref(),
        response.body["url"].as_str()
    );
}

#[tokio::test]
async fn test_avatar_upload_rejects_non_images() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;

    let response = app
        .upload(
            &user,
            &format!("/api/v1/contacts/{}/avatar", id),
            b"%PDF-1.7",
            "application/pdf",
            "cv.pdf",
        )
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.objects.object_count(), 0);
}

#[tokio::test]
async fn test_avatar_upload_is_removed_when_row_update_fails() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;

    app.backend.fail_next(Table::Contacts, Operation::Update);
    let response = app
        .upload(
            &user,
            &format!("/api/v1/contacts/{}/avatar", id),
            &png_bytes(),
            "image/png",
            "me.png",
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.objects.object_count(), 0);
    assert_eq!(app.backend.records::<Contact>()[0].avatar_url, None);
}

#[tokio::test]
async fn test_professional_info_upsert_and_delete() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let id = app.create_contact(&user, "Ada", "Lovelace").await;
    let uri = format!("/api/v1/contacts/{}/professional-info", id);

    assert_eq!(app.get(&user, &uri).await.status, StatusCode::NOT_FOUND);

    let first = app.put(&user, &uri, json!({ "job_title": "Analyst" })).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    let second = app
        .put(&user, &uri, json!({ "department": "Engines" }))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(app.backend.row_count(Table::ProfessionalInfo), 1);

    let bad = app
        .put(&user, &uri, json!({ "work_email": "nope" }))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&bad.body), vec!["work_email"]);

    assert_eq!(app.delete(&user, &uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.backend.row_count(Table::ProfessionalInfo), 0);
}

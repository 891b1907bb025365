//! HTTP tests for companies, groups, tags and contact assignment.

use axum::http::StatusCode;
use rolodex_storage::Operation;
use rolodex_test_utils::{ContactCompany, ContactGroup, ContactTag, Note, Table, Task};
use serde_json::json;

#[path = "support/app.rs"]
mod app_support;
use app_support::{failed_fields, id_at, TestApp};

#[tokio::test]
async fn test_company_form_is_validated() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");

    let response = app
        .post(
            &user,
            "/api/v1/companies",
            json!({ "name": " ", "website": "ftp://acme.example" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&response.body), vec!["name", "website"]);
    assert_eq!(app.backend.call_count(), 0);
}

#[tokio::test]
async fn test_tag_colour_must_be_hex() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");

    let response = app
        .post(&user, "/api/v1/tags", json!({ "name": "vip", "color": "red" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&response.body), vec!["color"]);
}

#[tokio::test]
async fn test_contact_holds_at_most_one_company() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let contact = app.create_contact(&user, "Ada", "Lovelace").await;
    let acme = app.create_entity(&user, "companies", json!({ "name": "Acme" })).await;
    let globex = app.create_entity(&user, "companies", json!({ "name": "Globex" })).await;

    let first = app
        .post(
            &user,
            &format!("/api/v1/companies/{}/contacts", acme),
            json!({ "contact_id": contact }),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{:?}", first.body);
    assert_eq!(id_at(&first.body, "/contact_id"), contact);

    let second = app
        .post(
            &user,
            &format!("/api/v1/companies/{}/contacts", globex),
            json!({ "contact_id": contact }),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["code"], "ALREADY_ASSIGNED");

    let links = app.backend.records::<ContactCompany>();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].company_id, acme);
}

#[tokio::test]
async fn test_same_group_twice_conflicts_but_other_group_is_fine() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let contact = app.create_contact(&user, "Ada", "Lovelace").await;
    let friends = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    let work = app.create_entity(&user, "groups", json!({ "name": "Work" })).await;
    let body = json!({ "contact_id": contact });

    let uri = format!("/api/v1/groups/{}/contacts", friends);
    assert_eq!(app.post(&user, &uri, body.clone()).await.status, StatusCode::CREATED);
    assert_eq!(app.post(&user, &uri, body.clone()).await.status, StatusCode::CONFLICT);

    let other = format!("/api/v1/groups/{}/contacts", work);
    assert_eq!(app.post(&user, &other, body).await.status, StatusCode::CREATED);
    assert_eq!(app.backend.records::<ContactGroup>().len(), 2);
}

#[tokio::test]
async fn test_entity_contacts_partition_assigned_and_available() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let ada = app.create_contact(&user, "Ada", "Lovelace").await;
    app.create_contact(&user, "Alan", "Turing").await;
    let tag = app
        .create_entity(&user, "tags", json!({ "name": "math", "color": "#00aa00" }))
        .await;
    let uri = format!("/api/v1/tags/{}/contacts", tag);
    app.post(&user, &uri, json!({ "contact_id": ada })).await;

    let response = app.get(&user, &uri).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["assigned_contacts"].as_array().map(Vec::len), Some(1));
    assert_eq!(response.body["assigned_contacts"][0]["first_name"], "Ada");
    assert_eq!(response.body["available_contacts"].as_array().map(Vec::len), Some(1));
    assert_eq!(response.body["available_contacts"][0]["first_name"], "Alan");
}

#[tokio::test]
async fn test_assigning_unknown_contact_is_not_found() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;

    let response = app
        .post(
            &user,
            &format!("/api/v1/groups/{}/contacts", group),
            json!({ "contact_id": uuid::Uuid::now_v7() }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backend.row_count(Table::ContactGroups), 0);
}

#[tokio::test]
async fn test_unassign_removes_link_then_reports_missing() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let contact = app.create_contact(&user, "Ada", "Lovelace").await;
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    app.post(
        &user,
        &format!("/api/v1/groups/{}/contacts", group),
        json!({ "contact_id": contact }),
    )
    .await;

    let uri = format!("/api/v1/groups/{}/contacts/{}", group, contact);
    assert_eq!(app.delete(&user, &uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.backend.row_count(Table::ContactGroups), 0);
    assert_eq!(app.delete(&user, &uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_a_tag_removes_its_links() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let ada = app.create_contact(&user, "Ada", "Lovelace").await;
    let alan = app.create_contact(&user, "Alan", "Turing").await;
    let tag = app
        .create_entity(&user, "tags", json!({ "name": "math", "color": "#00aa00" }))
        .await;
    let keep = app
        .create_entity(&user, "tags", json!({ "name": "keep", "color": "#0000aa" }))
        .await;
    for contact in [ada, alan] {
        app.post(
            &user,
            &format!("/api/v1/tags/{}/contacts", tag),
            json!({ "contact_id": contact }),
        )
        .await;
    }
    app.post(
        &user,
        &format!("/api/v1/tags/{}/contacts", keep),
        json!({ "contact_id": ada }),
    )
    .await;

    let response = app.delete(&user, &format!("/api/v1/tags/{}", tag)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.backend.row_count(Table::Tags), 1);
    let links = app.backend.records::<ContactTag>();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].tag_id, keep);
}

#[tokio::test]
async fn test_deleting_a_group_removes_its_notes_and_tasks() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    let other = app.create_entity(&user, "groups", json!({ "name": "Work" })).await;
    for entity_id in [group, other] {
        app.create_entity(
            &user,
            "notes",
            json!({ "entity_type": "group", "entity_id": entity_id, "content": "Book a table" }),
        )
        .await;
        app.create_entity(
            &user,
            "tasks",
            json!({ "entity_type": "group", "entity_id": entity_id, "title": "Send invites" }),
        )
        .await;
    }

    let response = app.delete(&user, &format!("/api/v1/groups/{}", group)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let notes = app.backend.records::<Note>();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].entity_id, other);
    let tasks = app.backend.records::<Task>();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].entity_id, other);
}

#[tokio::test]
async fn test_failed_entity_delete_leaves_links_removed() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let contact = app.create_contact(&user, "Ada", "Lovelace").await;
    let group = app.create_entity(&user, "groups", json!({ "name": "Friends" })).await;
    app.post(
        &user,
        &format!("/api/v1/groups/{}/contacts", group),
        json!({ "contact_id": contact }),
    )
    .await;

    // Link and attachment deletes succeed, the entity row delete fails.
    app.backend.fail_next(Table::Groups, Operation::Delete);
    let response = app.delete(&user, &format!("/api/v1/groups/{}", group)).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.backend.row_count(Table::ContactGroups), 0);
    assert_eq!(app.backend.row_count(Table::Groups), 1);
}

#[tokio::test]
async fn test_list_companies_counts_members() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let contact = app.create_contact(&user, "Ada", "Lovelace").await;
    let acme = app.create_entity(&user, "companies", json!({ "name": "Acme" })).await;
    app.create_entity(&user, "companies", json!({ "name": "Globex" })).await;
    app.post(
        &user,
        &format!("/api/v1/companies/{}/contacts", acme),
        json!({ "contact_id": contact }),
    )
    .await;

    let response = app.get(&user, "/api/v1/companies").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    let companies = response.body["companies"].as_array().cloned().unwrap_or_default();
    let acme_entry = companies
        .iter()
        .find(|c| c["company"]["name"] == "Acme")
        .cloned()
        .unwrap_or_default();
    assert_eq!(acme_entry["contact_count"], 1);

    let detail = app.get(&user, &format!("/api/v1/companies/{}", acme)).await;
    assert_eq!(detail.body["contact_count"], 1);
}

#[tokio::test]
async fn test_company_logo_upload() {
    let app = TestApp::new();
    let user = app.sign_in("ada@example.com");
    let acme = app.create_entity(&user, "companies", json!({ "name": "Acme" })).await;

    let response = app
        .upload(
            &user,
            &format!("/api/v1/companies/{}/logo", acme),
            &rolodex_test_utils::fixtures::png_bytes(),
            "image/png",
            "logo.png",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["bucket"], "company-logos");
    assert_eq!(app.objects.object_count(), 1);
}

#[tokio::test]
async fn test_other_users_entities_are_invisible() {
    let app = TestApp::new();
    let alice = app.sign_in("alice@example.com");
    let bob = app.sign_in("bob@example.com");
    let tag = app
        .create_entity(&alice, "tags", json!({ "name": "vip", "color": "#ff8800" }))
        .await;
    let bobs_contact = app.create_contact(&bob, "Alan", "Turing").await;

    assert_eq!(
        app.get(&bob, &format!("/api/v1/tags/{}", tag)).await.status,
        StatusCode::NOT_FOUND
    );
    let assign = app
        .post(
            &bob,
            &format!("/api/v1/tags/{}/contacts", tag),
            json!({ "contact_id": bobs_contact }),
        )
        .await;
    assert_eq!(assign.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.delete(&bob, &format!("/api/v1/tags/{}", tag)).await.status,
        StatusCode::NOT_FOUND
    );

    let listed = app.get(&bob, "/api/v1/tags").await;
    assert_eq!(listed.body["total"], 0);
}

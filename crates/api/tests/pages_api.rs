//! HTTP-level integration tests for the `/pages` API endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router,
//! backed by an in-memory page store.

mod common;

use axum::http::header::LINK;
use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_page, delete, get, get_auth, post_json, put_json, token,
};
use serde_json::json;

fn titles(json: &serde_json::Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Create and fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_page_returns_201_with_first_revision() {
    let app = build_test_app();
    let editor = token("editor", 7);

    let response = post_json(
        &app,
        "/api/v1/pages",
        Some(&editor),
        json!({ "title": "Getting Started", "body": "Read this first", "msg": "init" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let page = &json["data"];
    assert!(page["id"].as_i64().is_some());
    assert_eq!(page["revision_count"], 1);
    assert_eq!(page["current"]["number"], 1);
    assert_eq!(page["current"]["path"], "getting-started");
    assert_eq!(page["current"]["editor"], 7);
    assert_eq!(page["current"]["permissions"]["read"], "anyone");
    assert!(page.get("trashed").is_none());
}

#[tokio::test]
async fn create_page_requires_authentication() {
    let app = build_test_app();
    let response = post_json(&app, "/api/v1/pages", None, json!({ "title": "Nope" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn create_page_rejects_invalid_content() {
    let app = build_test_app();
    let user = token("user", 1);

    let response = post_json(&app, "/api/v1/pages", Some(&user), json!({ "title": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        "/api/v1/pages",
        Some(&user),
        json!({ "title": "Bad path", "path": "Has Spaces" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_page_cannot_require_levels_above_own() {
    let app = build_test_app();
    let user = token("user", 1);

    let response = post_json(
        &app,
        "/api/v1/pages",
        Some(&user),
        json!({ "title": "Locked", "read": "admin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_path_is_conflict() {
    let app = build_test_app();
    let user = token("user", 1);
    create_page(&app, &user, json!({ "title": "Guide" })).await;

    let response = post_json(&app, "/api/v1/pages", Some(&user), json!({ "title": "guide" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn get_page_by_id_and_by_path() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(
        &app,
        &user,
        json!({ "title": "Setup", "path": "guides/setup", "body": "steps" }),
    )
    .await;

    let response = get(&app, &format!("/api/v1/pages/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["current"]["body"], "steps");

    let response = get(&app, "/api/v1/pages/by-path/guides/setup").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);
}

#[tokio::test]
async fn missing_page_returns_404() {
    let app = build_test_app();

    let response = get(&app, "/api/v1/pages/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Page with id 999 not found");

    let response = get(&app, "/api/v1/pages/by-path/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Page at path 'nowhere' not found"
    );
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_level_gates_page_access() {
    let app = build_test_app();
    let editor = token("editor", 2);
    let id = create_page(
        &app,
        &editor,
        json!({ "title": "Staff notes", "read": "editor", "write": "editor" }),
    )
    .await;
    let uri = format!("/api/v1/pages/{id}");

    assert_eq!(get(&app, &uri).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        get_auth(&app, &uri, &token("user", 3)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(get_auth(&app, &uri, &editor).await.status(), StatusCode::OK);
    assert_eq!(
        get_auth(&app, &uri, &token("admin", 9)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn write_level_gates_updates() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(
        &app,
        &user,
        json!({ "title": "Members", "write": "authenticated" }),
    )
    .await;
    let uri = format!("/api/v1/pages/{id}");

    let response = put_json(&app, &uri, None, json!({ "title": "Members", "body": "x" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json(
        &app,
        &uri,
        Some(&token("user", 4)),
        json!({ "title": "Members", "body": "welcome", "write": "authenticated" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["revision_count"], 2);
    assert_eq!(json["data"]["current"]["editor"], 4);
}

#[tokio::test]
async fn invalid_token_is_rejected_even_on_public_routes() {
    let app = build_test_app();
    let response = get_auth(&app, "/api/v1/pages", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_pages_paginates_with_link_header() {
    let app = build_test_app();
    let user = token("user", 1);
    for title in ["Charlie", "Alpha", "Bravo"] {
        create_page(&app, &user, json!({ "title": title })).await;
    }

    let response = get(&app, "/api/v1/pages?sort=alphabetical&limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "3");

    let link = response.headers()[LINK].to_str().unwrap().to_string();
    assert!(link.contains("rel=\"next\""));
    assert!(link.contains("offset=2"));
    assert!(!link.contains("rel=\"previous\""));

    let json = body_json(response).await;
    assert_eq!(titles(&json), vec!["Alpha", "Bravo"]);

    let response = get(&app, "/api/v1/pages?sort=alphabetical&limit=2&offset=2").await;
    let link = response.headers()[LINK].to_str().unwrap().to_string();
    assert!(link.contains("rel=\"previous\""));
    assert!(!link.contains("rel=\"next\""));
    assert_eq!(titles(&body_json(response).await), vec!["Charlie"]);
}

#[tokio::test]
async fn list_pages_filters_by_text_and_scope() {
    let app = build_test_app();
    let admin = token("admin", 9);
    create_page(&app, &admin, json!({ "title": "Tomatoes", "body": "red fruit" })).await;
    create_page(&app, &admin, json!({ "title": "Potatoes", "body": "tubers" })).await;
    create_page(
        &app,
        &admin,
        json!({ "title": "Tomato budget", "body": "tomatoes cost money", "read": "admin" }),
    )
    .await;

    let json = body_json(get(&app, "/api/v1/pages?text=tomatoes").await).await;
    assert_eq!(titles(&json), vec!["Tomatoes"]);

    let response = get_auth(&app, "/api/v1/pages?text=tomatoes", &admin).await;
    assert_eq!(response.headers()["x-total-count"], "2");
}

#[tokio::test]
async fn list_pages_rejects_malformed_filters() {
    let app = build_test_app();

    let response = get(&app, "/api/v1/pages?createdAfter=yesterday").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("createdAfter"));

    let response = get(&app, "/api/v1/pages?revisionsMin=many").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&app, "/api/v1/pages?sort=sideways").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn huge_offset_returns_empty_window() {
    let app = build_test_app();
    create_page(&app, &token("user", 1), json!({ "title": "Only" })).await;

    let response = get(&app, "/api/v1/pages?offset=9223372036854775807&limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "1");

    let link = response.headers()[LINK].to_str().unwrap().to_string();
    assert!(!link.contains("rel=\"next\""));
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_listing_has_total_but_no_links() {
    let app = build_test_app();
    let response = get(&app, "/api/v1/pages").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "0");
    assert!(response.headers().get(LINK).is_none());
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Revisions, diff, rollback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revision_history_is_numbered_oldest_first() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(&app, &user, json!({ "title": "Log", "body": "one" })).await;
    let uri = format!("/api/v1/pages/{id}");
    for body in ["two", "three"] {
        put_json(&app, &uri, Some(&user), json!({ "title": "Log", "body": body })).await;
    }

    let json = body_json(get(&app, &format!("{uri}/revisions")).await).await;
    let numbers: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let json = body_json(get(&app, &format!("{uri}/revisions/1")).await).await;
    assert_eq!(json["data"]["body"], "one");
}

#[tokio::test]
async fn revision_number_out_of_range_is_400() {
    let app = build_test_app();
    let id = create_page(&app, &token("user", 1), json!({ "title": "Solo" })).await;

    for n in ["0", "2", "abc"] {
        let response = get(&app, &format!("/api/v1/pages/{id}/revisions/{n}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "revision {n}");
    }
}

#[tokio::test]
async fn diff_defaults_to_latest_pair() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(&app, &user, json!({ "title": "Fox", "body": "the quick fox" })).await;
    put_json(
        &app,
        &format!("/api/v1/pages/{id}"),
        Some(&user),
        json!({ "title": "Fox", "body": "the slow fox" }),
    )
    .await;

    let response = get(&app, &format!("/api/v1/pages/{id}/diff")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["from"], 1);
    assert_eq!(data["to"], 2);
    assert_eq!(data["unchanged"], false);

    let body = data["diff"]["content"]["body"].as_array().unwrap();
    assert!(body
        .iter()
        .any(|s| s["removed"] == true && s["value"].as_str().unwrap().contains("quick")));
    assert!(body
        .iter()
        .any(|s| s["added"] == true && s["value"].as_str().unwrap().contains("slow")));

    let json = body_json(get(&app, &format!("/api/v1/pages/{id}/diff?from=2&to=2")).await).await;
    assert_eq!(json["data"]["unchanged"], true);
}

#[tokio::test]
async fn rollback_appends_copy_of_target() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(&app, &user, json!({ "title": "Draft", "body": "original" })).await;
    let uri = format!("/api/v1/pages/{id}");
    put_json(&app, &uri, Some(&user), json!({ "title": "Draft", "body": "vandalized" })).await;

    let response = post_json(&app, &format!("{uri}/rollback/1"), Some(&user), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["revision_count"], 3);
    assert_eq!(json["data"]["current"]["body"], "original");
    assert_eq!(json["data"]["current"]["msg"], "Rolling back to revision #1");

    let response = post_json(&app, &format!("{uri}/rollback/7"), Some(&user), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Trash
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trashed_page_is_hidden_until_restored() {
    let app = build_test_app();
    let user = token("user", 1);
    let admin = token("admin", 9);
    let id = create_page(&app, &user, json!({ "title": "Temp" })).await;
    let uri = format!("/api/v1/pages/{id}");

    assert_eq!(delete(&app, &uri, Some(&user)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);

    let response = get_auth(&app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["trashed"].is_string());

    let json = body_json(get_auth(&app, "/api/v1/pages/trash/count", &admin).await).await;
    assert_eq!(json["data"]["count"], 1);

    let response = put_json(&app, &uri, Some(&admin), json!({ "title": "Temp" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(&app, &format!("{uri}/restore"), Some(&admin), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn trash_admin_routes_require_admin() {
    let app = build_test_app();
    let user = token("user", 1);
    let id = create_page(&app, &user, json!({ "title": "Keep" })).await;

    let response = get_auth(&app, "/api/v1/pages/trash/count", &user).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        &app,
        &format!("/api/v1/pages/{id}/restore"),
        Some(&user),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

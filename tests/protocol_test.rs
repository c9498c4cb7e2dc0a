//! End-to-end protocol tests against the demo app on a real socket.

mod common;

use common::{page_from_html, session_cookie, start_server};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_first_visit_renders_html_document() {
    let server = start_server().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(response.headers().get("x-inertia").is_none());
    assert!(response.headers().get("x-request-id").is_some());

    let html = response.text().await.unwrap();
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains("<div id=\"app\" data-page=\""));

    let page = page_from_html(&html);
    assert_eq!(page["component"], "Home");
    assert_eq!(page["url"], "/");
    assert_eq!(page["version"], server.version.as_str());
    assert_eq!(page["props"]["greeting"], "Welcome");
    assert_eq!(page["props"]["app"]["name"], "Inertia Axum Demo");
    assert_eq!(page["encryptHistory"], false);
    assert_eq!(page["clearHistory"], false);
    // View data stays out of the page.
    assert!(page["props"].get("title").is_none());
}

#[tokio::test]
async fn test_inertia_visit_returns_json_page() {
    let server = start_server().await;

    let response = server.visit("/users/1").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-inertia"], "true");
    assert_eq!(response.headers()["vary"], "X-Inertia");
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let page: Value = response.json().await.unwrap();
    assert_eq!(page["component"], "Users/Show");
    assert_eq!(page["url"], "/users/1");
    assert_eq!(page["props"]["name"], "Alice");
    assert!(page["props"].get("email").is_none());
    assert_eq!(page["deferredProps"], json!({ "default": ["email"] }));
    assert!(page.get("mergeProps").is_none());
}

#[tokio::test]
async fn test_partial_reload_fetches_deferred_prop() {
    let server = start_server().await;

    let response = server
        .partial("/users/1", "Users/Show", "email")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = response.json().await.unwrap();
    assert_eq!(page["props"], json!({ "email": "alice@example.com" }));
    assert!(page.get("deferredProps").is_none());
}

#[tokio::test]
async fn test_deferred_groups_and_merge_props() {
    let server = start_server().await;

    let page: Value = server.visit("/users").send().await.unwrap().json().await.unwrap();
    assert_eq!(page["component"], "Users/Index");
    assert_eq!(page["props"]["users"].as_array().unwrap().len(), 3);
    assert!(page["props"].get("teams").is_none());
    assert!(page["props"].get("stats").is_none());
    assert_eq!(
        page["deferredProps"],
        json!({ "stats": ["stats", "activity"], "default": ["permissions"] })
    );
    assert_eq!(page["mergeProps"], json!(["users"]));
}

#[tokio::test]
async fn test_partial_reload_of_one_group() {
    let server = start_server().await;

    let page: Value = server
        .partial("/users", "Users/Index", "stats,activity")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        page["props"],
        json!({ "stats": { "total": 3 }, "activity": ["Alice", "Bob", "Carol"] })
    );
    assert!(page.get("deferredProps").is_none());
    assert!(page.get("mergeProps").is_none());
}

#[tokio::test]
async fn test_optional_prop_only_on_request() {
    let server = start_server().await;

    let page: Value = server
        .partial("/users", "Users/Index", "teams")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["props"], json!({ "teams": ["core", "docs"] }));
}

#[tokio::test]
async fn test_partial_for_other_component_is_full_render() {
    let server = start_server().await;

    let page: Value = server
        .partial("/users", "Dashboard", "teams")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(page["props"].get("users").is_some());
    assert!(page["props"].get("teams").is_none());
    assert!(page.get("deferredProps").is_some());
}

#[tokio::test]
async fn test_reset_suppresses_merge() {
    let server = start_server().await;

    let page: Value = server
        .visit("/users")
        .header("X-Inertia-Reset", "users")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(page["props"].get("users").is_some());
    assert!(page.get("mergeProps").is_none());
}

#[tokio::test]
async fn test_stale_version_forces_full_visit() {
    let server = start_server().await;

    let response = server
        .client
        .get(server.url("/users?page=2"))
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", "outdated")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()["x-inertia-location"], "/users?page=2");
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stale_version_ignored_on_post() {
    let server = start_server().await;

    let response = server
        .client
        .post(server.url("/logout"))
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", "outdated")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/");
}

#[tokio::test]
async fn test_xhr_without_inertia_header_is_rejected() {
    let server = start_server().await;

    let response = server
        .client
        .get(server.url("/users"))
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redirect_after_patch_becomes_see_other() {
    let server = start_server().await;

    let response = server
        .client
        .patch(server.url("/users/2"))
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", &server.version)
        .json(&json!({ "name": "Robert" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/users");
}

#[tokio::test]
async fn test_redirect_kept_outside_inertia() {
    let server = start_server().await;

    let response = server
        .client
        .patch(server.url("/users/2"))
        .json(&json!({ "name": "Robert" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_redirect_after_delete_becomes_see_other() {
    let server = start_server().await;

    let response = server
        .client
        .delete(server.url("/users/3"))
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", &server.version)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page: Value = server.visit("/users").send().await.unwrap().json().await.unwrap();
    assert_eq!(page["props"]["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_flash_message_shown_once() {
    let server = start_server().await;

    let first = server.visit("/").send().await.unwrap();
    let cookie = session_cookie(&first);
    let page: Value = first.json().await.unwrap();
    assert!(page["props"].get("flash").is_none());

    let response = server
        .client
        .patch(server.url("/users/1"))
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", &server.version)
        .header("Cookie", &cookie)
        .json(&json!({ "name": "Alicia" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page: Value = server
        .visit("/users")
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        page["props"]["flash"],
        json!([{ "category": "success", "message": "User updated" }])
    );
    assert_eq!(page["props"]["users"][0]["name"], "Alicia");

    let page: Value = server
        .visit("/users")
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(page["props"].get("flash").is_none());
}

#[tokio::test]
async fn test_logout_clears_history_once() {
    let server = start_server().await;

    let first = server.visit("/").send().await.unwrap();
    let cookie = session_cookie(&first);

    let response = server
        .client
        .post(server.url("/logout"))
        .header("X-Inertia", "true")
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let page: Value = server
        .visit("/")
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["clearHistory"], true);

    let page: Value = server
        .visit("/")
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["clearHistory"], false);
}

#[tokio::test]
async fn test_external_location_visit() {
    let server = start_server().await;

    let response = server.visit("/docs").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.headers()["x-inertia-location"],
        "https://inertiajs.com"
    );
}

#[tokio::test]
async fn test_raw_response_passes_through() {
    let server = start_server().await;

    let response = server.visit("/export").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert!(response.headers().get("x-inertia").is_none());
    let body = response.text().await.unwrap();
    assert!(body.starts_with("1,Alice,alice@example.com"));
}

#[tokio::test]
async fn test_shorthand_page_route() {
    let server = start_server().await;

    let page: Value = server.visit("/about").send().await.unwrap().json().await.unwrap();
    assert_eq!(page["component"], "About");
    assert_eq!(page["props"], json!({ "app": { "name": "Inertia Axum Demo" } }));
}

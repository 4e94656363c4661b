//! Session and role guard behavior across the protected surface.

use axum::http::StatusCode;
use oxgate_integration_tests::{TestApp, VALID_TENANT_TOKEN};
use serde_json::json;

const PROTECTED: &[(&str, &str)] = &[
    ("POST", "/register-company"),
    ("GET", "/products"),
    ("DELETE", "/company/4b4e6baf-5b0e-4f47-9e35-7a06eb4f1e9a"),
];

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, _) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new();

    for (method, path) in PROTECTED {
        let body = (*method == "POST")
            .then(|| json!({ "token": VALID_TENANT_TOKEN, "subdomain": "acme" }));
        let (status, response) = app.request(method, path, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(response["error"], "Missing authorization header");
    }
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = TestApp::new();

    for (method, path) in PROTECTED {
        let body = (*method == "POST")
            .then(|| json!({ "token": VALID_TENANT_TOKEN, "subdomain": "acme" }));
        let (status, response) = app
            .request(method, path, Some("not-a-real-token"), body)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(response["error"], "Invalid or expired token");
    }
}

#[tokio::test]
async fn tokens_from_another_deployment_are_rejected() {
    // Two apps sign with different issuers; a token from one must not
    // open a session on the other.
    let app_a = TestApp::new();
    let app_b = TestApp::new();

    let token = app_a.login("alice@example.com").await;
    let (status, _) = app_b.request("GET", "/products", Some(&token), None).await;

    // Same signing secret but the user does not exist in app_b's store,
    // and the products route then finds no membership.
    assert_ne!(status, StatusCode::OK);
}

#[tokio::test]
async fn manager_cannot_delete_a_company() {
    let app = TestApp::new();

    let owner = app.login("owner@example.com").await;
    let (_, body) = app
        .register_company(&owner, "acme", VALID_TENANT_TOKEN)
        .await;
    let company_id = body["company"]["id"].as_str().expect("id").to_owned();

    let manager = app.login("manager@example.com").await;
    app.register_company(&manager, "acme", VALID_TENANT_TOKEN)
        .await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/company/{company_id}"),
            Some(&manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient role for this operation");
}

#[tokio::test]
async fn admin_token_passes_the_manager_gate() {
    let app = TestApp::new();

    let owner = app.login("owner@example.com").await;
    app.register_company(&owner, "acme", VALID_TENANT_TOKEN)
        .await;
    let admin = app.login("owner@example.com").await;

    // ADMIN satisfies the MANAGER-level products guard
    let (status, _) = app.request("GET", "/products", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

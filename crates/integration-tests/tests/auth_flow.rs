//! OTP login and verification flow.
//!
//! Runs against the in-process router with the in-memory store; no
//! database or network required.

use axum::http::StatusCode;
use oxgate_integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn login_issues_a_six_digit_code() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OTP sent successfully");

    let otp = body["otp"].as_str().expect("otp in response");
    assert_eq!(otp.len(), 6);
    assert!(otp.bytes().all(|b| b.is_ascii_digit()));
}

#[tokio::test]
async fn verify_returns_token_and_manager_identity() {
    let app = TestApp::new();

    let (_, login) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;
    let otp = login["otp"].as_str().expect("otp in response");

    let (status, body) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": otp }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["access_token"].as_str().expect("token").is_empty());
    assert_eq!(body["user"]["email"], "alice@example.com");
    // First contact creates the account with the default role
    assert_eq!(body["user"]["role"], "MANAGER");
}

#[tokio::test]
async fn otp_is_single_use() {
    let app = TestApp::new();

    let (_, login) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;
    let otp = login["otp"].as_str().expect("otp in response").to_owned();

    let verify = json!({ "email": "alice@example.com", "otp": otp });
    let (status, _) = app.post_json("/auth/verify", verify.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post_json("/auth/verify", verify).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn relogin_invalidates_previous_code() {
    let app = TestApp::new();

    let (_, first) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;
    let first_otp = first["otp"].as_str().expect("otp").to_owned();

    let (_, second) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;
    let second_otp = second["otp"].as_str().expect("otp").to_owned();

    // The superseded code may no longer be accepted, unless the second
    // draw happened to produce the same digits.
    if first_otp != second_otp {
        let (status, _) = app
            .post_json(
                "/auth/verify",
                json!({ "email": "alice@example.com", "otp": first_otp }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": second_otp }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_code_is_rejected_without_consuming_the_real_one() {
    let app = TestApp::new();

    let (_, login) = app
        .post_json("/auth/login", json!({ "email": "alice@example.com" }))
        .await;
    let otp = login["otp"].as_str().expect("otp").to_owned();
    let wrong = if otp == "000000" { "000001" } else { "000000" };

    let (status, body) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": wrong }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP");

    // The stored code survives a failed guess
    let (status, _) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": otp }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_inputs_are_rejected() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/auth/login", json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": "12345" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "alice@example.com", "otp": "12345a" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_without_login_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/auth/verify",
            json!({ "email": "nobody@example.com", "otp": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP");
}

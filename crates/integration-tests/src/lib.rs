//! Integration test harness for Oxgate.
//!
//! Drives the full axum router in-process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory store and a stub tenant API. No database or
//! network is required; every test file builds a fresh [`TestApp`] so tests
//! never share state.
//!
//! ```rust,ignore
//! let app = TestApp::new();
//! let token = app.login("alice@example.com").await;
//! let (status, body) = app.request("GET", "/products", Some(&token), None).await;
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use oxgate_api::config::{ApiConfig, OxConfig};
use oxgate_api::ox::{OxError, TenantApi};
use oxgate_api::routes;
use oxgate_api::state::AppState;
use oxgate_api::store::MemoryStore;
use oxgate_core::{Subdomain, TenantCredential};

/// The only external credential the stub tenant API accepts.
pub const VALID_TENANT_TOKEN: &str = "Bearer integration-test-token";

/// Stub tenant API: accepts [`VALID_TENANT_TOKEN`] for any subdomain and
/// echoes the requested page back as the catalog payload.
pub struct StubTenantApi;

#[async_trait]
impl TenantApi for StubTenantApi {
    async fn validate_profile(
        &self,
        _subdomain: &Subdomain,
        credential: &TenantCredential,
    ) -> Result<(), OxError> {
        if credential.as_str() == VALID_TENANT_TOKEN {
            Ok(())
        } else {
            Err(OxError::Status(reqwest::StatusCode::UNAUTHORIZED))
        }
    }

    async fn fetch_variations(
        &self,
        subdomain: &Subdomain,
        _credential: &TenantCredential,
        page: u32,
        size: u32,
    ) -> Result<Value, OxError> {
        Ok(json!({
            "subdomain": subdomain.as_str(),
            "page": page,
            "size": size,
            "items": [],
        }))
    }
}

/// An in-process instance of the full application.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Build a fresh app on the in-memory store and stub tenant API.
    #[must_use]
    pub fn new() -> Self {
        let config = ApiConfig {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            jwt_secret: SecretString::from("integration-test-secret-0123456789abcdef"),
            jwt_issuer: "oxgate-test".to_owned(),
            ox: OxConfig {
                base_domain: "ox-sys.test".to_owned(),
                timeout: Duration::from_secs(1),
            },
        };

        let state = AppState::new(config, Arc::new(MemoryStore::new()), Arc::new(StubTenantApi));
        Self {
            router: routes::app(state),
        }
    }

    /// Send one request and decode the JSON response body.
    ///
    /// An empty body decodes as `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router returned an error");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// POST a JSON body without a session token.
    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", path, None, Some(body)).await
    }

    /// Run a full login + verify flow and return the session token.
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self.post_json("/auth/login", json!({ "email": email })).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        let otp = body["otp"].as_str().expect("login response carries the OTP");

        let (status, body) = self
            .post_json("/auth/verify", json!({ "email": email, "otp": otp }))
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");
        body["access_token"]
            .as_str()
            .expect("verify response carries a token")
            .to_owned()
    }

    /// Register a company for the given session, returning the response.
    pub async fn register_company(
        &self,
        token: &str,
        subdomain: &str,
        tenant_token: &str,
    ) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/register-company",
            Some(token),
            Some(json!({ "token": tenant_token, "subdomain": subdomain })),
        )
        .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

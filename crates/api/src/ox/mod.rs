//! External tenant ("OX") API boundary.
//!
//! Every company maps to one tenant of the external OX platform, addressed
//! as `https://{subdomain}.{base domain}`. This module defines the trait
//! the services program against and the reqwest-backed production client.

mod client;

pub use client::OxClient;

use async_trait::async_trait;
use thiserror::Error;

use oxgate_core::{Subdomain, TenantCredential};

/// Errors that can occur when calling the tenant API.
///
/// Callers generally fold all of these into one client-facing outcome; the
/// variants exist so the underlying cause can be logged.
#[derive(Debug, Error)]
pub enum OxError {
    /// Network failure, timeout, or protocol error.
    #[error("tenant API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The tenant API answered with a non-success status.
    #[error("tenant API returned status {0}")]
    Status(reqwest::StatusCode),

    /// The tenant API answered 2xx but with an empty or undecodable body.
    #[error("tenant API returned an empty or invalid body")]
    InvalidBody,
}

/// The operations this service performs against a tenant's external API.
#[async_trait]
pub trait TenantApi: Send + Sync {
    /// Confirm that `credential` is valid for the tenant at `subdomain`.
    ///
    /// Succeeds only on a 2xx response carrying a non-empty body. No
    /// retries; a failure here means the caller must re-invoke.
    async fn validate_profile(
        &self,
        subdomain: &Subdomain,
        credential: &TenantCredential,
    ) -> Result<(), OxError>;

    /// Fetch one page of the tenant's product variations.
    ///
    /// The payload is passed through untouched.
    async fn fetch_variations(
        &self,
        subdomain: &Subdomain,
        credential: &TenantCredential,
        page: u32,
        size: u32,
    ) -> Result<serde_json::Value, OxError>;
}

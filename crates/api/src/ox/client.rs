//! Reqwest-backed tenant API client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::instrument;

use oxgate_core::{Subdomain, TenantCredential};

use super::{OxError, TenantApi};
use crate::config::OxConfig;

/// HTTP client for the external OX tenant API.
///
/// One shared connection pool; every request carries the tenant's stored
/// credential verbatim in the `Authorization` header and is bounded by the
/// configured timeout. There is no retry logic anywhere in this client:
/// the service's contract is that a failed call surfaces to the caller.
#[derive(Clone)]
pub struct OxClient {
    client: reqwest::Client,
    base_domain: String,
}

impl OxClient {
    /// Create a new tenant API client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &OxConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_domain: config.base_domain.clone(),
        }
    }

    fn tenant_url(&self, subdomain: &Subdomain, path: &str) -> String {
        format!("https://{subdomain}.{}/{path}", self.base_domain)
    }
}

#[async_trait]
impl TenantApi for OxClient {
    #[instrument(skip(self, credential), fields(subdomain = %subdomain))]
    async fn validate_profile(
        &self,
        subdomain: &Subdomain,
        credential: &TenantCredential,
    ) -> Result<(), OxError> {
        let response = self
            .client
            .get(self.tenant_url(subdomain, "profile"))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, credential.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OxError::Status(status));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(OxError::InvalidBody);
        }

        Ok(())
    }

    #[instrument(skip(self, credential), fields(subdomain = %subdomain))]
    async fn fetch_variations(
        &self,
        subdomain: &Subdomain,
        credential: &TenantCredential,
        page: u32,
        size: u32,
    ) -> Result<serde_json::Value, OxError> {
        let response = self
            .client
            .get(self.tenant_url(subdomain, "variations"))
            .query(&[("page", page), ("size", size)])
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, credential.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OxError::Status(status));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|_| OxError::InvalidBody)
    }
}

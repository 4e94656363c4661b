//! Product catalog passthrough.
//!
//! Thin proxy to the external tenant API: pick one of the caller's
//! companies, forward a paginated request with that company's stored
//! credential, and hand back the payload untouched.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use oxgate_core::UserId;

use crate::error::ApiError;
use crate::ox::{OxError, TenantApi};
use crate::store::{AuthStore, StoreError};

/// Largest page the proxy will forward.
pub const MAX_PAGE_SIZE: u32 = 20;

/// Errors from the catalog passthrough.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Requested page size is over the ceiling.
    #[error("size cannot exceed {MAX_PAGE_SIZE}")]
    PageSizeTooLarge,

    /// The caller belongs to no company, so there is no credential to
    /// forward.
    #[error("user is not associated with any company")]
    NoMembership,

    /// The caller's membership references a company that no longer exists.
    #[error("membership references missing company")]
    DanglingMembership,

    /// The tenant API call failed.
    #[error("failed to fetch products from tenant API")]
    Upstream(#[source] OxError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::PageSizeTooLarge => {
                Self::BadRequest(format!("Size cannot exceed {MAX_PAGE_SIZE}"))
            }
            CatalogError::NoMembership => {
                Self::Forbidden("User is not associated with any company".to_owned())
            }
            CatalogError::Upstream(_) => {
                Self::BadRequest("Failed to fetch products from tenant API".to_owned())
            }
            CatalogError::DanglingMembership => Self::Internal(err.to_string()),
            CatalogError::Store(e) => Self::Store(e),
        }
    }
}

/// Pages through a tenant's product variations on behalf of a member.
pub struct CatalogService {
    store: Arc<dyn AuthStore>,
    tenant_api: Arc<dyn TenantApi>,
}

impl CatalogService {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn AuthStore>, tenant_api: Arc<dyn TenantApi>) -> Self {
        Self { store, tenant_api }
    }

    /// Fetch one page of variations for the caller's default company.
    ///
    /// The default company is the caller's oldest membership (creation
    /// time ascending, company id as tiebreak), which keeps the choice
    /// stable across calls.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PageSizeTooLarge`] before any outbound call
    /// if `size` is over [`MAX_PAGE_SIZE`], and
    /// [`CatalogError::NoMembership`] if the caller belongs to no company.
    pub async fn variations(
        &self,
        caller: UserId,
        page: u32,
        size: u32,
    ) -> Result<serde_json::Value, CatalogError> {
        if size > MAX_PAGE_SIZE {
            return Err(CatalogError::PageSizeTooLarge);
        }

        let memberships = self.store.memberships_for_user(caller).await?;
        let membership = memberships.first().ok_or(CatalogError::NoMembership)?;

        let company = self
            .store
            .find_company(membership.company_id)
            .await?
            .ok_or(CatalogError::DanglingMembership)?;

        self.tenant_api
            .fetch_variations(&company.subdomain, &company.credential, page, size)
            .await
            .map_err(|cause| {
                warn!(subdomain = %company.subdomain, %cause, "variations fetch failed");
                CatalogError::Upstream(cause)
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use oxgate_core::{CompanyId, Role, Subdomain, TenantCredential};

    use super::*;
    use crate::models::{Company, Membership};
    use crate::store::MemoryStore;

    /// Tenant API stub that reports which tenant it was called for.
    struct EchoTenantApi;

    #[async_trait]
    impl TenantApi for EchoTenantApi {
        async fn validate_profile(
            &self,
            _subdomain: &Subdomain,
            _credential: &TenantCredential,
        ) -> Result<(), OxError> {
            Ok(())
        }

        async fn fetch_variations(
            &self,
            subdomain: &Subdomain,
            credential: &TenantCredential,
            page: u32,
            size: u32,
        ) -> Result<serde_json::Value, OxError> {
            Ok(json!({
                "subdomain": subdomain.as_str(),
                "credential": credential.as_str(),
                "page": page,
                "size": size,
            }))
        }
    }

    async fn company_with_member(
        store: &MemoryStore,
        subdomain: &str,
        user: UserId,
        joined_at: chrono::DateTime<Utc>,
    ) -> CompanyId {
        let company = Company {
            id: CompanyId::generate(),
            subdomain: Subdomain::parse(subdomain).unwrap(),
            credential: format!("Bearer {subdomain}-token").into(),
            owner_id: user,
            created_at: joined_at,
        };
        store.create_company(&company).await.unwrap();
        store
            .create_membership(&Membership {
                user_id: user,
                company_id: company.id,
                role: Role::Manager,
                created_at: joined_at,
            })
            .await
            .unwrap();
        company.id
    }

    fn service(store: Arc<MemoryStore>) -> CatalogService {
        CatalogService::new(store, Arc::new(EchoTenantApi))
    }

    #[tokio::test]
    async fn oversized_page_is_rejected_before_calling_out() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);

        let result = svc.variations(UserId::generate(), 1, 21).await;
        assert!(matches!(result, Err(CatalogError::PageSizeTooLarge)));
    }

    #[tokio::test]
    async fn no_membership_is_forbidden() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);

        let result = svc.variations(UserId::generate(), 1, 10).await;
        assert!(matches!(result, Err(CatalogError::NoMembership)));
    }

    #[tokio::test]
    async fn forwards_with_oldest_company_credential() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::generate();
        let now = Utc::now();

        // Joined "newer" first, but "older" has the earlier timestamp.
        company_with_member(&store, "newer", user, now).await;
        company_with_member(&store, "older", user, now - chrono::Duration::days(1)).await;

        let svc = service(store);
        let payload = svc.variations(user, 2, 20).await.unwrap();
        assert_eq!(payload["subdomain"], "older");
        assert_eq!(payload["credential"], "Bearer older-token");
        assert_eq!(payload["page"], 2);
        assert_eq!(payload["size"], 20);
    }
}

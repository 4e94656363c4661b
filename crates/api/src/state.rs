//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::ox::TenantApi;
use crate::services::{CatalogService, CompanyService, OtpService, TokenService};
use crate::store::AuthStore;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    tokens: TokenService,
    otp: OtpService,
    companies: CompanyService,
    catalog: CatalogService,
}

impl AppState {
    /// Assemble the state from its collaborators.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn AuthStore>,
        tenant_api: Arc<dyn TenantApi>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_issuer.clone());
        let otp = OtpService::new(store.clone(), tokens.clone());
        let companies = CompanyService::new(store.clone(), tenant_api.clone());
        let catalog = CatalogService::new(store, tenant_api);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                tokens,
                otp,
                companies,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn otp(&self) -> &OtpService {
        &self.inner.otp
    }

    #[must_use]
    pub fn companies(&self) -> &CompanyService {
        &self.inner.companies
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}

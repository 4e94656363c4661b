//! Company onboarding: external credential validation, idempotent
//! membership assignment, ownership-gated deletion.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use oxgate_core::{CompanyId, Role, Subdomain, TenantCredential, UserId};

use crate::error::ApiError;
use crate::models::{Company, Membership, RegistrationOutcome};
use crate::ox::TenantApi;
use crate::store::{AuthStore, StoreError};

/// Errors from company onboarding and deletion.
#[derive(Debug, Error)]
pub enum CompanyError {
    /// The external validator rejected the credential, or could not be
    /// reached at all. The two are indistinguishable to the caller; the
    /// underlying cause is logged.
    #[error("invalid token or subdomain")]
    InvalidExternalCredential,

    /// No company with the given id.
    #[error("company not found")]
    NotFound,

    /// The caller is not the company's owner.
    #[error("only the user who created the company can delete it")]
    NotOwner,

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CompanyError> for ApiError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::InvalidExternalCredential => {
                Self::BadRequest("Invalid token or subdomain".to_owned())
            }
            CompanyError::NotFound => Self::NotFound("Company not found".to_owned()),
            CompanyError::NotOwner => {
                Self::Forbidden("Only the admin who created the company can delete it".to_owned())
            }
            CompanyError::Store(e) => Self::Store(e),
        }
    }
}

/// Onboards companies and enforces ownership on deletion.
pub struct CompanyService {
    store: Arc<dyn AuthStore>,
    tenant_api: Arc<dyn TenantApi>,
}

impl CompanyService {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn AuthStore>, tenant_api: Arc<dyn TenantApi>) -> Self {
        Self { store, tenant_api }
    }

    /// Register the caller with the company at `subdomain`, creating the
    /// company if it does not exist yet.
    ///
    /// The credential is validated against the tenant's external profile
    /// endpoint before anything is persisted. Then:
    ///
    /// - subdomain unseen: the caller becomes the owner, is promoted to
    ///   global ADMIN, and gets an ADMIN membership;
    /// - company exists: the caller gets a MANAGER membership, with no
    ///   global promotion;
    /// - caller already a member: nothing changes.
    ///
    /// Races are settled by the store's uniqueness constraints: losing the
    /// company-creation race drops the caller onto the join path, and
    /// losing the membership race reads back as already-a-member.
    ///
    /// # Errors
    ///
    /// Returns [`CompanyError::InvalidExternalCredential`] when the
    /// external validation fails for any reason.
    pub async fn register_company(
        &self,
        credential: TenantCredential,
        subdomain: Subdomain,
        caller: UserId,
    ) -> Result<RegistrationOutcome, CompanyError> {
        if let Err(cause) = self
            .tenant_api
            .validate_profile(&subdomain, &credential)
            .await
        {
            warn!(%subdomain, %cause, "tenant credential validation failed");
            return Err(CompanyError::InvalidExternalCredential);
        }

        match self.store.find_company_by_subdomain(&subdomain).await? {
            Some(existing) => self.join(existing, caller).await,
            None => self.create(credential, subdomain, caller).await,
        }
    }

    async fn create(
        &self,
        credential: TenantCredential,
        subdomain: Subdomain,
        caller: UserId,
    ) -> Result<RegistrationOutcome, CompanyError> {
        let company = Company {
            id: CompanyId::generate(),
            subdomain: subdomain.clone(),
            credential,
            owner_id: caller,
            created_at: Utc::now(),
        };

        match self.store.create_company(&company).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // Lost the creation race; whoever won owns the company
                // and this caller joins it instead.
                let existing = self
                    .store
                    .find_company_by_subdomain(&subdomain)
                    .await?
                    .ok_or(CompanyError::NotFound)?;
                return self.join(existing, caller).await;
            }
            Err(e) => return Err(e.into()),
        }

        self.store.set_user_role(caller, Role::Admin).await?;
        self.store
            .create_membership(&Membership {
                user_id: caller,
                company_id: company.id,
                role: Role::Admin,
                created_at: Utc::now(),
            })
            .await?;

        info!(company_id = %company.id, %subdomain, owner = %caller, "company created");
        Ok(RegistrationOutcome::Created(company))
    }

    async fn join(
        &self,
        company: Company,
        caller: UserId,
    ) -> Result<RegistrationOutcome, CompanyError> {
        if self
            .store
            .find_membership(caller, company.id)
            .await?
            .is_some()
        {
            return Ok(RegistrationOutcome::AlreadyMember(company));
        }

        let membership = Membership {
            user_id: caller,
            company_id: company.id,
            role: Role::Manager,
            created_at: Utc::now(),
        };
        match self.store.create_membership(&membership).await {
            Ok(()) => {
                info!(company_id = %company.id, user = %caller, "joined company as manager");
                Ok(RegistrationOutcome::Joined(company))
            }
            // Lost the membership race to a concurrent register by the
            // same caller; the outcome is the same membership row.
            Err(StoreError::Conflict(_)) => Ok(RegistrationOutcome::AlreadyMember(company)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a company and all of its memberships.
    ///
    /// Only the company's owner may delete it; an ADMIN role (global or in
    /// this very company) is not enough.
    ///
    /// # Errors
    ///
    /// Returns [`CompanyError::NotFound`] if the company does not exist
    /// and [`CompanyError::NotOwner`] if the caller did not create it.
    pub async fn delete_company(
        &self,
        company_id: CompanyId,
        caller: UserId,
    ) -> Result<(), CompanyError> {
        let company = self
            .store
            .find_company(company_id)
            .await?
            .ok_or(CompanyError::NotFound)?;

        if company.owner_id != caller {
            return Err(CompanyError::NotOwner);
        }

        self.store.delete_company(company_id).await?;
        info!(%company_id, owner = %caller, "company deleted");
        Ok(())
    }
}

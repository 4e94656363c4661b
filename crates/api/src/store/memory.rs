//! In-memory store for tests and local development.
//!
//! One mutex guards all three tables, which makes every trait method a
//! single atomic step and mirrors the row-level atomicity the Postgres
//! store gets from its constraints and single-statement writes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use oxgate_core::{CompanyId, Email, OtpCode, Role, Subdomain, UserId};

use super::{AuthStore, StoreError};
use crate::models::{Company, Membership, PendingOtp, User};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    companies: HashMap<CompanyId, Company>,
    memberships: Vec<Membership>,
}

/// Mutex-guarded in-memory [`AuthStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic mid-mutation; propagating the
        // panic is the only sound option for an in-memory test store.
        #[allow(clippy::unwrap_used)]
        self.tables.lock().unwrap()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn upsert_login_otp(
        &self,
        email: &Email,
        otp: PendingOtp,
    ) -> Result<User, StoreError> {
        let mut tables = self.lock();

        if let Some(user) = tables.users.values_mut().find(|u| &u.email == email) {
            user.pending_otp = Some(otp);
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::generate(),
            email: email.clone(),
            role: Role::Manager,
            pending_otp: Some(otp),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn consume_otp(
        &self,
        email: &Email,
        code: &OtpCode,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.lock();

        let Some(user) = tables.users.values_mut().find(|u| &u.email == email) else {
            return Ok(None);
        };

        let valid = user
            .pending_otp
            .as_ref()
            .is_some_and(|pending| &pending.code == code && now < pending.expires_at);

        if !valid {
            return Ok(None);
        }

        user.pending_otp = None;
        Ok(Some(user.clone()))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn set_user_role(&self, id: UserId, role: Role) -> Result<(), StoreError> {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.role = role;
        }
        Ok(())
    }

    async fn create_company(&self, company: &Company) -> Result<(), StoreError> {
        let mut tables = self.lock();

        if tables
            .companies
            .values()
            .any(|c| c.subdomain == company.subdomain)
        {
            return Err(StoreError::Conflict(format!(
                "subdomain {} already registered",
                company.subdomain
            )));
        }

        tables.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.lock().companies.get(&id).cloned())
    }

    async fn find_company_by_subdomain(
        &self,
        subdomain: &Subdomain,
    ) -> Result<Option<Company>, StoreError> {
        Ok(self
            .lock()
            .companies
            .values()
            .find(|c| &c.subdomain == subdomain)
            .cloned())
    }

    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        let mut tables = self.lock();

        if tables
            .memberships
            .iter()
            .any(|m| m.user_id == membership.user_id && m.company_id == membership.company_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already belongs to company {}",
                membership.user_id, membership.company_id
            )));
        }

        tables.memberships.push(membership.clone());
        Ok(())
    }

    async fn find_membership(
        &self,
        user_id: UserId,
        company_id: CompanyId,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.company_id == company_id)
            .cloned())
    }

    async fn memberships_for_user(&self, user_id: UserId) -> Result<Vec<Membership>, StoreError> {
        let mut rows: Vec<Membership> = self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.company_id));
        Ok(rows)
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.memberships.retain(|m| m.company_id != id);
        tables.companies.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn otp(code: &str, ttl_minutes: i64) -> PendingOtp {
        PendingOtp {
            code: OtpCode::parse(code).unwrap(),
            expires_at: Utc::now() + Duration::minutes(ttl_minutes),
        }
    }

    #[tokio::test]
    async fn upsert_creates_manager_then_keeps_role() {
        let store = MemoryStore::new();
        let addr = email("u@x.com");

        let user = store.upsert_login_otp(&addr, otp("111111", 10)).await.unwrap();
        assert_eq!(user.role, Role::Manager);

        store.set_user_role(user.id, Role::Admin).await.unwrap();
        let again = store.upsert_login_otp(&addr, otp("222222", 10)).await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.role, Role::Admin);
        assert_eq!(again.pending_otp.unwrap().code.as_str(), "222222");
    }

    #[tokio::test]
    async fn consume_is_single_use() {
        let store = MemoryStore::new();
        let addr = email("u@x.com");
        store.upsert_login_otp(&addr, otp("482913", 10)).await.unwrap();

        let code = OtpCode::parse("482913").unwrap();
        let first = store.consume_otp(&addr, &code, Utc::now()).await.unwrap();
        assert!(first.is_some());
        assert!(first.unwrap().pending_otp.is_none());

        let second = store.consume_otp(&addr, &code, Utc::now()).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn consume_rejects_expired_code_at_boundary() {
        let store = MemoryStore::new();
        let addr = email("u@x.com");
        let expires_at = Utc::now();
        store
            .upsert_login_otp(
                &addr,
                PendingOtp {
                    code: OtpCode::parse("482913").unwrap(),
                    expires_at,
                },
            )
            .await
            .unwrap();

        // Exactly at expiry is too late.
        let code = OtpCode::parse("482913").unwrap();
        let outcome = store.consume_otp(&addr, &code, expires_at).await.unwrap();
        assert!(outcome.is_none());

        // And the failed attempt did not clear the pending code.
        let user = store
            .consume_otp(&addr, &code, expires_at - Duration::seconds(1))
            .await
            .unwrap();
        assert!(user.is_some());
    }

    #[tokio::test]
    async fn consume_rejects_wrong_and_missing_codes() {
        let store = MemoryStore::new();
        let addr = email("u@x.com");
        let wrong = OtpCode::parse("000000").unwrap();

        // No such user.
        assert!(store.consume_otp(&addr, &wrong, Utc::now()).await.unwrap().is_none());

        store.upsert_login_otp(&addr, otp("482913", 10)).await.unwrap();
        assert!(store.consume_otp(&addr, &wrong, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_subdomain_conflicts() {
        let store = MemoryStore::new();
        let owner = UserId::generate();
        let company = Company {
            id: CompanyId::generate(),
            subdomain: Subdomain::parse("acme").unwrap(),
            credential: "Bearer t".to_owned().into(),
            owner_id: owner,
            created_at: Utc::now(),
        };
        store.create_company(&company).await.unwrap();

        let rival = Company {
            id: CompanyId::generate(),
            subdomain: Subdomain::parse("acme").unwrap(),
            credential: "Bearer other".to_owned().into(),
            owner_id: UserId::generate(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            store.create_company(&rival).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_company_removes_memberships_too() {
        let store = MemoryStore::new();
        let owner = UserId::generate();
        let company = Company {
            id: CompanyId::generate(),
            subdomain: Subdomain::parse("acme").unwrap(),
            credential: "Bearer t".to_owned().into(),
            owner_id: owner,
            created_at: Utc::now(),
        };
        store.create_company(&company).await.unwrap();
        store
            .create_membership(&Membership {
                user_id: owner,
                company_id: company.id,
                role: Role::Admin,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        store.delete_company(company.id).await.unwrap();
        assert!(store.find_company(company.id).await.unwrap().is_none());
        assert!(store.memberships_for_user(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memberships_are_ordered_by_creation() {
        let store = MemoryStore::new();
        let user = UserId::generate();
        let base = Utc::now();

        let mut ids = Vec::new();
        for i in 0..3 {
            let company = Company {
                id: CompanyId::generate(),
                subdomain: Subdomain::parse(&format!("tenant-{i}")).unwrap(),
                credential: "Bearer t".to_owned().into(),
                owner_id: user,
                created_at: base,
            };
            store.create_company(&company).await.unwrap();
            // Insert newest-first to prove ordering comes from timestamps,
            // not insertion order.
            store
                .create_membership(&Membership {
                    user_id: user,
                    company_id: company.id,
                    role: Role::Manager,
                    created_at: base - Duration::minutes(i),
                })
                .await
                .unwrap();
            ids.push(company.id);
        }

        let rows = store.memberships_for_user(user).await.unwrap();
        let companies: Vec<CompanyId> = rows.iter().map(|m| m.company_id).collect();
        assert_eq!(companies, vec![ids[2], ids[1], ids[0]]);
    }
}

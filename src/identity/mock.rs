//! In-memory mock implementation of IdentityProvider for testing.
//!
//! Records every role push and invitation so tests can assert on the
//! calls made to the provider. Conditionally compiled with `#[cfg(test)]`.

use super::models::{IdentityAccount, Invitation};
use super::traits::IdentityProvider;
use crate::users::Role;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MockIdentityProvider {
    pub accounts: RwLock<HashMap<String, IdentityAccount>>,
    pub role_pushes: RwLock<Vec<(String, Role)>>,
    pub invitations: RwLock<Vec<(Invitation, Role)>>,
    pub fail_set_role: AtomicBool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account
    pub fn with_account(self, account: IdentityAccount) -> Self {
        self.accounts
            .try_write()
            .expect("fresh mock is uncontended")
            .insert(account.external_id.clone(), account);
        self
    }

    /// Make every `set_role` call fail
    pub fn failing_set_role(self) -> Self {
        self.fail_set_role.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn set_role(&self, external_id: &str, role: Role) -> Result<()> {
        if self.fail_set_role.load(Ordering::SeqCst) {
            bail!("Clerk metadata update failed (503 Service Unavailable): upstream down");
        }
        self.role_pushes
            .write()
            .await
            .push((external_id.to_string(), role));
        if let Some(account) = self.accounts.write().await.get_mut(external_id) {
            account.role = Some(role);
        }
        Ok(())
    }

    async fn get_user(&self, external_id: &str) -> Result<Option<IdentityAccount>> {
        Ok(self.accounts.read().await.get(external_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityAccount>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_invitation(
        &self,
        email: &str,
        role: Role,
        _redirect_url: Option<&str>,
    ) -> Result<Invitation> {
        let mut invitations = self.invitations.write().await;
        let invitation = Invitation {
            id: format!("inv_{}", invitations.len() + 1),
            email_address: email.to_string(),
            status: "pending".to_string(),
        };
        invitations.push((invitation.clone(), role));
        Ok(invitation)
    }
}

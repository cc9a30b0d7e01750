//! IdentityProvider trait definition
//!
//! The hosted identity provider owns end-user accounts and the role claim
//! that session tokens carry. The local user store calls out through this
//! trait to keep that claim in step with the stored role.

use super::models::{IdentityAccount, Invitation};
use crate::users::Role;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Write `role` into the account's public metadata
    async fn set_role(&self, external_id: &str, role: Role) -> Result<()>;

    /// Fetch an account by its provider id
    async fn get_user(&self, external_id: &str) -> Result<Option<IdentityAccount>>;

    /// Find the account that owns `email`, if any
    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityAccount>>;

    /// Invite `email`; the role claim is applied when the invitation is accepted
    async fn create_invitation(
        &self,
        email: &str,
        role: Role,
        redirect_url: Option<&str>,
    ) -> Result<Invitation>;
}

//! User records and role mirroring
//!
//! A user record is created on the first sync for an identity provider id
//! and patched on later syncs. Role changes are committed locally first and
//! then pushed to the provider's public metadata, which is what session
//! tokens carry. A failed push leaves the local role in place.

use super::models::*;
use crate::error::{CmsError, CmsResult};
use crate::identity::{IdentityEvent, IdentityProvider};
use crate::store::{from_document, to_document, Collection, RecordStore};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const COLLECTION: Collection = Collection::Users;

/// Address promoted to admin on its first sync when none is configured
pub const DEFAULT_OWNER_EMAIL: &str = "owner@studio.dev";

#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn RecordStore>,
    identity: Option<Arc<dyn IdentityProvider>>,
    owner_email: String,
    invitation_redirect_url: Option<String>,
}

impl UserManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        identity: Option<Arc<dyn IdentityProvider>>,
        owner_email: impl Into<String>,
    ) -> Self {
        Self {
            store,
            identity,
            owner_email: normalize_email(&owner_email.into()),
            invitation_redirect_url: None,
        }
    }

    /// Where accepted invitations land
    pub fn with_invitation_redirect(mut self, url: Option<String>) -> Self {
        self.invitation_redirect_url = url;
        self
    }

    pub fn has_identity_provider(&self) -> bool {
        self.identity.is_some()
    }

    fn is_owner(&self, email: &str) -> bool {
        normalize_email(email) == self.owner_email
    }

    fn provider(&self) -> CmsResult<&Arc<dyn IdentityProvider>> {
        self.identity
            .as_ref()
            .ok_or_else(|| CmsError::validation("no identity provider is configured"))
    }

    async fn find_by_clerk_id(&self, clerk_id: &str) -> CmsResult<Option<User>> {
        match self.store.find_first(COLLECTION, "clerkId", clerk_id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Create or refresh the record for an identity provider account.
    ///
    /// First sync: the owner address always becomes admin; anyone else gets
    /// the supplied role, or viewer. Later syncs overwrite email, name and
    /// image, and overwrite the role only when one is supplied.
    pub async fn sync_user(&self, input: SyncUser) -> CmsResult<User> {
        if input.clerk_id.trim().is_empty() {
            return Err(CmsError::validation("clerkId is required"));
        }
        validate_email(&input.email)?;

        match self.find_by_clerk_id(&input.clerk_id).await? {
            None => {
                let role = if self.is_owner(&input.email) {
                    if input.role.is_some_and(|r| r != Role::Admin) {
                        tracing::info!(
                            "Ignoring requested role for owner account {}",
                            input.clerk_id
                        );
                    }
                    Role::Admin
                } else {
                    input.role.unwrap_or_default()
                };
                let user = User {
                    id: Uuid::new_v4(),
                    clerk_id: input.clerk_id,
                    email: input.email,
                    name: input.name,
                    image_url: input.image_url,
                    role,
                    created_at: Utc::now(),
                };
                self.store
                    .insert(COLLECTION, user.id, to_document(&user)?)
                    .await?;
                tracing::info!("Created user {} ({}) as {}", user.id, user.clerk_id, user.role);
                Ok(user)
            }
            Some(existing) => {
                let mut fields = to_document(&json!({
                    "email": input.email,
                    "name": input.name,
                    "imageUrl": input.image_url,
                }))?;
                if let Some(role) = input.role {
                    fields.insert("role".to_string(), Value::String(role.as_str().to_string()));
                }
                if !self.store.patch(COLLECTION, existing.id, fields).await? {
                    return Err(CmsError::not_found(COLLECTION, existing.id));
                }
                tracing::debug!("Resynced user {} ({})", existing.id, existing.clerk_id);
                self.get(existing.id).await
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> CmsResult<User> {
        let doc = self
            .store
            .get(COLLECTION, id)
            .await?
            .ok_or_else(|| CmsError::not_found(COLLECTION, id))?;
        Ok(from_document(doc)?)
    }

    pub async fn get_by_clerk_id(&self, clerk_id: &str) -> CmsResult<User> {
        self.find_by_clerk_id(clerk_id)
            .await?
            .ok_or_else(|| CmsError::not_found(COLLECTION, clerk_id))
    }

    /// Every user, in creation order
    pub async fn list(&self) -> CmsResult<Vec<User>> {
        self.store
            .list_by_order(COLLECTION)
            .await?
            .into_iter()
            .map(|doc| Ok(from_document(doc)?))
            .collect()
    }

    /// Save a new role, then push it to the identity provider.
    ///
    /// Returns `CmsError::Mirror` when the push fails; the local role has
    /// already been saved at that point.
    pub async fn update_role(&self, id: Uuid, role: Role) -> CmsResult<RoleChange> {
        let fields = to_document(&json!({ "role": role }))?;
        if !self.store.patch(COLLECTION, id, fields).await? {
            return Err(CmsError::not_found(COLLECTION, id));
        }
        let user = self.get(id).await?;
        tracing::info!("Changed role of user {} to {}", id, role);

        let mirrored = self.mirror_role(&user).await?;
        Ok(RoleChange { user, mirrored })
    }

    async fn mirror_role(&self, user: &User) -> CmsResult<bool> {
        let Some(provider) = self.identity.as_ref() else {
            tracing::debug!("No identity provider configured, role of {} not mirrored", user.id);
            return Ok(false);
        };
        match provider.set_role(&user.clerk_id, user.role).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(
                    "Role of user {} saved locally but not mirrored: {:#}",
                    user.id,
                    e
                );
                Err(CmsError::Mirror {
                    user_id: user.id,
                    source: e,
                })
            }
        }
    }

    /// Delete the local record. The provider account is left untouched.
    pub async fn remove(&self, id: Uuid) -> CmsResult<()> {
        if !self.store.delete(COLLECTION, id).await? {
            return Err(CmsError::not_found(COLLECTION, id));
        }
        tracing::info!("Removed user {}", id);
        Ok(())
    }

    /// Grant `role` to an email address.
    ///
    /// An address the provider already knows gets the role claim directly
    /// (and the local record too, if one exists); an unknown address gets an
    /// invitation carrying the claim.
    pub async fn invite(&self, email: &str, role: Role) -> CmsResult<InviteOutcome> {
        validate_email(email)?;
        let provider = self.provider()?;

        let existing = provider
            .find_user_by_email(email)
            .await
            .map_err(CmsError::identity)?;

        match existing {
            Some(account) => {
                provider
                    .set_role(&account.external_id, role)
                    .await
                    .map_err(CmsError::identity)?;
                let user = match self.find_by_clerk_id(&account.external_id).await? {
                    Some(user) => {
                        let fields = to_document(&json!({ "role": role }))?;
                        if !self.store.patch(COLLECTION, user.id, fields).await? {
                            return Err(CmsError::not_found(COLLECTION, user.id));
                        }
                        Some(self.get(user.id).await?)
                    }
                    None => None,
                };
                tracing::info!("Granted {} to existing account {}", role, account.external_id);
                Ok(InviteOutcome::ExistingAccount {
                    clerk_id: account.external_id,
                    user,
                })
            }
            None => {
                let invitation = provider
                    .create_invitation(email, role, self.invitation_redirect_url.as_deref())
                    .await
                    .map_err(CmsError::identity)?;
                Ok(InviteOutcome::Invited {
                    invitation_id: invitation.id,
                })
            }
        }
    }

    /// Refresh a user's profile from the provider and re-push the local role
    /// if the provider's claim has drifted.
    pub async fn resync_from_provider(&self, id: Uuid) -> CmsResult<User> {
        let user = self.get(id).await?;
        let provider = self.provider()?;

        let account = provider
            .get_user(&user.clerk_id)
            .await
            .map_err(CmsError::identity)?
            .ok_or_else(|| {
                CmsError::identity(anyhow::anyhow!(
                    "account {} no longer exists at the identity provider",
                    user.clerk_id
                ))
            })?;

        let claim = account.role;
        let refreshed = self
            .sync_user(SyncUser {
                clerk_id: account.external_id,
                email: account.email,
                name: account.name,
                image_url: account.image_url,
                role: None,
            })
            .await?;

        self.reconcile_claim(&refreshed, claim).await?;
        Ok(refreshed)
    }

    /// Sync an account whose role claim comes from the provider or a session.
    ///
    /// The claim seeds the role of a new record only; a known record keeps
    /// its stored role. Afterwards the stored role is pushed back if the claim
    /// disagrees. A failed push is tolerated and reported as not mirrored.
    pub async fn sync_with_claim(
        &self,
        input: SyncUser,
        claim: Option<Role>,
    ) -> CmsResult<(User, bool)> {
        let known = self.find_by_clerk_id(&input.clerk_id).await?.is_some();
        let synced = self
            .sync_user(SyncUser {
                role: if known { None } else { claim },
                ..input
            })
            .await?;

        let mirrored = match self.reconcile_claim(&synced, claim).await {
            Ok(pushed) => pushed,
            // already logged by mirror_role
            Err(CmsError::Mirror { .. }) => false,
            Err(e) => return Err(e),
        };
        Ok((synced, mirrored))
    }

    /// Re-push the stored role when the provider's claim differs from it.
    ///
    /// Returns whether a push happened. The local role always wins.
    pub async fn reconcile_claim(&self, user: &User, claim: Option<Role>) -> CmsResult<bool> {
        if claim == Some(user.role) {
            return Ok(false);
        }
        tracing::info!(
            "Role claim of {} is {:?}, mirroring stored role {}",
            user.clerk_id,
            claim,
            user.role
        );
        self.mirror_role(user).await
    }

    /// Apply a verified identity provider webhook event
    pub async fn apply_identity_event(&self, event: IdentityEvent) -> CmsResult<()> {
        match event {
            IdentityEvent::UserUpserted(account) => {
                if account.email.is_empty() {
                    tracing::warn!(
                        "Skipping identity event for {}: account has no email",
                        account.external_id
                    );
                    return Ok(());
                }
                let claim = account.role;
                self.sync_with_claim(
                    SyncUser {
                        clerk_id: account.external_id,
                        email: account.email,
                        name: account.name,
                        image_url: account.image_url,
                        role: None,
                    },
                    claim,
                )
                .await?;
            }
            IdentityEvent::UserDeleted { external_id } => {
                match self.find_by_clerk_id(&external_id).await? {
                    Some(user) => self.remove(user.id).await?,
                    None => tracing::debug!("No local user for deleted account {}", external_id),
                }
            }
            IdentityEvent::Ignored { event_type } => {
                tracing::debug!("Ignoring identity event {}", event_type);
            }
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> CmsResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CmsError::validation(format!(
            "'{}' is not an email address",
            email
        ))),
    }
}

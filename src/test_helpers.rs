//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating test objects with sensible defaults,
//! and helpers for building mock server state over the in-memory store.
#![allow(dead_code)]

use crate::api::handlers::{CmsState, ServerState};
use crate::auth::jwt::encode_jwt;
use crate::company::{CompanySettings, Stat};
use crate::content::{FaqFields, ProjectFields};
use crate::identity::IdentityAccount;
use crate::store::{MemoryRecordStore, RecordStore};
use crate::users::{Role, SyncUser, UserManager, DEFAULT_OWNER_EMAIL};
use crate::AuthConfig;
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-unit-tests-only!";

/// Auth config accepting tokens signed with [`TEST_JWT_SECRET`], any domain
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        allowed_email_domain: None,
    }
}

/// Server state over an empty in-memory store, no identity provider and no
/// webhook secret
pub fn mock_server_state(auth_config: Option<AuthConfig>) -> CmsState {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    Arc::new(ServerState {
        store: store.clone(),
        company: CompanySettings::new(store.clone()),
        users: UserManager::new(store, None, DEFAULT_OWNER_EMAIL),
        webhook_verifier: None,
        auth_config,
    })
}

/// A bearer token valid for one hour against [`test_auth_config`]
pub fn test_bearer_token(clerk_id: &str, email: &str, role: Option<Role>) -> String {
    encode_jwt(clerk_id, email, "Test User", role, TEST_JWT_SECRET, 3600).unwrap()
}

// ============================================================================
// Entity factories
// ============================================================================

pub fn test_faq(question: &str, answer: &str) -> FaqFields {
    FaqFields {
        question: question.to_string(),
        answer: answer.to_string(),
    }
}

/// A valid, unpublished project; the slug is left for normalisation
pub fn test_project_named(title: &str) -> ProjectFields {
    ProjectFields {
        title: title.to_string(),
        category: "Branding".to_string(),
        summary: format!("{} case study", title),
        ..Default::default()
    }
}

/// A full set of headline stats
pub fn test_stats() -> Vec<Stat> {
    [
        (120.0, "Projects shipped", "+"),
        (40.0, "Clients", ""),
        (8.0, "Years", ""),
        (98.0, "Retention", "%"),
    ]
    .into_iter()
    .map(|(value, label, suffix)| Stat {
        value,
        label: label.to_string(),
        suffix: suffix.to_string(),
    })
    .collect()
}

pub fn test_account(external_id: &str, email: &str, role: Option<Role>) -> IdentityAccount {
    IdentityAccount {
        external_id: external_id.to_string(),
        email: email.to_string(),
        name: "Test Account".to_string(),
        image_url: None,
        role,
    }
}

pub fn test_sync_user(clerk_id: &str, email: &str, role: Option<Role>) -> SyncUser {
    SyncUser {
        clerk_id: clerk_id.to_string(),
        email: email.to_string(),
        name: "Test User".to_string(),
        image_url: None,
        role,
    }
}

//! Identity provider account and event models

use crate::users::Role;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An account as seen by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAccount {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Role claim from public metadata; `None` when absent or unrecognised
    pub role: Option<Role>,
}

/// A pending invitation created at the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub email_address: String,
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Clerk wire format
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ClerkEmailAddress {
    pub id: String,
    pub email_address: String,
}

/// User object returned by the Clerk Backend API and carried in webhooks
#[derive(Debug, Deserialize)]
pub(crate) struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub public_metadata: Value,
}

impl ClerkUser {
    fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|e| Some(e.id.as_str()) == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }

    fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone().unwrap_or_default()
        } else {
            full
        }
    }

    fn role_claim(&self) -> Option<Role> {
        let raw = self.public_metadata.get("role")?.as_str()?;
        match raw.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!("Ignoring role claim on {}: {}", self.id, e);
                None
            }
        }
    }
}

impl From<ClerkUser> for IdentityAccount {
    fn from(user: ClerkUser) -> Self {
        Self {
            email: user.primary_email().unwrap_or_default().to_string(),
            name: user.display_name(),
            role: user.role_claim(),
            image_url: user.image_url.clone().filter(|u| !u.is_empty()),
            external_id: user.id,
        }
    }
}

// ============================================================================
// Webhook events
// ============================================================================

/// A user lifecycle event delivered by the identity provider's webhooks
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    /// `user.created` or `user.updated`
    UserUpserted(IdentityAccount),
    /// `user.deleted`
    UserDeleted { external_id: String },
    /// Any other event type; acknowledged and dropped
    Ignored { event_type: String },
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct DeletedObject {
    id: String,
}

impl IdentityEvent {
    /// Parse a verified webhook payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let envelope: EventEnvelope =
            serde_json::from_slice(payload).context("Malformed identity event")?;

        match envelope.event_type.as_str() {
            "user.created" | "user.updated" => {
                let user: ClerkUser = serde_json::from_value(envelope.data)
                    .with_context(|| format!("Malformed {} payload", envelope.event_type))?;
                Ok(IdentityEvent::UserUpserted(user.into()))
            }
            "user.deleted" => {
                let deleted: DeletedObject = serde_json::from_value(envelope.data)
                    .context("Malformed user.deleted payload")?;
                Ok(IdentityEvent::UserDeleted {
                    external_id: deleted.id,
                })
            }
            _ => Ok(IdentityEvent::Ignored {
                event_type: envelope.event_type,
            }),
        }
    }
}

//! Identity provider integration: Clerk Backend API client and webhook verification

pub mod clerk;
pub mod models;
pub mod traits;
pub mod webhook;

pub use clerk::ClerkClient;
pub use models::*;
pub use traits::IdentityProvider;
pub use webhook::{WebhookError, WebhookVerifier};

#[cfg(test)]
pub(crate) mod mock;

//! Workspace users synced from the identity provider

pub mod manager;
pub mod models;

pub use manager::{UserManager, DEFAULT_OWNER_EMAIL};
pub use models::*;

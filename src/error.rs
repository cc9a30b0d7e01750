//! Domain errors for content, settings and user operations

use crate::store::Collection;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a data-access operation.
///
/// None of these are retried; the caller decides how to report them.
#[derive(Error, Debug)]
pub enum CmsError {
    /// Required field missing or malformed; rejected before any write
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation referenced an id absent from the store
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: String },

    /// The record store was unreachable or rejected the write
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),

    /// The role was committed locally but pushing it to the identity
    /// provider failed. The local change is not rolled back.
    #[error("role of user {user_id} saved locally but not mirrored to the identity provider: {source:#}")]
    Mirror {
        user_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    /// A call to the identity provider failed outside of role mirroring
    /// (invitations, account lookups)
    #[error("identity provider request failed: {0:#}")]
    Identity(#[source] anyhow::Error),
}

impl CmsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CmsError::Validation(msg.into())
    }

    pub fn identity(err: anyhow::Error) -> Self {
        CmsError::Identity(err)
    }

    pub fn not_found(collection: Collection, id: impl ToString) -> Self {
        CmsError::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

pub type CmsResult<T> = std::result::Result<T, CmsError>;

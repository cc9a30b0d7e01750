//! Authentication: session tokens issued by the identity provider
//!
//! Provides:
//! - JWT token encoding/decoding (`jwt` submodule)
//! - Bearer token middleware (`middleware` submodule)
//! - `AuthUser` extractor with role checks (`extractor` submodule)

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::AuthUser;
pub use middleware::require_auth;

//! HTTP API for the marketing site and its admin

pub mod company_handlers;
pub mod content_handlers;
pub mod handlers;
pub mod routes;
pub mod user_handlers;
pub mod webhook_handlers;

pub use routes::create_router;

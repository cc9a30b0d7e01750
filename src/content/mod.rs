//! Marketing site content: ordered collections and their access functions

pub mod collection;
pub mod models;
pub mod validate;

pub use collection::OrderedCollection;
pub use models::*;

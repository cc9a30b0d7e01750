//! Record store: collections, the storage trait and its backends

pub mod client;
pub mod memory;
pub mod models;
pub mod traits;

pub use client::Neo4jRecordStore;
pub use memory::MemoryRecordStore;
pub use models::*;
pub use traits::RecordStore;

//! RecordStore trait definition
//!
//! Abstract interface over the document store holding every collection.
//! Implemented by the Neo4j backend and by the in-memory backend used for
//! tests and local development.

use crate::store::models::{Collection, Document};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Abstract interface for all record store operations.
///
/// Every call is an independent single-document operation: there are no
/// multi-record transactions, and concurrent writers follow last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new document under `id`
    async fn insert(&self, collection: Collection, id: Uuid, doc: Document) -> Result<()>;

    /// Get a document by id
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>>;

    /// List a collection sorted ascending by `order`.
    ///
    /// Equal `order` values keep creation sequence.
    async fn list_by_order(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Find the first document whose lookup `field` equals `value`.
    ///
    /// Fails if `field` is not one of `collection.lookup_fields()`.
    async fn find_first(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>>;

    /// Shallow-merge `fields` into an existing document.
    ///
    /// Returns `false` without writing anything when `id` is absent.
    async fn patch(&self, collection: Collection, id: Uuid, fields: Document) -> Result<bool>;

    /// Delete a document. Returns `false` when `id` is absent.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool>;

    /// Number of documents in a collection
    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Check connectivity to the backing service
    async fn health_check(&self) -> Result<bool>;
}

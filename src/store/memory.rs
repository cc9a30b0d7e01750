//! In-memory implementation of RecordStore.
//!
//! Backs the test suite and `store.backend: memory` development runs.
//! Each collection is a `Vec` kept in insertion order, so a stable sort on
//! `order` reproduces the creation-sequence tiebreak of the graph backend.

use crate::store::models::{document_order, document_str, merge_document, Collection, Document};
use crate::store::traits::RecordStore;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, Document)>>>,
}

impl MemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document into the store.
    pub async fn with_document(self, collection: Collection, id: Uuid, doc: Document) -> Self {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push((id, doc));
        self
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, collection: Collection, id: Uuid, doc: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();
        if records.iter().any(|(existing, _)| *existing == id) {
            bail!("Duplicate id {} in {}", id, collection);
        }
        for field in collection.unique_fields() {
            let Some(value) = document_str(&doc, field) else {
                continue;
            };
            if records
                .iter()
                .any(|(_, existing)| document_str(existing, field) == Some(value))
            {
                bail!("Duplicate {} '{}' in {}", field, value, collection);
            }
        }
        records.push((id, doc));
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|records| {
            records
                .iter()
                .find(|(existing, _)| *existing == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn list_by_order(&self, collection: Collection) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|records| records.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default();
        docs.sort_by_key(document_order);
        Ok(docs)
    }

    async fn find_first(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>> {
        let field = collection.lookup_field(field)?;
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|records| {
            records
                .iter()
                .find(|(_, doc)| document_str(doc, field) == Some(value))
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn patch(&self, collection: Collection, id: Uuid, fields: Document) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match records.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, doc)) => {
                merge_document(doc, fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|(existing, _)| *existing != id);
        Ok(records.len() != before)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, Vec::len))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

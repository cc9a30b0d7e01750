//! Ordered collection CRUD
//!
//! Uniform list/get/create/update/remove/reorder over every content
//! collection. `order` is a display-sequencing integer: creation appends at
//! `max(order) + 1`, and `reorder` rewrites positions from an explicit id
//! sequence.

use super::models::{ContentFields, Project, ProjectFields, Record};
use crate::error::{CmsError, CmsResult};
use crate::store::{document_order, from_document, to_document, Document, RecordStore};
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Access functions for one ordered collection
pub struct OrderedCollection<F: ContentFields> {
    store: Arc<dyn RecordStore>,
    _fields: PhantomData<fn() -> F>,
}

impl<F: ContentFields> Clone for OrderedCollection<F> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<F: ContentFields> OrderedCollection<F> {
    /// Create access functions over the given store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _fields: PhantomData,
        }
    }

    fn decode(doc: Document) -> CmsResult<Record<F>> {
        Ok(from_document(doc)?)
    }

    /// List every record, ascending by `order`
    pub async fn list(&self) -> CmsResult<Vec<Record<F>>> {
        self.store
            .list_by_order(F::COLLECTION)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Get one record
    pub async fn get(&self, id: Uuid) -> CmsResult<Record<F>> {
        let doc = self
            .store
            .get(F::COLLECTION, id)
            .await?
            .ok_or_else(|| CmsError::not_found(F::COLLECTION, id))?;
        Self::decode(doc)
    }

    /// Validate and append a record after the current last one.
    ///
    /// The max-then-insert sequence is not atomic: two concurrent creates can
    /// receive the same `order`. Lists stay well defined through the
    /// creation-sequence tiebreak.
    pub async fn create(&self, mut fields: F) -> CmsResult<Record<F>> {
        fields.normalize();
        fields.validate()?;

        let max_order = self
            .store
            .list_by_order(F::COLLECTION)
            .await?
            .iter()
            .map(document_order)
            .max()
            .unwrap_or(0);

        let record = Record {
            id: Uuid::new_v4(),
            order: max_order + 1,
            created_at: Utc::now(),
            fields,
        };

        self.store
            .insert(F::COLLECTION, record.id, to_document(&record)?)
            .await?;

        tracing::info!(
            "Created {} record {} at order {}",
            F::COLLECTION,
            record.id,
            record.order
        );
        Ok(record)
    }

    /// Write only the fields present in `patch`
    pub async fn update(&self, id: Uuid, patch: F::Patch) -> CmsResult<Record<F>> {
        F::validate_patch(&patch)?;
        let fields = to_document(&patch)?;
        let written: Vec<String> = fields.keys().cloned().collect();

        if !self.store.patch(F::COLLECTION, id, fields).await? {
            return Err(CmsError::not_found(F::COLLECTION, id));
        }

        tracing::info!(
            "Updated {} record {} ({})",
            F::COLLECTION,
            id,
            written.join(", ")
        );
        self.get(id).await
    }

    /// Delete a record outright
    pub async fn remove(&self, id: Uuid) -> CmsResult<()> {
        if !self.store.delete(F::COLLECTION, id).await? {
            return Err(CmsError::not_found(F::COLLECTION, id));
        }
        tracing::info!("Removed {} record {}", F::COLLECTION, id);
        Ok(())
    }

    /// Give each id its 1-based position in `ids`.
    ///
    /// The sequence need not cover the whole collection. Every id is checked
    /// before the first write; the writes themselves are independent.
    pub async fn reorder(&self, ids: &[Uuid]) -> CmsResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(CmsError::validation(format!(
                    "id {} appears more than once in the reorder sequence",
                    id
                )));
            }
        }

        for id in ids {
            if self.store.get(F::COLLECTION, *id).await?.is_none() {
                return Err(CmsError::not_found(F::COLLECTION, id));
            }
        }

        for (position, id) in ids.iter().enumerate() {
            let fields = to_document(&json!({ "order": position as i64 + 1 }))?;
            if !self.store.patch(F::COLLECTION, *id, fields).await? {
                return Err(CmsError::not_found(F::COLLECTION, id));
            }
        }

        tracing::info!("Reordered {} {} records", ids.len(), F::COLLECTION);
        Ok(())
    }
}

// ============================================================================
// Project-specific queries
// ============================================================================

impl OrderedCollection<ProjectFields> {
    /// Published case studies for the public site
    pub async fn list_published(&self) -> CmsResult<Vec<Project>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.fields.is_published)
            .collect())
    }

    /// Any project by slug, published or not
    pub async fn get_by_slug(&self, slug: &str) -> CmsResult<Option<Project>> {
        self.store
            .find_first(ProjectFields::COLLECTION, "slug", slug)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// A published project by slug; drafts read as absent
    pub async fn get_published_by_slug(&self, slug: &str) -> CmsResult<Option<Project>> {
        Ok(self
            .get_by_slug(slug)
            .await?
            .filter(|p| p.fields.is_published))
    }
}

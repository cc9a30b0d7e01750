//! Singleton company settings
//!
//! The `companyInfo` collection holds exactly one document. `update` is a
//! guarded upsert: patch the existing document, or insert one built from
//! defaults when none exists yet.

use super::models::*;
use crate::error::{CmsError, CmsResult};
use crate::store::{
    from_document, merge_document, to_document, Collection, Document, RecordStore,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

const COLLECTION: Collection = Collection::CompanyInfo;

/// Access functions for the company settings document
#[derive(Clone)]
pub struct CompanySettings {
    store: Arc<dyn RecordStore>,
}

impl CompanySettings {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The earliest settings document, if one has been created
    async fn current_document(&self) -> CmsResult<Option<Document>> {
        Ok(self.store.list_by_order(COLLECTION).await?.into_iter().next())
    }

    /// Read the settings; `None` until the first update
    pub async fn get(&self) -> CmsResult<Option<CompanyInfo>> {
        match self.current_document().await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Patch the settings, creating them with defaults on first use
    pub async fn update(&self, patch: CompanyInfoPatch) -> CmsResult<CompanyInfo> {
        validate_patch(&patch)?;
        let now = Utc::now();
        let mut fields = to_document(&patch)?;
        fields.insert("updatedAt".to_string(), Value::String(now.to_rfc3339()));

        match self.current_document().await? {
            Some(existing) => {
                let id = existing_id(&existing)?;
                if !self.store.patch(COLLECTION, id, fields).await? {
                    return Err(CmsError::not_found(COLLECTION, id));
                }
                tracing::info!("Updated company settings {}", id);
                let doc = self
                    .store
                    .get(COLLECTION, id)
                    .await?
                    .ok_or_else(|| CmsError::not_found(COLLECTION, id))?;
                Ok(from_document(doc)?)
            }
            None => {
                let id = Uuid::new_v4();
                let mut doc = to_document(&CompanyInfo::with_defaults(id, now))?;
                merge_document(&mut doc, fields);
                let info: CompanyInfo = from_document(doc.clone())?;
                self.store.insert(COLLECTION, id, doc).await?;
                tracing::info!("Created company settings {}", id);
                Ok(info)
            }
        }
    }
}

fn existing_id(doc: &Document) -> CmsResult<Uuid> {
    doc.get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CmsError::Storage(anyhow::anyhow!("company settings document has no valid id")))
}

fn validate_patch(patch: &CompanyInfoPatch) -> CmsResult<()> {
    if let Some(ref stats) = patch.stats {
        if stats.len() != STAT_COUNT {
            return Err(CmsError::validation(format!(
                "stats must contain exactly {} entries, got {}",
                STAT_COUNT,
                stats.len()
            )));
        }
        if stats.iter().any(|s| s.label.trim().is_empty()) {
            return Err(CmsError::validation("every stat needs a label"));
        }
    }
    if let Some(ref email) = patch.email {
        if !email.is_empty() && !email.contains('@') {
            return Err(CmsError::validation(format!(
                "'{}' is not an email address",
                email
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::test_helpers::test_stats;

    fn settings() -> (Arc<MemoryRecordStore>, CompanySettings) {
        let store = Arc::new(MemoryRecordStore::new());
        (store.clone(), CompanySettings::new(store))
    }

    #[tokio::test]
    async fn test_get_before_first_update_is_none() {
        let (_, settings) = settings();
        assert!(settings.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_update_creates_with_defaults() {
        let (store, settings) = settings();
        let info = settings
            .update(CompanyInfoPatch {
                name: Some("Northwind Studio".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(info.name, "Northwind Studio");
        assert_eq!(info.tagline, "");
        assert!(info.locations.is_empty());
        assert_eq!(info.founded_year, DEFAULT_FOUNDED_YEAR);
        assert!(info.stats.is_empty());
        assert_eq!(store.count(Collection::CompanyInfo).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_update_patches_same_document() {
        let (store, settings) = settings();
        let first = settings
            .update(CompanyInfoPatch {
                name: Some("Northwind Studio".into()),
                founded_year: Some(2019),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = settings
            .update(CompanyInfoPatch {
                tagline: Some("Design that moves".into()),
                stats: Some(test_stats()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Northwind Studio");
        assert_eq!(second.founded_year, 2019);
        assert_eq!(second.tagline, "Design that moves");
        assert_eq!(second.stats.len(), STAT_COUNT);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.count(Collection::CompanyInfo).await.unwrap(), 1);

        let read = settings.get().await.unwrap().unwrap();
        assert_eq!(read.id, first.id);
        assert_eq!(read.tagline, "Design that moves");
    }

    #[tokio::test]
    async fn test_stats_must_have_four_entries() {
        let (store, settings) = settings();
        let mut stats = test_stats();
        stats.pop();
        let err = settings
            .update(CompanyInfoPatch {
                stats: Some(stats),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
        assert_eq!(store.count(Collection::CompanyInfo).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let (_, settings) = settings();
        let err = settings
            .update(CompanyInfoPatch {
                email: Some("hello-at-studio".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
    }
}

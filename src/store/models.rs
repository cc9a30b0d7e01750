//! Collection catalogue and document helpers shared by every store backend

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A stored document: a JSON object with camelCase keys.
///
/// Every document carries `id` and `createdAt`, and documents of ordered
/// collections also carry `order`. The remaining keys are collection specific.
pub type Document = Map<String, Value>;

/// Key holding the record id inside a document
pub const ID_FIELD: &str = "id";
/// Key holding the display-sequencing integer inside a document
pub const ORDER_FIELD: &str = "order";

// ============================================================================
// Collections
// ============================================================================

/// The named collections held by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Projects,
    Services,
    Testimonials,
    Faqs,
    ProcessSteps,
    Features,
    TeamMembers,
    StudioValues,
    CompanyInfo,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Projects,
        Collection::Services,
        Collection::Testimonials,
        Collection::Faqs,
        Collection::ProcessSteps,
        Collection::Features,
        Collection::TeamMembers,
        Collection::StudioValues,
        Collection::CompanyInfo,
        Collection::Users,
    ];

    /// Collection name as used in documents and logs
    pub fn name(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Services => "services",
            Collection::Testimonials => "testimonials",
            Collection::Faqs => "faqs",
            Collection::ProcessSteps => "processSteps",
            Collection::Features => "features",
            Collection::TeamMembers => "teamMembers",
            Collection::StudioValues => "studioValues",
            Collection::CompanyInfo => "companyInfo",
            Collection::Users => "users",
        }
    }

    /// Node label in the graph backend
    pub fn label(self) -> &'static str {
        match self {
            Collection::Projects => "Project",
            Collection::Services => "Service",
            Collection::Testimonials => "Testimonial",
            Collection::Faqs => "Faq",
            Collection::ProcessSteps => "ProcessStep",
            Collection::Features => "Feature",
            Collection::TeamMembers => "TeamMember",
            Collection::StudioValues => "StudioValue",
            Collection::CompanyInfo => "CompanyInfo",
            Collection::Users => "User",
        }
    }

    /// URL path segment used by the HTTP API
    pub fn slug(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Services => "services",
            Collection::Testimonials => "testimonials",
            Collection::Faqs => "faqs",
            Collection::ProcessSteps => "process-steps",
            Collection::Features => "features",
            Collection::TeamMembers => "team-members",
            Collection::StudioValues => "studio-values",
            Collection::CompanyInfo => "company",
            Collection::Users => "users",
        }
    }

    /// Fields that can be used with `RecordStore::find_first`.
    ///
    /// The graph backend promotes these to indexed node properties.
    pub fn lookup_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Projects => &["slug"],
            Collection::Users => &["clerkId", "email"],
            _ => &[],
        }
    }

    /// Lookup fields holding at most one document per value
    pub fn unique_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["clerkId"],
            _ => &[],
        }
    }

    /// Whether list views of this collection are sequenced by `order`
    pub fn is_ordered(self) -> bool {
        !matches!(self, Collection::CompanyInfo | Collection::Users)
    }

    /// Validate that `field` is a declared lookup field and return its static name
    pub fn lookup_field(self, field: &str) -> Result<&'static str> {
        match self.lookup_fields().iter().find(|f| **f == field) {
            Some(f) => Ok(f),
            None => bail!("'{}' is not a lookup field of {}", field, self),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Document helpers
// ============================================================================

/// Read the `order` value of a document (absent or non-integer counts as 0)
pub fn document_order(doc: &Document) -> i64 {
    doc.get(ORDER_FIELD).and_then(Value::as_i64).unwrap_or(0)
}

/// Read a string field of a document
pub fn document_str<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

/// Serialize a value that must map to a JSON object
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value).context("Failed to serialize document")? {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {}", other),
    }
}

/// Deserialize a stored document into a typed record
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).context("Failed to deserialize document")
}

/// Shallow-merge `fields` into `doc` (later keys win)
pub fn merge_document(doc: &mut Document, fields: Document) {
    for (key, value) in fields {
        doc.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_serde_uses_collection_names() {
        for collection in Collection::ALL {
            let json = serde_json::to_value(collection).unwrap();
            assert_eq!(json, Value::String(collection.name().to_string()));
        }
    }

    #[test]
    fn test_lookup_field_rejects_undeclared_fields() {
        assert_eq!(Collection::Users.lookup_field("clerkId").unwrap(), "clerkId");
        assert!(Collection::Faqs.lookup_field("question").is_err());
        assert!(Collection::Projects.lookup_field("title").is_err());
    }

    #[test]
    fn test_document_order_defaults_to_zero() {
        let doc = to_document(&json!({"id": "x"})).unwrap();
        assert_eq!(document_order(&doc), 0);

        let doc = to_document(&json!({"order": 7})).unwrap();
        assert_eq!(document_order(&doc), 7);
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(to_document(&json!([1, 2, 3])).is_err());
        assert!(to_document(&"plain").is_err());
    }

    #[test]
    fn test_merge_document_overwrites_only_given_keys() {
        let mut doc = to_document(&json!({"a": 1, "b": "keep"})).unwrap();
        merge_document(&mut doc, to_document(&json!({"a": 2})).unwrap());
        assert_eq!(doc["a"], json!(2));
        assert_eq!(doc["b"], json!("keep"));
    }
}

//! Content records shown on the marketing site

use super::validate::{
    patch_non_empty, require_non_empty, slugify, validate_rating, validate_slug,
};
use crate::error::CmsResult;
use crate::store::Collection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Patch field reader: an absent key stays `None` (leave as is) while an
/// explicit `null` becomes `Some(None)` (clear the stored value).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Generic record
// ============================================================================

/// The collection-specific payload of an ordered content record.
///
/// The value itself is the create input; `Patch` is the partial update input
/// where every field is optional and omitted fields are left untouched.
pub trait ContentFields:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    const COLLECTION: Collection;

    type Patch: Serialize + DeserializeOwned + Default + Send + Sync + 'static;

    /// Fill derivable fields before validation (e.g. a slug from the title)
    fn normalize(&mut self) {}

    /// Check required fields of a create input
    fn validate(&self) -> CmsResult<()>;

    /// Check the provided fields of a patch
    fn validate_patch(patch: &Self::Patch) -> CmsResult<()>;
}

/// A stored content record: identity, display position and payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<F> {
    pub id: Uuid,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: F,
}

pub type Project = Record<ProjectFields>;
pub type Service = Record<ServiceFields>;
pub type Testimonial = Record<TestimonialFields>;
pub type Faq = Record<FaqFields>;
pub type ProcessStep = Record<ProcessStepFields>;
pub type Feature = Record<FeatureFields>;
pub type TeamMember = Record<TeamMemberFields>;
pub type StudioValue = Record<StudioValueFields>;

// ============================================================================
// Projects (case studies)
// ============================================================================

/// A case study
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    #[serde(default)]
    pub title: String,
    /// URL-safe identifier; unique by convention only
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub live_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl ContentFields for ProjectFields {
    const COLLECTION: Collection = Collection::Projects;
    type Patch = ProjectPatch;

    fn normalize(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
    }

    fn validate(&self) -> CmsResult<()> {
        require_non_empty("title", &self.title)?;
        validate_slug(&self.slug)?;
        require_non_empty("category", &self.category)?;
        require_non_empty("summary", &self.summary)
    }

    fn validate_patch(patch: &ProjectPatch) -> CmsResult<()> {
        patch_non_empty("title", patch.title.as_ref())?;
        if let Some(ref slug) = patch.slug {
            validate_slug(slug)?;
        }
        patch_non_empty("category", patch.category.as_ref())?;
        patch_non_empty("summary", patch.summary.as_ref())
    }
}

// ============================================================================
// Services
// ============================================================================

/// A service the studio offers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<Vec<String>>,
}

impl ContentFields for ServiceFields {
    const COLLECTION: Collection = Collection::Services;
    type Patch = ServicePatch;

    fn validate(&self) -> CmsResult<()> {
        require_non_empty("title", &self.title)?;
        require_non_empty("description", &self.description)
    }

    fn validate_patch(patch: &ServicePatch) -> CmsResult<()> {
        patch_non_empty("title", patch.title.as_ref())?;
        patch_non_empty("description", patch.description.as_ref())
    }
}

// ============================================================================
// Testimonials
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialFields {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub author: String,
    /// The author's job title
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<u8>>,
}

impl ContentFields for TestimonialFields {
    const COLLECTION: Collection = Collection::Testimonials;
    type Patch = TestimonialPatch;

    fn validate(&self) -> CmsResult<()> {
        require_non_empty("quote", &self.quote)?;
        require_non_empty("author", &self.author)?;
        validate_rating(self.rating)
    }

    fn validate_patch(patch: &TestimonialPatch) -> CmsResult<()> {
        patch_non_empty("quote", patch.quote.as_ref())?;
        patch_non_empty("author", patch.author.as_ref())?;
        validate_rating(patch.rating.flatten())
    }
}

// ============================================================================
// FAQs
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqFields {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ContentFields for FaqFields {
    const COLLECTION: Collection = Collection::Faqs;
    type Patch = FaqPatch;

    fn validate(&self) -> CmsResult<()> {
        require_non_empty("question", &self.question)?;
        require_non_empty("answer", &self.answer)
    }

    fn validate_patch(patch: &FaqPatch) -> CmsResult<()> {
        patch_non_empty("question", patch.question.as_ref())?;
        patch_non_empty("answer", patch.answer.as_ref())
    }
}

// ============================================================================
// Title/description/icon collections
// ============================================================================

/// One step of the studio's working process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStepFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A selling point shown on the landing page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A value on the studio page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioValueFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Shared patch shape of process steps, features and studio values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitledPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Option<String>>,
}

fn validate_titled(title: &str, description: &str) -> CmsResult<()> {
    require_non_empty("title", title)?;
    require_non_empty("description", description)
}

fn validate_titled_patch(patch: &TitledPatch) -> CmsResult<()> {
    patch_non_empty("title", patch.title.as_ref())?;
    patch_non_empty("description", patch.description.as_ref())
}

impl ContentFields for ProcessStepFields {
    const COLLECTION: Collection = Collection::ProcessSteps;
    type Patch = TitledPatch;

    fn validate(&self) -> CmsResult<()> {
        validate_titled(&self.title, &self.description)
    }

    fn validate_patch(patch: &TitledPatch) -> CmsResult<()> {
        validate_titled_patch(patch)
    }
}

impl ContentFields for FeatureFields {
    const COLLECTION: Collection = Collection::Features;
    type Patch = TitledPatch;

    fn validate(&self) -> CmsResult<()> {
        validate_titled(&self.title, &self.description)
    }

    fn validate_patch(patch: &TitledPatch) -> CmsResult<()> {
        validate_titled_patch(patch)
    }
}

impl ContentFields for StudioValueFields {
    const COLLECTION: Collection = Collection::StudioValues;
    type Patch = TitledPatch;

    fn validate(&self) -> CmsResult<()> {
        validate_titled(&self.title, &self.description)
    }

    fn validate_patch(patch: &TitledPatch) -> CmsResult<()> {
        validate_titled_patch(patch)
    }
}

// ============================================================================
// Team members
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberFields {
    #[serde(default)]
    pub name: String,
    /// Job title shown under the portrait
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub linkedin_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_url: Option<Option<String>>,
}

impl ContentFields for TeamMemberFields {
    const COLLECTION: Collection = Collection::TeamMembers;
    type Patch = TeamMemberPatch;

    fn validate(&self) -> CmsResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("role", &self.role)
    }

    fn validate_patch(patch: &TeamMemberPatch) -> CmsResult<()> {
        patch_non_empty("name", patch.name.as_ref())?;
        patch_non_empty("role", patch.role.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_document;

    #[test]
    fn test_record_flattens_fields() {
        let record = Faq {
            id: Uuid::nil(),
            order: 3,
            created_at: Utc::now(),
            fields: FaqFields {
                question: "Q".into(),
                answer: "A".into(),
            },
        };
        let doc = to_document(&record).unwrap();
        assert_eq!(doc["order"], 3);
        assert_eq!(doc["question"], "Q");
        assert!(doc.contains_key("createdAt"));
        assert!(!doc.contains_key("fields"));
    }

    #[test]
    fn test_patch_serializes_only_provided_fields() {
        let patch = ProjectPatch {
            is_published: Some(true),
            ..Default::default()
        };
        let doc = to_document(&patch).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["isPublished"], true);
    }

    #[test]
    fn test_missing_required_field_is_validation_error() {
        let fields: FaqFields = serde_json::from_str(r#"{"question":"Q"}"#).unwrap();
        let err = fields.validate().unwrap_err();
        assert!(err.to_string().contains("answer is required"));
    }

    #[test]
    fn test_project_slug_derived_from_title() {
        let mut fields = ProjectFields {
            title: "Brand Refresh 2024".into(),
            category: "Branding".into(),
            summary: "A refresh".into(),
            ..Default::default()
        };
        fields.normalize();
        assert_eq!(fields.slug, "brand-refresh-2024");
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn test_project_patch_rejects_malformed_slug() {
        let patch = ProjectPatch {
            slug: Some("Not A Slug".into()),
            ..Default::default()
        };
        assert!(ProjectFields::validate_patch(&patch).is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ProjectPatch =
            serde_json::from_str(r#"{"coverImageUrl": null, "year": 2021}"#).unwrap();
        assert_eq!(patch.cover_image_url, Some(None));
        assert_eq!(patch.year, Some(Some(2021)));
        assert_eq!(patch.live_url, None);

        let written = serde_json::to_value(&patch).unwrap();
        assert!(written["coverImageUrl"].is_null());
        assert!(written.get("liveUrl").is_none());
    }

    #[test]
    fn test_patch_rating_bounds() {
        let patch: TestimonialPatch = serde_json::from_str(r#"{"rating": 7}"#).unwrap();
        assert!(TestimonialFields::validate_patch(&patch).is_err());
        let cleared: TestimonialPatch = serde_json::from_str(r#"{"rating": null}"#).unwrap();
        assert!(TestimonialFields::validate_patch(&cleared).is_ok());
    }

    #[test]
    fn test_testimonial_rating_bounds() {
        let fields = TestimonialFields {
            quote: "Great".into(),
            author: "Ada".into(),
            rating: Some(9),
            ..Default::default()
        };
        assert!(fields.validate().is_err());
    }
}

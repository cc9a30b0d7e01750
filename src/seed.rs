//! Content seeding from a YAML file
//!
//! Every entry goes through the normal access functions, so validation and
//! order assignment apply exactly as they do for admin edits.

use crate::company::{CompanyInfoPatch, CompanySettings};
use crate::content::{
    ContentFields, FaqFields, FeatureFields, OrderedCollection, ProcessStepFields, ProjectFields,
    ServiceFields, StudioValueFields, TeamMemberFields, TestimonialFields,
};
use crate::error::CmsResult;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Seed file layout; every section is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeedFile {
    pub company: Option<CompanyInfoPatch>,
    pub projects: Vec<ProjectFields>,
    pub services: Vec<ServiceFields>,
    pub testimonials: Vec<TestimonialFields>,
    pub faqs: Vec<FaqFields>,
    pub process_steps: Vec<ProcessStepFields>,
    pub features: Vec<FeatureFields>,
    pub team_members: Vec<TeamMemberFields>,
    pub studio_values: Vec<StudioValueFields>,
}

impl SeedFile {
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse seed file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }
}

/// What a seed run did, per collection
#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub company_updated: bool,
    pub created: BTreeMap<&'static str, usize>,
    /// Collections left alone because they already held records
    pub skipped: Vec<&'static str>,
}

impl SeedReport {
    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}

async fn seed_collection<F: ContentFields>(
    store: &Arc<dyn RecordStore>,
    items: Vec<F>,
    force: bool,
    report: &mut SeedReport,
) -> CmsResult<()> {
    if items.is_empty() {
        return Ok(());
    }
    let name = F::COLLECTION.name();
    if !force && store.count(F::COLLECTION).await? > 0 {
        tracing::info!("Skipping {}: collection already populated", name);
        report.skipped.push(name);
        return Ok(());
    }

    let collection = OrderedCollection::<F>::new(store.clone());
    let mut created = 0;
    for fields in items {
        collection.create(fields).await?;
        created += 1;
    }
    tracing::info!("Seeded {} {}", created, name);
    report.created.insert(name, created);
    Ok(())
}

/// Apply a seed file.
///
/// Collections that already hold records are skipped unless `force` is set,
/// in which case the seed entries are appended after the existing ones. The
/// first invalid entry aborts the run; entries before it stay written.
pub async fn apply_seed(
    store: Arc<dyn RecordStore>,
    seed: SeedFile,
    force: bool,
) -> CmsResult<SeedReport> {
    let mut report = SeedReport::default();

    if let Some(patch) = seed.company {
        CompanySettings::new(store.clone()).update(patch).await?;
        report.company_updated = true;
    }

    seed_collection(&store, seed.projects, force, &mut report).await?;
    seed_collection(&store, seed.services, force, &mut report).await?;
    seed_collection(&store, seed.testimonials, force, &mut report).await?;
    seed_collection(&store, seed.faqs, force, &mut report).await?;
    seed_collection(&store, seed.process_steps, force, &mut report).await?;
    seed_collection(&store, seed.features, force, &mut report).await?;
    seed_collection(&store, seed.team_members, force, &mut report).await?;
    seed_collection(&store, seed.studio_values, force, &mut report).await?;

    Ok(report)
}

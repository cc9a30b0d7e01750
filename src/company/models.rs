//! Company settings models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Founding year used when the settings document is first created without one
pub const DEFAULT_FOUNDED_YEAR: i32 = 2024;

/// Number of headline stats the site renders
pub const STAT_COUNT: usize = 4;

/// A headline figure such as "150+ projects shipped"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub value: f64,
    pub label: String,
    #[serde(default)]
    pub suffix: String,
}

/// The single company settings document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_founded_year")]
    pub founded_year: i32,
    #[serde(default)]
    pub stats: Vec<Stat>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_founded_year() -> i32 {
    DEFAULT_FOUNDED_YEAR
}

impl CompanyInfo {
    /// A fresh document holding only defaults
    pub fn with_defaults(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            tagline: String::new(),
            description: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            locations: Vec::new(),
            founded_year: DEFAULT_FOUNDED_YEAR,
            stats: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the company settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<Stat>>,
}

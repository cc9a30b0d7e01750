//! Input shape checks applied before any write

use crate::error::{CmsError, CmsResult};

/// A required string field must be present and non-blank
pub fn require_non_empty(field: &str, value: &str) -> CmsResult<()> {
    if value.trim().is_empty() {
        return Err(CmsError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// A patch may omit a required field but must not blank it
pub fn patch_non_empty(field: &str, value: Option<&String>) -> CmsResult<()> {
    match value {
        Some(v) => require_non_empty(field, v),
        None => Ok(()),
    }
}

/// Slugs are lowercase ASCII alphanumerics separated by single dashes
pub fn validate_slug(slug: &str) -> CmsResult<()> {
    require_non_empty("slug", slug)?;
    let well_formed = slug
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if !well_formed {
        return Err(CmsError::validation(format!(
            "slug '{}' must be lowercase letters, digits and single dashes",
            slug
        )));
    }
    Ok(())
}

/// Ratings are whole stars from 1 to 5
pub fn validate_rating(rating: Option<u8>) -> CmsResult<()> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(CmsError::validation(format!(
            "rating must be between 1 and 5, got {}",
            r
        ))),
        _ => Ok(()),
    }
}

/// Convert a title to a URL-safe slug
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

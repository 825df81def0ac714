//! The versioned payload of a revision: title, canonical path, and body.
//!
//! Also holds the validation rules and slug generation applied to content
//! before it becomes part of a revision.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum body length in characters.
pub const MAX_BODY_LEN: usize = 100_000;

/// Title, canonical path, and body carried by one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub body: String,
}

impl ContentUnit {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: None,
            body: body.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The explicit path, or the slug of the title when none was given.
    pub fn canonical_path(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => generate_slug(&self.title),
        }
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        match self.path {
            Some(ref path) => validate_path(path)?,
            None if generate_slug(&self.title).is_empty() => {
                return Err(CoreError::Validation(
                    "Title must contain a letter or digit when no path is given".into(),
                ));
            }
            None => {}
        }
        validate_body(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a page title.
///
/// Converts to lowercase, replaces spaces and special characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a page title (non-empty, at most [`MAX_TITLE_LEN`] chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a canonical path: `/`-separated segments of lowercase
/// alphanumerics and hyphens, with no empty segments.
pub fn validate_path(path: &str) -> Result<(), CoreError> {
    if path.is_empty() {
        return Err(CoreError::Validation("Path must not be empty".into()));
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(CoreError::Validation(format!(
                "Path '{path}' must not contain empty segments"
            )));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(CoreError::Validation(format!(
                "Path '{path}' must contain only lowercase alphanumeric characters, hyphens and '/'"
            )));
        }
    }
    Ok(())
}

/// Validate a page body (at most [`MAX_BODY_LEN`] chars).
pub fn validate_body(body: &str) -> Result<(), CoreError> {
    if body.chars().count() > MAX_BODY_LEN {
        return Err(CoreError::Validation(format!(
            "Body must be at most {MAX_BODY_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- generate_slug -------------------------------------------------------

    #[test]
    fn slug_basic_title() {
        assert_eq!(generate_slug("Getting Started"), "getting-started");
    }

    #[test]
    fn slug_special_characters() {
        assert_eq!(
            generate_slug("How to: Write Pages (v2)"),
            "how-to-write-pages-v2"
        );
    }

    #[test]
    fn slug_collapses_and_trims_hyphens() {
        assert_eq!(generate_slug("--foo---bar--"), "foo-bar");
    }

    // -- canonical_path ------------------------------------------------------

    #[test]
    fn canonical_path_prefers_explicit_path() {
        let content = ContentUnit::new("Home Page", "").with_path("docs/home");
        assert_eq!(content.canonical_path(), "docs/home");
        assert_eq!(ContentUnit::new("Home Page", "").canonical_path(), "home-page");
    }

    // -- validation ----------------------------------------------------------

    #[test]
    fn title_empty_rejected() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("My Page").is_ok());
    }

    #[test]
    fn title_too_long_rejected() {
        assert!(validate_title(&"a".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn path_rules() {
        assert!(validate_path("getting-started").is_ok());
        assert!(validate_path("guides/getting-started").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("/leading").is_err());
        assert!(validate_path("double//slash").is_err());
        assert!(validate_path("Upper-Case").is_err());
    }

    #[test]
    fn body_too_long_rejected() {
        assert!(validate_body("Hello world").is_ok());
        assert!(validate_body(&"x".repeat(MAX_BODY_LEN + 1)).is_err());
    }

    #[test]
    fn validate_checks_optional_path() {
        assert!(ContentUnit::new("Title", "").validate().is_ok());
        assert!(ContentUnit::new("Title", "")
            .with_path("Bad Path")
            .validate()
            .is_err());
    }

    #[test]
    fn title_without_slug_needs_explicit_path() {
        assert!(ContentUnit::new("???", "").validate().is_err());
        assert!(ContentUnit::new("???", "")
            .with_path("faq")
            .validate()
            .is_ok());
    }

    #[test]
    fn missing_path_is_omitted_when_serialized() {
        let json = serde_json::to_value(ContentUnit::new("T", "b")).unwrap();
        assert!(json.get("path").is_none());
        assert_eq!(json["title"], "T");
    }
}

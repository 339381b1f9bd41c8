//! Tag-name normalization.
//!
//! A tag's identity is its normalized name: surrounding whitespace trimmed and
//! lower-cased. The store only ever sees normalized names, so the unique index
//! on `tag.name` enforces case-insensitive uniqueness.

use crate::defaults::TAG_NAME_MAX_LEN;
use crate::{Error, Result};

/// Normalize a single tag name. Returns `None` when nothing is left.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalize a user-supplied tag name for a single-tag write (create or
/// rename). Blank and over-length names are rejected as invalid input.
pub fn require_tag_name(raw: &str) -> Result<String> {
    let name = normalize_tag_name(raw)
        .ok_or_else(|| Error::InvalidInput("Tag name cannot be empty".to_string()))?;
    if name.chars().count() > TAG_NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Tag name must not exceed {} characters",
            TAG_NAME_MAX_LEN
        )));
    }
    Ok(name)
}

/// Normalize a batch of tag names: blanks dropped, duplicates collapsed,
/// first-seen order kept.
pub fn normalize_tag_names<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        if let Some(n) = normalize_tag_name(name.as_ref()) {
            if !out.contains(&n) {
                out.push(n);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants_collapse() {
        assert_eq!(normalize_tag_name("Go").as_deref(), Some("go"));
        assert_eq!(normalize_tag_name("go").as_deref(), Some("go"));
        assert_eq!(normalize_tag_name(" GO ").as_deref(), Some("go"));
    }

    #[test]
    fn test_blank_is_none() {
        assert!(normalize_tag_name("").is_none());
        assert!(normalize_tag_name(" \t\n").is_none());
    }

    #[test]
    fn test_inner_whitespace_kept() {
        assert_eq!(
            normalize_tag_name("  Machine Learning ").as_deref(),
            Some("machine learning")
        );
    }

    #[test]
    fn test_non_ascii_lowercased() {
        assert_eq!(normalize_tag_name("БАЗА").as_deref(), Some("база"));
    }

    #[test]
    fn test_require_tag_name_bounds() {
        assert_eq!(require_tag_name(" Rust ").unwrap(), "rust");
        assert!(matches!(require_tag_name("  "), Err(Error::InvalidInput(_))));

        let at_limit = "й".repeat(TAG_NAME_MAX_LEN);
        assert_eq!(require_tag_name(&at_limit).unwrap().chars().count(), TAG_NAME_MAX_LEN);

        let over = "x".repeat(TAG_NAME_MAX_LEN + 1);
        assert!(matches!(require_tag_name(&over), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_batch_dedupes_after_normalization() {
        let names = normalize_tag_names(&["Rust", " rust", "", "DB", "db ", "  "]);
        assert_eq!(names, vec!["rust".to_string(), "db".to_string()]);
    }

    #[test]
    fn test_batch_empty() {
        let none: [&str; 0] = [];
        assert!(normalize_tag_names(&none).is_empty());
    }
}

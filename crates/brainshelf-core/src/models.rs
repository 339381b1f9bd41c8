//! Domain models for brainshelf.
//!
//! Wire representations use camelCase field names; [`EntryType`] serializes
//! as its stable lower-case discriminant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::pagination::PageRequest;

// =============================================================================
// ENTRY TYPE
// =============================================================================

/// Kind of entry.
///
/// Persisted as the lower-case discriminant returned by [`EntryType::as_str`],
/// never as an ordinal. Adding, removing, or renaming a variant is a schema
/// change and needs a migration that rewrites the `entry.entry_type` CHECK
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[serde(alias = "Note")]
    Note,
    #[serde(alias = "Link")]
    Link,
    #[serde(alias = "Code")]
    Code,
    #[serde(alias = "Task")]
    Task,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Note,
        EntryType::Link,
        EntryType::Code,
        EntryType::Task,
    ];

    /// Stable storage/wire discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Note => "note",
            EntryType::Link => "link",
            EntryType::Code => "code",
            EntryType::Task => "task",
        }
    }

    /// Human-readable name used in validation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntryType::Note => "Note",
            EntryType::Link => "Link",
            EntryType::Code => "Code",
            EntryType::Task => "Task",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unknown entry type '{}'. Expected one of: note, link, code, task",
                    s
                ))
            })
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

/// A persisted entry row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub content: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// True when this entry should have page metadata fetched for it.
    pub fn wants_metadata(&self) -> bool {
        self.entry_type == EntryType::Link
            && self.url.as_deref().map_or(false, |u| !u.trim().is_empty())
    }
}

/// An entry with its tags, metadata, and project name attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFull {
    #[serde(flatten)]
    pub entry: Entry,
    pub project_name: Option<String>,
    /// Normalized tag names, alphabetical.
    pub tags: Vec<String>,
    pub metadata: Option<Metadata>,
}

/// Request to create an entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub project_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Raw tag names; normalized and deduplicated on write.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request to replace an entry's mutable fields and tag set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Filtered entry listing. Tag names are OR-matched.
#[derive(Debug, Clone, Default)]
pub struct ListEntriesRequest {
    pub project_id: Option<Uuid>,
    pub entry_type: Option<EntryType>,
    pub tags: Vec<String>,
    pub page: PageRequest,
}

// =============================================================================
// TAGS
// =============================================================================

/// A persisted tag row. `name` is always normalized (trimmed, lower-case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tag with its usage count computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWithUsage {
    pub id: Uuid,
    pub name: String,
    /// Number of entries referencing this tag.
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate tag counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatistics {
    pub total_tags: i64,
    /// Count of entry/tag associations: an entry with three tags adds three.
    pub total_usages: i64,
}

/// Result of merging one tag into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMergeOutcome {
    pub source_id: Uuid,
    pub target_id: Uuid,
    /// Entries that referenced the source tag.
    pub reassigned_entries: i64,
}

// =============================================================================
// METADATA
// =============================================================================

/// Page metadata attached one-to-one to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub image_url: Option<String>,
    pub favicon_url: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields extracted from a fetched page, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub image_url: Option<String>,
    pub favicon_url: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
}

// =============================================================================
// PROJECTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// `#RGB` or `#RRGGBB`.
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to [`crate::defaults::PROJECT_COLOR`].
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Reusable starting point for new entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Normalized tag names applied to entries created from this template.
    pub tags: Vec<String>,
    pub is_default: bool,
    /// `None` for templates shared across all projects.
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_round_trips_through_discriminant() {
        for t in EntryType::ALL {
            assert_eq!(t.as_str().parse::<EntryType>().unwrap(), t);
        }
    }

    #[test]
    fn test_entry_type_parse_is_case_insensitive() {
        assert_eq!(" Link ".parse::<EntryType>().unwrap(), EntryType::Link);
        assert_eq!("TASK".parse::<EntryType>().unwrap(), EntryType::Task);
    }

    #[test]
    fn test_entry_type_rejects_legacy_variants() {
        let err = "setting".parse::<EntryType>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_entry_type_serde() {
        assert_eq!(serde_json::to_string(&EntryType::Code).unwrap(), "\"code\"");
        let t: EntryType = serde_json::from_str("\"Note\"").unwrap();
        assert_eq!(t, EntryType::Note);
        assert!(serde_json::from_str::<EntryType>("0").is_err());
    }

    fn link(url: Option<&str>) -> Entry {
        let now = Utc::now();
        Entry {
            id: Uuid::nil(),
            project_id: Uuid::nil(),
            title: "t".to_string(),
            description: None,
            entry_type: EntryType::Link,
            content: None,
            url: url.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_wants_metadata() {
        assert!(link(Some("https://example.com")).wants_metadata());
        assert!(!link(Some("   ")).wants_metadata());
        assert!(!link(None).wants_metadata());

        let mut note = link(Some("https://example.com"));
        note.entry_type = EntryType::Note;
        assert!(!note.wants_metadata());
    }

    #[test]
    fn test_entry_full_serializes_flat_camel_case() {
        let full = EntryFull {
            entry: link(Some("https://example.com")),
            project_name: Some("Inbox".to_string()),
            tags: vec!["rust".to_string()],
            metadata: None,
        };
        let json = serde_json::to_value(&full).unwrap();
        assert_eq!(json["type"], "link");
        assert_eq!(json["projectName"], "Inbox");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn test_create_entry_request_defaults() {
        let req: CreateEntryRequest = serde_json::from_value(serde_json::json!({
            "projectId": Uuid::nil(),
            "title": "Go concurrency",
            "type": "note"
        }))
        .unwrap();
        assert!(req.tags.is_empty());
        assert!(req.content.is_none());
    }
}

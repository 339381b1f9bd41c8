//! Repository traits implemented by the storage layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::pagination::{Page, PageRequest};
use crate::search::PreparedSearch;

/// Canonical registry of normalized tag names.
///
/// Names passed in are normalized (trimmed, lower-cased) before use; a name
/// that is blank after normalization fails with `InvalidInput`.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag, or return the existing one with the same normalized name.
    async fn create(&self, name: &str) -> Result<Tag>;

    /// Fetch a tag with its usage count.
    async fn get(&self, id: Uuid) -> Result<Option<TagWithUsage>>;

    /// All tags, alphabetical.
    async fn list(&self) -> Result<Vec<TagWithUsage>>;

    /// Tags whose name contains `substring` (case-insensitive), alphabetical.
    /// A blank substring lists every tag.
    async fn search(&self, substring: &str) -> Result<Vec<TagWithUsage>>;

    /// Tags by descending usage count (ties alphabetical), truncated to `limit`.
    async fn list_by_usage(&self, limit: i64) -> Result<Vec<TagWithUsage>>;

    /// Tags with at least one entry, most recently updated entry first.
    async fn list_recently_used(&self, limit: i64) -> Result<Vec<TagWithUsage>>;

    /// Tags with no entries, alphabetical.
    async fn list_unused(&self) -> Result<Vec<TagWithUsage>>;

    /// Rename a tag. `NotFound` for unknown ids, `Conflict` when another tag
    /// already holds the normalized name.
    async fn rename(&self, id: Uuid, new_name: &str) -> Result<TagWithUsage>;

    /// Move every association of `source_id` onto `target_id` and delete the
    /// source, atomically.
    async fn merge(&self, source_id: Uuid, target_id: Uuid) -> Result<TagMergeOutcome>;

    /// Delete a tag and its associations. Entries are untouched.
    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn statistics(&self) -> Result<TagStatistics>;
}

/// Persistence and filtered retrieval of entries.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Filtered listing, newest first.
    async fn list(&self, req: ListEntriesRequest) -> Result<Page<EntryFull>>;

    async fn get(&self, id: Uuid) -> Result<Option<EntryFull>>;

    async fn create(&self, req: CreateEntryRequest) -> Result<EntryFull>;

    /// Replace mutable fields and the tag set. `NotFound` for unknown ids.
    async fn update(&self, id: Uuid, req: UpdateEntryRequest) -> Result<EntryFull>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Newest first.
    async fn list(&self, page: PageRequest) -> Result<Page<Project>>;

    async fn get(&self, id: Uuid) -> Result<Option<Project>>;

    async fn create(&self, req: CreateProjectRequest) -> Result<Project>;

    async fn update(&self, id: Uuid, req: UpdateProjectRequest) -> Result<Project>;

    /// Deletes the project and, by cascade, its entries.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// All templates, or those for `project_id` plus shared ones. Alphabetical.
    async fn list(&self, project_id: Option<Uuid>) -> Result<Vec<Template>>;

    /// Templates flagged as defaults, alphabetical.
    async fn list_defaults(&self) -> Result<Vec<Template>>;

    async fn get(&self, id: Uuid) -> Result<Option<Template>>;

    async fn create(&self, req: CreateTemplateRequest) -> Result<Template>;

    async fn update(&self, id: Uuid, req: UpdateTemplateRequest) -> Result<Template>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// One-to-one page metadata keyed by entry id.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn get_for_entry(&self, entry_id: Uuid) -> Result<Option<Metadata>>;

    /// Create or overwrite the entry's metadata. `NotFound` if the entry is gone.
    async fn upsert(&self, entry_id: Uuid, extracted: ExtractedMetadata) -> Result<Metadata>;

    /// Like [`upsert`](Self::upsert), but only while the entry's URL is still
    /// `source_url`. Returns `Ok(None)` without writing when the URL has
    /// since changed, so a slow fetch of an old URL cannot overwrite newer
    /// metadata.
    async fn upsert_for_url(
        &self,
        entry_id: Uuid,
        source_url: &str,
        extracted: ExtractedMetadata,
    ) -> Result<Option<Metadata>>;
}

/// Executes prepared full-text searches.
#[async_trait]
pub trait FullTextSearch: Send + Sync {
    async fn search(&self, search: &PreparedSearch) -> Result<Page<EntryFull>>;
}

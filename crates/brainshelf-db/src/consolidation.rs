//! Tag consolidation workflow: rename, merge and delete across tags and the
//! entries that carry them.
//!
//! Each operation is a single store transaction; this layer adds input
//! checks that need no store round-trip, structured logging, and events
//! emitted only after the store has committed.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use brainshelf_core::{
    require_tag_name, Error, EventBus, Result, ServerEvent, TagMergeOutcome, TagRepository,
    TagWithUsage,
};

/// Rename/merge/delete entry point shared by the API and tooling.
pub struct TagConsolidation<R: TagRepository> {
    tags: R,
    pub(crate) events: Option<Arc<EventBus>>,
}

impl<R: TagRepository> TagConsolidation<R> {
    pub fn new(tags: R) -> Self {
        Self { tags, events: None }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// The wrapped tag store.
    pub fn tags(&self) -> &R {
        &self.tags
    }

    fn emit(&self, event: ServerEvent) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }

    /// Rename a tag. Blank and over-length names fail before the store is
    /// touched.
    #[instrument(
        skip(self, new_name),
        fields(subsystem = "tags", component = "consolidation", op = "rename", tag_id = %id)
    )]
    pub async fn rename(&self, id: Uuid, new_name: &str) -> Result<TagWithUsage> {
        let normalized = require_tag_name(new_name)?;

        let before = self
            .tags
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Tag with ID {} not found", id)))?;

        let renamed = match self.tags.rename(id, &normalized).await {
            Ok(tag) => tag,
            Err(e) => {
                warn!(error = %e, new_name = %normalized, "Tag rename rejected");
                return Err(e);
            }
        };

        if before.name != renamed.name {
            info!(old_name = %before.name, new_name = %renamed.name, "Tag renamed");
            self.emit(ServerEvent::TagRenamed {
                tag_id: id,
                old_name: before.name,
                new_name: renamed.name.clone(),
            });
        }
        Ok(renamed)
    }

    /// Merge `source_id` into `target_id`. Self-merges fail before the store
    /// is touched.
    #[instrument(
        skip(self),
        fields(subsystem = "tags", component = "consolidation", op = "merge")
    )]
    pub async fn merge(&self, source_id: Uuid, target_id: Uuid) -> Result<TagMergeOutcome> {
        if source_id == target_id {
            return Err(Error::InvalidOperation(
                "Cannot merge a tag with itself".to_string(),
            ));
        }

        let outcome = self.tags.merge(source_id, target_id).await?;
        info!(
            source_id = %outcome.source_id,
            target_id = %outcome.target_id,
            reassigned = outcome.reassigned_entries,
            "Tags merged"
        );
        self.emit(ServerEvent::TagsMerged {
            source_id: outcome.source_id,
            target_id: outcome.target_id,
            reassigned_entries: outcome.reassigned_entries,
        });
        Ok(outcome)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.tags.delete(id).await?;
        info!(
            subsystem = "tags",
            component = "consolidation",
            op = "delete",
            tag_id = %id,
            "Tag deleted"
        );
        self.emit(ServerEvent::TagDeleted { tag_id: id });
        Ok(())
    }
}

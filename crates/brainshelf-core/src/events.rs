//! Server event types, envelope schema, and event bus.
//!
//! Repositories emit events after a write commits. Consumers (the metadata
//! worker, logging bridges) subscribe independently; a consumer failing or
//! lagging never affects the write that produced the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Event Envelope
// ============================================================================

/// Actor metadata for event attribution. Every event today originates
/// from a committed store write, so the actor is always the system.
#[derive(Debug, Clone, Serialize)]
pub struct EventActor {
    pub kind: String,
}

impl EventActor {
    pub fn system() -> Self {
        Self {
            kind: "system".to_string(),
        }
    }
}

/// Versioned envelope around a [`ServerEvent`].
///
/// `event_type` uses dot-namespaced names (e.g. `"entry.created"`,
/// `"tag.merged"`). Consumers should ignore unknown fields.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7 event identifier.
    pub event_id: Uuid,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub actor: EventActor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub payload_version: u32,
    pub payload: ServerEvent,
}

impl EventEnvelope {
    pub fn new(event: ServerEvent) -> Self {
        Self {
            event_id: crate::uuid_utils::new_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            actor: EventActor::system(),
            entity_type: Some(event.entity_type().to_string()),
            entity_id: Some(event.entity_id().to_string()),
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Server Event (domain payloads)
// ============================================================================

/// Domain event payloads, serialized with a `type` tag, e.g.
/// `{"type":"MetadataRequested","entry_id":"...","url":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    EntryCreated {
        entry_id: Uuid,
        project_id: Uuid,
    },
    EntryUpdated {
        entry_id: Uuid,
    },
    EntryDeleted {
        entry_id: Uuid,
    },
    /// A Link entry's URL needs its page metadata fetched.
    MetadataRequested {
        entry_id: Uuid,
        url: String,
    },
    /// Page metadata was stored for an entry.
    MetadataExtracted {
        entry_id: Uuid,
    },
    TagRenamed {
        tag_id: Uuid,
        old_name: String,
        new_name: String,
    },
    TagsMerged {
        source_id: Uuid,
        target_id: Uuid,
        reassigned_entries: i64,
    },
    TagDeleted {
        tag_id: Uuid,
    },
}

impl ServerEvent {
    /// Namespaced event type for the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            ServerEvent::EntryCreated { .. } => "entry.created",
            ServerEvent::EntryUpdated { .. } => "entry.updated",
            ServerEvent::EntryDeleted { .. } => "entry.deleted",
            ServerEvent::MetadataRequested { .. } => "metadata.requested",
            ServerEvent::MetadataExtracted { .. } => "metadata.extracted",
            ServerEvent::TagRenamed { .. } => "tag.renamed",
            ServerEvent::TagsMerged { .. } => "tag.merged",
            ServerEvent::TagDeleted { .. } => "tag.deleted",
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            ServerEvent::EntryCreated { .. }
            | ServerEvent::EntryUpdated { .. }
            | ServerEvent::EntryDeleted { .. }
            | ServerEvent::MetadataRequested { .. }
            | ServerEvent::MetadataExtracted { .. } => "entry",
            ServerEvent::TagRenamed { .. }
            | ServerEvent::TagsMerged { .. }
            | ServerEvent::TagDeleted { .. } => "tag",
        }
    }

    /// Primary entity ID. For merges this is the surviving target tag.
    pub fn entity_id(&self) -> Uuid {
        match self {
            ServerEvent::EntryCreated { entry_id, .. }
            | ServerEvent::EntryUpdated { entry_id }
            | ServerEvent::EntryDeleted { entry_id }
            | ServerEvent::MetadataRequested { entry_id, .. }
            | ServerEvent::MetadataExtracted { entry_id } => *entry_id,
            ServerEvent::TagRenamed { tag_id, .. } | ServerEvent::TagDeleted { tag_id } => *tag_id,
            ServerEvent::TagsMerged { target_id, .. } => *target_id,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus.
///
/// Uses `tokio::sync::broadcast`. Receivers that fall behind get a `Lagged`
/// error and miss events; with no subscribers, emitted events are dropped.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: ServerEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.subscriber_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to enveloped events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Semaphore};
use tokio::time::timeout;
use uuid::Uuid;

use brainshelf_jobs::{
    Error, EventBus, ExtractedMetadata, Metadata, MetadataRepository, MetadataWorker, PageFetcher,
    Result, ServerEvent, WorkerConfig, WorkerEvent,
};

/// Metadata store keyed by entry id. Entries listed in `missing` behave as
/// deleted; entries in `urls` have that as their current URL.
#[derive(Default)]
struct MemoryMetadata {
    rows: Mutex<HashMap<Uuid, Metadata>>,
    missing: Mutex<Vec<Uuid>>,
    urls: Mutex<HashMap<Uuid, String>>,
}

#[async_trait]
impl MetadataRepository for MemoryMetadata {
    async fn get_for_entry(&self, entry_id: Uuid) -> Result<Option<Metadata>> {
        Ok(self.rows.lock().unwrap().get(&entry_id).cloned())
    }

    async fn upsert(&self, entry_id: Uuid, extracted: ExtractedMetadata) -> Result<Metadata> {
        if self.missing.lock().unwrap().contains(&entry_id) {
            return Err(Error::NotFound(format!("Entry with ID {} not found", entry_id)));
        }
        let now = Utc::now();
        let row = Metadata {
            id: Uuid::now_v7(),
            entry_id,
            title: extracted.title,
            description: extracted.description,
            keywords: extracted.keywords,
            image_url: extracted.image_url,
            favicon_url: extracted.favicon_url,
            author: extracted.author,
            site_name: extracted.site_name,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(entry_id, row.clone());
        Ok(row)
    }

    async fn upsert_for_url(
        &self,
        entry_id: Uuid,
        source_url: &str,
        extracted: ExtractedMetadata,
    ) -> Result<Option<Metadata>> {
        let stale = matches!(
            self.urls.lock().unwrap().get(&entry_id),
            Some(current) if current != source_url
        );
        if stale {
            return Ok(None);
        }
        self.upsert(entry_id, extracted).await.map(Some)
    }
}

/// Fetcher that titles every page after its URL, failing on `/down`.
struct StubFetcher;

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<ExtractedMetadata> {
        if url.ends_with("/down") {
            return Err(Error::Request("connection refused".into()));
        }
        Ok(ExtractedMetadata {
            title: Some(format!("Title of {}", url)),
            ..ExtractedMetadata::default()
        })
    }
}

/// Fetcher that holds every fetch until the gate has permits.
struct GatedFetcher {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl PageFetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> Result<ExtractedMetadata> {
        let _open = self.gate.acquire().await;
        Ok(ExtractedMetadata {
            title: Some(url.to_string()),
            ..ExtractedMetadata::default()
        })
    }
}

struct Harness {
    bus: Arc<EventBus>,
    repo: Arc<MemoryMetadata>,
}

impl Harness {
    fn new() -> Self {
        Self {
            bus: Arc::new(EventBus::default()),
            repo: Arc::new(MemoryMetadata::default()),
        }
    }

    fn worker(&self, config: WorkerConfig) -> MetadataWorker {
        MetadataWorker::with_fetcher(
            self.bus.clone(),
            self.repo.clone(),
            Arc::new(StubFetcher),
            config,
        )
    }

    fn request(&self, entry_id: Uuid, url: &str) {
        self.bus.emit(ServerEvent::MetadataRequested {
            entry_id,
            url: url.to_string(),
        });
    }
}

/// Next event that is not a start notification.
async fn next_outcome(events: &mut broadcast::Receiver<WorkerEvent>) -> WorkerEvent {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("worker event in time")
            .expect("worker event channel open");
        match event {
            WorkerEvent::WorkerStarted | WorkerEvent::ExtractionStarted { .. } => continue,
            other => return other,
        }
    }
}

#[tokio::test]
async fn test_requested_metadata_is_stored_and_announced() {
    let harness = Harness::new();
    let mut bus_events = harness.bus.subscribe();
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    let entry_id = Uuid::now_v7();
    harness.request(entry_id, "https://example.com/a");

    assert_eq!(
        next_outcome(&mut events).await,
        WorkerEvent::ExtractionCompleted { entry_id }
    );
    let stored = harness.repo.get_for_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Title of https://example.com/a"));

    let extracted = loop {
        let envelope = timeout(Duration::from_secs(5), bus_events.recv())
            .await
            .unwrap()
            .unwrap();
        if let ServerEvent::MetadataExtracted { entry_id } = envelope.payload {
            break entry_id;
        }
    };
    assert_eq!(extracted, entry_id);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_fetch_failure_is_reported_not_stored() {
    let harness = Harness::new();
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    let entry_id = Uuid::now_v7();
    harness.request(entry_id, "https://example.com/down");

    match next_outcome(&mut events).await {
        WorkerEvent::ExtractionFailed { entry_id: failed, error } => {
            assert_eq!(failed, entry_id);
            assert!(error.contains("connection refused"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(harness.repo.get_for_entry(entry_id).await.unwrap().is_none());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deleted_entry_is_a_failed_extraction() {
    let harness = Harness::new();
    let entry_id = Uuid::now_v7();
    harness.repo.missing.lock().unwrap().push(entry_id);
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    harness.request(entry_id, "https://example.com/gone");

    assert!(matches!(
        next_outcome(&mut events).await,
        WorkerEvent::ExtractionFailed { .. }
    ));
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_metadata_for_replaced_url_is_discarded() {
    let harness = Harness::new();
    let entry_id = Uuid::now_v7();
    harness
        .repo
        .urls
        .lock()
        .unwrap()
        .insert(entry_id, "https://example.com/new".to_string());
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    harness.request(entry_id, "https://example.com/old");
    assert_eq!(
        next_outcome(&mut events).await,
        WorkerEvent::ExtractionSkipped { entry_id }
    );
    assert!(harness.repo.get_for_entry(entry_id).await.unwrap().is_none());

    harness.request(entry_id, "https://example.com/new");
    assert_eq!(
        next_outcome(&mut events).await,
        WorkerEvent::ExtractionCompleted { entry_id }
    );
    let stored = harness.repo.get_for_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Title of https://example.com/new"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_busy_worker_leaves_requests_in_bus_buffer() {
    let bus = Arc::new(EventBus::new(4));
    let repo = Arc::new(MemoryMetadata::default());
    let gate = Arc::new(Semaphore::new(0));
    let handle = MetadataWorker::with_fetcher(
        bus.clone(),
        repo.clone(),
        Arc::new(GatedFetcher { gate: gate.clone() }),
        WorkerConfig::default().with_max_concurrent(1),
    )
    .start();
    let mut events = handle.events();

    let first = Uuid::now_v7();
    bus.emit(ServerEvent::MetadataRequested {
        entry_id: first,
        url: "https://example.com/first".to_string(),
    });
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        if event == (WorkerEvent::ExtractionStarted { entry_id: first }) {
            break;
        }
    }

    // Each request gets a chance to be picked up before the next is sent.
    // With the only permit taken, the worker stops draining the bus and the
    // 4-slot buffer overflows.
    let queued = 20;
    for i in 0..queued {
        bus.emit(ServerEvent::MetadataRequested {
            entry_id: Uuid::now_v7(),
            url: format!("https://example.com/{}", i),
        });
        tokio::task::yield_now().await;
    }

    gate.add_permits(queued + 1);
    handle.shutdown().await.unwrap();
    loop {
        if next_outcome(&mut events).await == WorkerEvent::WorkerStopped {
            break;
        }
    }

    let stored = repo.rows.lock().unwrap().len();
    assert!(repo.rows.lock().unwrap().contains_key(&first));
    assert!(
        stored < queued + 1,
        "only requests holding a permit are spawned, stored {}",
        stored
    );
}

#[tokio::test]
async fn test_unrelated_events_are_ignored() {
    let harness = Harness::new();
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    let ignored = Uuid::now_v7();
    harness.bus.emit(ServerEvent::EntryUpdated { entry_id: ignored });
    harness.bus.emit(ServerEvent::TagDeleted { tag_id: Uuid::now_v7() });

    let entry_id = Uuid::now_v7();
    harness.request(entry_id, "https://example.com/b");

    assert_eq!(
        next_outcome(&mut events).await,
        WorkerEvent::ExtractionCompleted { entry_id }
    );
    assert!(harness.repo.get_for_entry(ignored).await.unwrap().is_none());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_all_complete() {
    let harness = Harness::new();
    let handle = harness
        .worker(WorkerConfig::default().with_max_concurrent(2))
        .start();
    let mut events = handle.events();

    let ids: Vec<Uuid> = (0..6).map(|_| Uuid::now_v7()).collect();
    for (i, id) in ids.iter().enumerate() {
        harness.request(*id, &format!("https://example.com/{}", i));
    }

    let mut completed = Vec::new();
    while completed.len() < ids.len() {
        if let WorkerEvent::ExtractionCompleted { entry_id } = next_outcome(&mut events).await {
            completed.push(entry_id);
        }
    }
    completed.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(completed, expected);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_emits_worker_stopped() {
    let harness = Harness::new();
    let handle = harness.worker(WorkerConfig::default()).start();
    let mut events = handle.events();

    handle.shutdown().await.unwrap();

    assert_eq!(next_outcome(&mut events).await, WorkerEvent::WorkerStopped);
}

#[tokio::test]
async fn test_disabled_worker_does_nothing() {
    let harness = Harness::new();
    let handle = harness
        .worker(WorkerConfig::default().with_enabled(false))
        .start();
    let mut events = handle.events();

    let entry_id = Uuid::now_v7();
    harness.request(entry_id, "https://example.com/c");

    // The run loop exits immediately, closing the worker's event channel.
    let outcome = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert!(matches!(outcome, Err(broadcast::error::RecvError::Closed)));
    assert!(harness.repo.get_for_entry(entry_id).await.unwrap().is_none());
}

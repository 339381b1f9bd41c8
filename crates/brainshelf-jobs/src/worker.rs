//! Metadata worker: listens for `MetadataRequested` events and stores the
//! page metadata of link entries.
//!
//! Extraction is best-effort. A failed fetch or write is logged and reported
//! as [`WorkerEvent::ExtractionFailed`]; it never surfaces to the request
//! that triggered it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use brainshelf_core::defaults::{
    EVENT_BUS_CAPACITY, METADATA_FETCH_TIMEOUT_SECS, METADATA_MAX_CONCURRENT, METADATA_USER_AGENT,
};
use brainshelf_core::{EventBus, EventEnvelope, MetadataRepository, Result, ServerEvent};
use brainshelf_db::Database;

use crate::extractor::{ExtractorConfig, MetadataExtractor, PageFetcher};

/// Configuration for the metadata worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether to process metadata requests at all.
    pub enabled: bool,
    /// Maximum number of pages fetched at once.
    pub max_concurrent: usize,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: METADATA_MAX_CONCURRENT,
            fetch_timeout_secs: METADATA_FETCH_TIMEOUT_SECS,
            user_agent: METADATA_USER_AGENT.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `METADATA_WORKER_ENABLED` | `true` | Enable/disable extraction |
    /// | `METADATA_MAX_CONCURRENT` | `4` | Max concurrent page fetches |
    /// | `METADATA_FETCH_TIMEOUT_SECS` | `10` | Per-page timeout |
    /// | `METADATA_USER_AGENT` | `Mozilla/5.0 (compatible; BrainShelf/1.0)` | User agent header |
    pub fn from_env() -> Self {
        let enabled = std::env::var("METADATA_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent = std::env::var("METADATA_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(METADATA_MAX_CONCURRENT)
            .max(1);

        let fetch_timeout_secs = std::env::var("METADATA_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(METADATA_FETCH_TIMEOUT_SECS);

        let user_agent = std::env::var("METADATA_USER_AGENT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| METADATA_USER_AGENT.to_string());

        Self {
            enabled,
            max_concurrent,
            fetch_timeout_secs,
            user_agent,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            user_agent: self.user_agent.clone(),
            ..ExtractorConfig::default()
        }
    }
}

/// Event emitted by the metadata worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    WorkerStarted,
    WorkerStopped,
    ExtractionStarted { entry_id: Uuid },
    ExtractionCompleted { entry_id: Uuid },
    /// The entry's URL changed while its page was being fetched.
    ExtractionSkipped { entry_id: Uuid },
    ExtractionFailed { entry_id: Uuid, error: String },
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to stop. In-flight extractions finish first.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx.send(()).await.map_err(|_| {
            brainshelf_core::Error::Internal("Failed to send shutdown signal".into())
        })?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Background consumer of `MetadataRequested` events.
pub struct MetadataWorker {
    bus: Arc<EventBus>,
    repo: Arc<dyn MetadataRepository>,
    fetcher: Arc<dyn PageFetcher>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl MetadataWorker {
    /// Worker with an HTTP extractor built from `config`.
    pub fn new(
        bus: Arc<EventBus>,
        repo: Arc<dyn MetadataRepository>,
        config: WorkerConfig,
    ) -> Result<Self> {
        let fetcher = MetadataExtractor::new(config.extractor_config())?;
        Ok(Self::with_fetcher(bus, repo, Arc::new(fetcher), config))
    }

    /// Worker writing through the database's metadata repository.
    pub fn from_database(db: &Database, bus: Arc<EventBus>, config: WorkerConfig) -> Result<Self> {
        Self::new(bus, Arc::new(db.metadata.clone()), config)
    }

    pub fn with_fetcher(
        bus: Arc<EventBus>,
        repo: Arc<dyn MetadataRepository>,
        fetcher: Arc<dyn PageFetcher>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            bus,
            repo,
            fetcher,
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    ///
    /// The bus subscription is taken before this returns, so events emitted
    /// after `start` are never missed.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();
        let bus_rx = self.bus.subscribe();

        tokio::spawn(async move {
            self.run(bus_rx, &mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip_all, fields(subsystem = "jobs", component = "metadata_worker"))]
    async fn run(
        &self,
        mut bus_rx: broadcast::Receiver<EventEnvelope>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) {
        if !self.config.enabled {
            info!("Metadata worker is disabled, not starting");
            return;
        }

        info!(
            max_concurrent = self.config.max_concurrent,
            fetch_timeout_secs = self.config.fetch_timeout_secs,
            "Metadata worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut tasks: JoinSet<()> = JoinSet::new();

        'run: loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Metadata worker received shutdown signal");
                    break;
                }
                received = bus_rx.recv() => match received {
                    Ok(envelope) => {
                        if let ServerEvent::MetadataRequested { entry_id, url } = envelope.payload {
                            // At most `max_concurrent` tasks exist; later requests
                            // wait in the bounded bus buffer.
                            let permit = tokio::select! {
                                permit = permits.clone().acquire_owned() => permit,
                                _ = shutdown_rx.recv() => {
                                    info!("Metadata worker received shutdown signal");
                                    break 'run;
                                }
                            };
                            let Ok(permit) = permit else {
                                error!("Metadata worker semaphore closed");
                                break 'run;
                            };
                            let task = self.task_refs();
                            tasks.spawn(async move {
                                task.extract(entry_id, url).await;
                                drop(permit);
                            });
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Metadata worker lagged behind event bus; requests dropped");
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = ?e, "Metadata task panicked");
                    }
                }
            }
        }

        if !tasks.is_empty() {
            debug!(in_flight = tasks.len(), "Draining in-flight extractions");
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = ?e, "Metadata task panicked");
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Metadata worker stopped");
    }

    fn task_refs(&self) -> ExtractionTask {
        ExtractionTask {
            bus: self.bus.clone(),
            repo: self.repo.clone(),
            fetcher: self.fetcher.clone(),
            event_tx: self.event_tx.clone(),
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }
}

/// References needed by one spawned extraction.
struct ExtractionTask {
    bus: Arc<EventBus>,
    repo: Arc<dyn MetadataRepository>,
    fetcher: Arc<dyn PageFetcher>,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl ExtractionTask {
    async fn extract(self, entry_id: Uuid, url: String) {
        let start = Instant::now();
        let _ = self
            .event_tx
            .send(WorkerEvent::ExtractionStarted { entry_id });
        debug!(%entry_id, %url, "Extracting page metadata");

        match self.fetch_and_store(entry_id, &url).await {
            Ok(false) => {
                info!(%entry_id, %url, "Entry URL changed during fetch, metadata discarded");
                let _ = self
                    .event_tx
                    .send(WorkerEvent::ExtractionSkipped { entry_id });
            }
            Ok(true) => {
                info!(
                    %entry_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Page metadata stored"
                );
                self.bus.emit(ServerEvent::MetadataExtracted { entry_id });
                let _ = self
                    .event_tx
                    .send(WorkerEvent::ExtractionCompleted { entry_id });
            }
            Err(e) => {
                warn!(%entry_id, %url, error = %e, "Metadata extraction failed");
                let _ = self.event_tx.send(WorkerEvent::ExtractionFailed {
                    entry_id,
                    error: e.to_string(),
                });
            }
        }
    }

    /// False when the entry no longer points at `url`.
    async fn fetch_and_store(&self, entry_id: Uuid, url: &str) -> Result<bool> {
        let extracted = self.fetcher.fetch(url).await?;
        let stored = self.repo.upsert_for_url(entry_id, url, extracted).await?;
        Ok(stored.is_some())
    }
}

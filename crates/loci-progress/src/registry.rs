//! The per-process job progress registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use loci_types::protocol::room_name;
use loci_types::{JobStatus, ProgressEvent};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::progress::Progress;

/// Tuning for the [`ProgressRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Per-room broadcast buffer. A subscriber lagging past this many
    /// undelivered events loses the oldest ones.
    pub channel_capacity: usize,
    /// How long a job's snapshot survives after a terminal event.
    pub terminal_ttl: Duration,
}

impl RegistryConfig {
    /// Defaults for production use.
    pub fn default_config() -> Self {
        Self {
            channel_capacity: 256,
            terminal_ttl: Duration::from_secs(600),
        }
    }

    /// A config suitable for fast test execution.
    pub fn test_config() -> Self {
        Self {
            channel_capacity: 16,
            terminal_ttl: Duration::from_millis(50),
        }
    }
}

/// Per-job state: the last broadcast snapshot and the room channel.
struct JobEntry {
    last: Option<ProgressEvent>,
    sender: broadcast::Sender<ProgressEvent>,
    /// Set when the last event was terminal; cleared if a later event
    /// reopens the job (transitions are deliberately not enforced).
    terminal_at: Option<Instant>,
}

struct RegistryInner {
    jobs: HashMap<String, JobEntry>,
}

/// Tracks last-known progress per job and fans events out to the job's
/// room.
///
/// Clonable (`Arc` inside); all clones share state. The single lock only
/// guards in-memory map work, never I/O.
#[derive(Clone)]
pub struct ProgressRegistry {
    config: RegistryConfig,
    inner: Arc<Mutex<RegistryInner>>,
}

impl ProgressRegistry {
    /// Create a registry with the given config.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(RegistryInner {
                jobs: HashMap::new(),
            })),
        }
    }

    /// Create a [`Progress`] handle for a job, generating a random id if
    /// none is supplied.
    ///
    /// Immediately broadcasts `{percent: 0, status: queued}` so a
    /// subscriber joining moments later can recover the job's existence
    /// from the replayed snapshot.
    pub fn create(&self, job_id: Option<String>) -> Progress {
        let job_id = job_id.unwrap_or_else(random_job_id);
        self.publish(ProgressEvent {
            job_id: job_id.clone(),
            percent: Some(0.0),
            status: Some(JobStatus::Queued),
            message: Some("Queued".to_string()),
            data: None,
        });
        Progress::new(self.clone(), job_id)
    }

    /// The most recently broadcast snapshot for a job, independent of
    /// room membership.
    pub fn get_last(&self, job_id: &str) -> Option<ProgressEvent> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.jobs.get(job_id).and_then(|e| e.last.clone())
    }

    /// Join a job's room.
    ///
    /// The returned subscription yields the last known snapshot first (if
    /// any), then live events in publish order. Leaving the room is just
    /// dropping the subscription, which matches a connection going away.
    pub fn subscribe(&self, job_id: &str) -> ProgressSubscription {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let entry = inner
            .jobs
            .entry(job_id.to_string())
            .or_insert_with(|| JobEntry {
                last: None,
                sender: broadcast::channel(self.config.channel_capacity).0,
                terminal_at: None,
            });
        debug!(room = %room_name(job_id), "subscriber joined");
        ProgressSubscription {
            replay: entry.last.clone(),
            rx: entry.sender.subscribe(),
        }
    }

    /// Record `event` as the job's last snapshot and broadcast it to the
    /// room.
    pub(crate) fn publish(&self, event: ProgressEvent) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let entry = inner
            .jobs
            .entry(event.job_id.clone())
            .or_insert_with(|| JobEntry {
                last: None,
                sender: broadcast::channel(self.config.channel_capacity).0,
                terminal_at: None,
            });

        entry.terminal_at = event.is_terminal().then(Instant::now);
        entry.last = Some(event.clone());
        // No receivers is the normal case for a job nobody watches.
        let _ = entry.sender.send(event);
    }

    /// Drop jobs whose terminal event is older than the configured TTL.
    ///
    /// Their room channels close, ending any remaining subscriptions.
    /// Returns the number of jobs evicted.
    pub fn evict_expired(&self) -> usize {
        let ttl = self.config.terminal_ttl;
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let before = inner.jobs.len();
        inner.jobs.retain(|job_id, entry| match entry.terminal_at {
            Some(at) if now.duration_since(at) >= ttl => {
                debug!(job_id = %job_id, "evicting finished job");
                false
            }
            _ => true,
        });
        before - inner.jobs.len()
    }

    /// Spawn a background task sweeping expired jobs every `interval`.
    ///
    /// The task runs until aborted via the returned handle.
    pub fn spawn_eviction(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_expired();
                if evicted > 0 {
                    debug!(evicted, "progress eviction sweep");
                }
            }
        })
    }

    /// Number of jobs currently tracked.
    pub fn job_count(&self) -> usize {
        self.inner.lock().expect("registry lock poisoned").jobs.len()
    }
}

impl Default for ProgressRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default_config())
    }
}

/// A live membership in one job's room.
///
/// Dropping it leaves the room.
pub struct ProgressSubscription {
    replay: Option<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscription {
    /// Receive the next event: the replayed snapshot first if one
    /// existed at subscribe time, then live events in publish order.
    ///
    /// Returns `None` once the job has been evicted and all pending
    /// events are drained. A subscriber that lags past the room buffer
    /// skips the lost events and continues from the oldest retained one;
    /// the next snapshot makes it current again.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        if let Some(snapshot) = self.replay.take() {
            return Some(snapshot);
        }
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Random base-36 job id (13 chars, lowercase alphanumeric).
fn random_job_id() -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value: u64 = rand::random();
    let mut out = [0u8; 13];
    for slot in out.iter_mut() {
        *slot = ALPHABET[(value % 36) as usize];
        value /= 36;
    }
    // ALPHABET is ASCII, so the bytes are valid UTF-8.
    String::from_utf8(out.to_vec()).expect("ascii job id")
}

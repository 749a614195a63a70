// ── Farm repository (synchronizer) ──
//
// Couples a remote source with a record store: `refresh()` pulls the full
// remote set and writes it through the store; `records()` exposes the
// store's stream as domain values. New records are observed through the
// stream, never through the refresh return value.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{SyncConfig, WriteMode};
use crate::convert::farms_from_stored;
use crate::error::{CoreError, RefreshError, StorageError};
use crate::model::Farm;
use crate::remote::{HttpRemote, RemoteSource};
use crate::store::{RecordStore, SqliteFarmStore, StoredFarm};
use crate::stream::FarmStream;

/// Shortest period accepted by [`FarmRepository::spawn_periodic_refresh`].
const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Tuning for a [`FarmRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryOptions {
    pub write_mode: WriteMode,
    /// Coalesce overlapping refreshes into one fetch.
    pub single_flight: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Upsert,
            single_flight: true,
        }
    }
}

impl From<&SyncConfig> for RepositoryOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            write_mode: config.write_mode,
            single_flight: config.single_flight,
        }
    }
}

/// Summary of a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshReport {
    /// Number of records the remote returned and the store accepted.
    pub fetched: usize,
    pub completed_at: DateTime<Utc>,
}

/// The synchronizer.
///
/// Cheaply cloneable: all clones share the same remote, store and
/// single-flight gate.
pub struct FarmRepository<R: RemoteSource, S: RecordStore> {
    inner: Arc<RepositoryInner<R, S>>,
}

impl<R: RemoteSource, S: RecordStore> Clone for FarmRepository<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct RepositoryInner<R, S> {
    remote: R,
    store: S,
    options: RepositoryOptions,
    /// Serializes refreshes and remembers the last finished outcome.
    gate: Mutex<RefreshGate>,
    /// Finished (non-cancelled) refreshes so far.
    completed: AtomicU64,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

#[derive(Default)]
struct RefreshGate {
    last_outcome: Option<Result<RefreshReport, RefreshError>>,
}

impl<R: RemoteSource, S: RecordStore> FarmRepository<R, S> {
    pub fn new(remote: R, store: S) -> Self {
        Self::with_options(remote, store, RepositoryOptions::default())
    }

    pub fn with_options(remote: R, store: S, options: RepositoryOptions) -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            inner: Arc::new(RepositoryInner {
                remote,
                store,
                options,
                gate: Mutex::new(RefreshGate::default()),
                completed: AtomicU64::new(0),
                last_refresh,
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Continuous domain-typed view of the store, starting at its
    /// current contents.
    pub fn records(&self) -> FarmStream {
        FarmStream::new(self.inner.store.observe())
    }

    pub fn snapshot(&self) -> Vec<Farm> {
        farms_from_stored(&self.inner.store.snapshot())
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    pub fn options(&self) -> RepositoryOptions {
        self.inner.options
    }

    /// Completion time of the last successful refresh, as a watch.
    pub fn last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.last_refresh.subscribe()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the full remote set and write it into the store.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        self.refresh_with_cancel(&CancellationToken::new()).await
    }

    /// Like [`refresh()`](Self::refresh), abandoning the cycle if `cancel`
    /// fires before the store write begins. A write that has started
    /// always runs to completion.
    ///
    /// With single-flight enabled, a caller arriving while another refresh
    /// is running waits for it and receives its outcome instead of
    /// fetching again.
    pub async fn refresh_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, RefreshError> {
        if !self.inner.options.single_flight {
            return self.inner.run_refresh(cancel).await;
        }

        let seen = self.inner.completed.load(Ordering::Acquire);
        let mut gate = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RefreshError::Cancelled),
            gate = self.inner.gate.lock() => gate,
        };

        if self.inner.completed.load(Ordering::Acquire) != seen {
            if let Some(outcome) = gate.last_outcome.clone() {
                debug!("joined in-flight refresh");
                return outcome;
            }
        }

        let outcome = self.inner.run_refresh(cancel).await;
        if !matches!(outcome, Err(RefreshError::Cancelled)) {
            gate.last_outcome = Some(outcome.clone());
            self.inner.completed.fetch_add(1, Ordering::Release);
        }
        outcome
    }

    /// Refresh every `period` until `cancel` fires. Failures are logged
    /// and the loop keeps going.
    pub fn spawn_periodic_refresh(
        &self,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let repository = self.clone();
        let period = period.max(MIN_REFRESH_PERIOD);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        match repository.refresh_with_cancel(&cancel).await {
                            Ok(_) | Err(RefreshError::Cancelled) => {}
                            Err(e) => warn!(error = %e, "periodic refresh failed"),
                        }
                    }
                }
            }
            debug!("periodic refresh stopped");
        })
    }
}

impl<R: RemoteSource, S: RecordStore> RepositoryInner<R, S> {
    async fn run_refresh(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, RefreshError> {
        let started_at = Instant::now();
        debug!("refresh started");

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RefreshError::Cancelled),
            result = self.remote.fetch_all() => result,
        };
        let dtos = match fetched {
            Ok(dtos) => dtos,
            Err(e) => {
                debug!(error = %e, "remote fetch failed");
                return Err(e.into());
            }
        };

        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        let count = dtos.len();
        let records: Vec<StoredFarm> = dtos.into_iter().map(StoredFarm::from).collect();
        match self.options.write_mode {
            WriteMode::Upsert => self.store.replace_all(records).await?,
            WriteMode::Mirror => self.store.mirror_all(records).await?,
        }

        let completed_at = Utc::now();
        self.last_refresh.send_replace(Some(completed_at));
        info!(
            farms = count,
            mode = ?self.options.write_mode,
            elapsed_ms = started_at.elapsed().as_millis(),
            "refresh complete"
        );

        Ok(RefreshReport {
            fetched: count,
            completed_at,
        })
    }
}

impl FarmRepository<HttpRemote, SqliteFarmStore> {
    /// Open the configured store and connect to the server.
    pub async fn connect(config: &SyncConfig) -> Result<Self, CoreError> {
        let location = config.database.clone();
        let store = tokio::task::spawn_blocking(move || SqliteFarmStore::open_location(&location))
            .await
            .map_err(StorageError::from)??;
        let remote = HttpRemote::connect(config).await?;

        info!(url = %config.url, farms = store.snapshot().len(), "repository ready");
        Ok(Self::with_options(remote, store, RepositoryOptions::from(config)))
    }
}

// ── Presentation state holder ──
//
// Owns the UI state for a farm list screen. Two independent update sites
// write into it: the record bridge (farms) and refresh (loading/error).
// They are not atomic across each other; the last write wins.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RefreshError;
use crate::model::Farm;
use crate::remote::RemoteSource;
use crate::repository::FarmRepository;
use crate::store::RecordStore;
use crate::stream::FarmStream;

/// What a renderer needs to draw the farm list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmUiState {
    pub is_loading: bool,
    /// Sorted by name.
    pub farms: Vec<Farm>,
    /// Message of the last failed refresh, cleared when a new one starts.
    pub error: Option<String>,
}

/// Drives a [`FarmRepository`] and publishes [`FarmUiState`].
///
/// Construction subscribes to the repository's records and kicks off one
/// refresh in the background. Must be created inside a tokio runtime.
pub struct FarmViewModel<R: RemoteSource, S: RecordStore> {
    repository: FarmRepository<R, S>,
    state: Arc<watch::Sender<FarmUiState>>,
    cancel: CancellationToken,
}

impl<R: RemoteSource, S: RecordStore> FarmViewModel<R, S> {
    pub fn new(repository: FarmRepository<R, S>) -> Self {
        let records = repository.records();
        let (state, _) = watch::channel(FarmUiState {
            farms: records.current(),
            ..FarmUiState::default()
        });
        let state = Arc::new(state);
        let cancel = CancellationToken::new();

        tokio::spawn(forward_records(
            records,
            Arc::clone(&state),
            cancel.clone(),
        ));

        let view_model = Self {
            repository,
            state,
            cancel,
        };
        view_model.refresh_in_background();
        view_model
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<FarmUiState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> FarmUiState {
        self.state.borrow().clone()
    }

    pub fn repository(&self) -> &FarmRepository<R, S> {
        &self.repository
    }

    /// Run one refresh cycle and settle the loading/error fields.
    ///
    /// Never fails: a refresh error becomes `state.error`.
    pub async fn refresh(&self) {
        run_refresh(&self.repository, &self.state, &self.cancel).await;
    }

    /// Start a refresh without waiting for it (pull-to-refresh).
    pub fn refresh_in_background(&self) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            run_refresh(&repository, &state, &cancel).await;
        })
    }

    /// Stop forwarding records and abandon refreshes that have not
    /// started writing yet.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<R: RemoteSource, S: RecordStore> Drop for FarmViewModel<R, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_refresh<R: RemoteSource, S: RecordStore>(
    repository: &FarmRepository<R, S>,
    state: &watch::Sender<FarmUiState>,
    cancel: &CancellationToken,
) {
    state.send_modify(|s| {
        s.is_loading = true;
        s.error = None;
    });

    match repository.refresh_with_cancel(cancel).await {
        Ok(report) => debug!(farms = report.fetched, "view refresh finished"),
        Err(RefreshError::Cancelled) => debug!("view refresh cancelled"),
        Err(e) => {
            let message = e.to_string();
            state.send_modify(|s| s.error = Some(message));
        }
    }

    state.send_modify(|s| s.is_loading = false);
}

/// Copy every record emission into `state.farms` until cancelled or the
/// store goes away.
async fn forward_records(
    mut records: FarmStream,
    state: Arc<watch::Sender<FarmUiState>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = records.changed() => {
                let Some(farms) = next else { break };
                state.send_modify(|s| s.farms = farms);
            }
        }
    }
    debug!("record bridge stopped");
}

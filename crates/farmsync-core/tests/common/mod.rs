#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use farmsync_core::{
    FarmDto, FarmUiState, NetworkError, RecordStore, RecordStream, SnapshotPublisher,
    SqliteFarmStore, StorageError, StoredFarm,
};
use tokio::sync::watch;

pub fn t1() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().unwrap()
}

pub fn dto(id: i64, name: &str) -> FarmDto {
    FarmDto {
        id,
        name: name.into(),
        licensed_area: Some(12.5),
        updated_at: t1(),
    }
}

/// Remote that replays a script of results. The last entry repeats once
/// the script is exhausted.
pub struct ScriptedRemote {
    script: Mutex<VecDeque<Result<Vec<FarmDto>, String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedRemote {
    pub fn new(script: Vec<Result<Vec<FarmDto>, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    pub fn ok(farms: Vec<FarmDto>) -> Arc<Self> {
        Self::new(vec![Ok(farms)])
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(vec![Err(message.to_owned())])
    }

    pub fn delayed(farms: Vec<FarmDto>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(vec![Ok(farms)].into()),
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl farmsync_core::RemoteSource for ScriptedRemote {
    async fn fetch_all(&self) -> Result<Vec<FarmDto>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
            }
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.map_err(NetworkError::new)
    }
}

/// Store whose reads work but whose writes always fail.
pub struct BrokenStore {
    publisher: SnapshotPublisher<StoredFarm>,
}

impl BrokenStore {
    pub fn new() -> Self {
        Self {
            publisher: SnapshotPublisher::new(Vec::new()),
        }
    }
}

impl RecordStore for BrokenStore {
    fn observe(&self) -> RecordStream<StoredFarm> {
        self.publisher.subscribe()
    }

    fn snapshot(&self) -> Arc<Vec<StoredFarm>> {
        self.publisher.snapshot()
    }

    async fn replace_all(&self, _records: Vec<StoredFarm>) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }

    async fn mirror_all(&self, _records: Vec<StoredFarm>) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }
}

pub fn memory_store() -> SqliteFarmStore {
    SqliteFarmStore::open_in_memory().unwrap()
}

pub fn names(farms: &[farmsync_core::Farm]) -> Vec<&str> {
    farms.iter().map(|f| f.name.as_str()).collect()
}

/// Wait (bounded) until the view state satisfies `pred`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<FarmUiState>,
    pred: impl FnMut(&FarmUiState) -> bool,
) -> FarmUiState {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for view state")
        .expect("view state channel closed")
        .clone()
}

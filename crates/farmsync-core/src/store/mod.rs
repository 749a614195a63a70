// ── Record store ──
//
// Durable keyed storage of farm records with push-based change
// notification. The store owns its locking discipline; callers share it
// freely across repositories.

mod migrations;
mod publisher;
mod sqlite;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::stream::RecordStream;

pub use migrations::latest_version;
pub use publisher::SnapshotPublisher;
pub use sqlite::SqliteFarmStore;

/// Persistence-layer representation of a farm. Owned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFarm {
    pub id: i64,
    pub name: String,
    pub licensed_area: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Contract between the synchronizer and durable storage.
///
/// Snapshots are always ordered ascending by name (ties broken by id).
/// Writes are all-or-nothing, and subscribers only ever see the state
/// before or after a write, never in between.
pub trait RecordStore: Send + Sync + 'static {
    /// Subscribe to the ordered record set. The returned stream starts
    /// at the current snapshot and yields a new one after every
    /// successful write, each exactly once and in commit order.
    fn observe(&self) -> RecordStream<StoredFarm>;

    /// The current ordered record set.
    fn snapshot(&self) -> Arc<Vec<StoredFarm>>;

    /// Upsert `records` by id. Ids missing from `records` are kept.
    fn replace_all(
        &self,
        records: Vec<StoredFarm>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Upsert `records` by id and delete every id missing from them, in
    /// one transaction.
    fn mirror_all(
        &self,
        records: Vec<StoredFarm>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

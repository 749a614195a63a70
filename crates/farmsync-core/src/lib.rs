//! Observe-then-reconcile synchronization between a durable local store and
//! a remote farm source.
//!
//! - **[`SqliteFarmStore`]** — durable record store. Every committed write
//!   rebuilds an ordered snapshot and queues it for each subscriber, so
//!   subscribers see every write once, in order, and never a half-applied
//!   one.
//!
//! - **[`RemoteSource`]** — the authoritative full farm list.
//!   [`HttpRemote`] implements it on top of `farmsync-api`.
//!
//! - **[`FarmRepository`]** — the synchronizer: [`refresh()`](FarmRepository::refresh)
//!   pulls the remote set and writes it through the store;
//!   [`records()`](FarmRepository::records) exposes the store's stream as
//!   domain [`Farm`] values. Concurrent refreshes are coalesced.
//!
//! - **[`FarmViewModel`]** — presentation state holder producing
//!   [`FarmUiState`] for whatever renders it.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod remote;
pub mod repository;
pub mod store;
pub mod stream;
pub mod view_model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, DatabaseLocation, SyncConfig, TlsVerification, WriteMode};
pub use error::{CoreError, NetworkError, RefreshError, StorageError};
pub use model::Farm;
pub use remote::{HttpRemote, RemoteSource};
pub use repository::{FarmRepository, RefreshReport, RepositoryOptions};
pub use store::{RecordStore, SnapshotPublisher, SqliteFarmStore, StoredFarm};
pub use stream::{FarmStream, RecordChangeStream, RecordStream};
pub use view_model::{FarmUiState, FarmViewModel};

pub use farmsync_api::FarmDto;

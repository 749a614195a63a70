// ── SQLite-backed record store ──
//
// One connection behind a mutex. Every write runs on the blocking pool in
// a single transaction; the ordered snapshot is re-read inside that
// transaction and published only after commit, while the lock is still
// held, so snapshot order always matches commit order.
//
// A database file is opened at most once per process: later opens of the
// same path share the live store, its lock and its subscribers.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use rusqlite::{Connection, params};
use tracing::{debug, info};

use super::migrations::apply_migrations;
use super::publisher::SnapshotPublisher;
use super::{RecordStore, StoredFarm};
use crate::config::DatabaseLocation;
use crate::error::StorageError;
use crate::stream::RecordStream;

const SELECT_ORDERED: &str =
    "SELECT id, name, licensed_area, updated_at FROM farms ORDER BY name, id";

const UPSERT: &str = "INSERT INTO farms (id, name, licensed_area, updated_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(id) DO UPDATE SET
         name = excluded.name,
         licensed_area = excluded.licensed_area,
         updated_at = excluded.updated_at";

type OpenFiles = Mutex<HashMap<PathBuf, Weak<StoreInner>>>;

/// File-backed stores alive in this process, keyed by canonical path.
static OPEN_FILES: OnceLock<OpenFiles> = OnceLock::new();

/// Durable farm store on top of SQLite.
///
/// Cheaply cloneable; clones share the connection and the subscriber
/// queues. Opening a file that is already open in this process returns
/// a handle to the same store.
#[derive(Clone)]
pub struct SqliteFarmStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    publisher: SnapshotPublisher<StoredFarm>,
}

impl SqliteFarmStore {
    /// Open (or create) a database file. Parent directories are created
    /// as needed and pending migrations are applied.
    ///
    /// If the file is already open in this process the existing store is
    /// returned, so every handle sees every write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let key = canonical_key(path)?;

        let mut open_files = OPEN_FILES
            .get_or_init(OpenFiles::default)
            .lock()
            .map_err(|_| StorageError::Poisoned)?;
        open_files.retain(|_, inner| inner.strong_count() > 0);

        if let Some(inner) = open_files.get(&key).and_then(Weak::upgrade) {
            debug!(path = %key.display(), "sharing open record store");
            return Ok(Self { inner });
        }

        let conn = Connection::open(&key)?;
        let store = Self::bootstrap(conn, "file")?;
        open_files.insert(key, Arc::downgrade(&store.inner));
        Ok(store)
    }

    /// Open a process-local database that disappears with the store.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, "memory")
    }

    pub fn open_location(location: &DatabaseLocation) -> Result<Self, StorageError> {
        match location {
            DatabaseLocation::File(path) => Self::open(path),
            DatabaseLocation::InMemory => Self::open_in_memory(),
        }
    }

    fn bootstrap(mut conn: Connection, mode: &'static str) -> Result<Self, StorageError> {
        let started_at = Instant::now();
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_migrations(&mut conn)?;
        let initial = load_ordered(&conn)?;

        info!(
            mode,
            farms = initial.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "record store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                publisher: SnapshotPublisher::new(initial),
            }),
        })
    }

    /// Number of committed writes since the store was opened.
    pub fn write_count(&self) -> u64 {
        self.inner.publisher.version()
    }

    async fn write(&self, records: Vec<StoredFarm>, prune: bool) -> Result<(), StorageError> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.write_blocking(&records, prune)).await?
    }
}

impl StoreInner {
    fn write_blocking(&self, records: &[StoredFarm], prune: bool) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let tx = conn.transaction()?;

        {
            let mut upsert = tx.prepare_cached(UPSERT)?;
            for record in records {
                upsert.execute(params![
                    record.id,
                    record.name,
                    record.licensed_area,
                    record.updated_at,
                ])?;
            }
        }

        let mut pruned = 0usize;
        if prune {
            let keep: HashSet<i64> = records.iter().map(|r| r.id).collect();
            let existing: Vec<i64> = {
                let mut stmt = tx.prepare_cached("SELECT id FROM farms")?;
                stmt.query_map([], |row| row.get(0))?
                    .collect::<Result<_, _>>()?
            };
            let mut delete = tx.prepare_cached("DELETE FROM farms WHERE id = ?1")?;
            for id in existing.into_iter().filter(|id| !keep.contains(id)) {
                pruned += delete.execute([id])?;
            }
        }

        let snapshot = load_ordered(&tx)?;
        tx.commit()?;

        debug!(
            written = records.len(),
            pruned,
            total = snapshot.len(),
            "record set committed"
        );
        self.publisher.publish(snapshot);
        Ok(())
    }
}

/// Absolute, symlink-free form of `path`. The file itself may not exist
/// yet; its parent directory must.
fn canonical_key(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match path.file_name() {
        Some(name) => Ok(parent.canonicalize()?.join(name)),
        None => Ok(path.to_path_buf()),
    }
}

fn load_ordered(conn: &Connection) -> Result<Vec<StoredFarm>, StorageError> {
    let mut stmt = conn.prepare_cached(SELECT_ORDERED)?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredFarm {
            id: row.get(0)?,
            name: row.get(1)?,
            licensed_area: row.get(2)?,
            updated_at: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

impl RecordStore for SqliteFarmStore {
    fn observe(&self) -> RecordStream<StoredFarm> {
        self.inner.publisher.subscribe()
    }

    fn snapshot(&self) -> Arc<Vec<StoredFarm>> {
        self.inner.publisher.snapshot()
    }

    async fn replace_all(&self, records: Vec<StoredFarm>) -> Result<(), StorageError> {
        self.write(records, false).await
    }

    async fn mirror_all(&self, records: Vec<StoredFarm>) -> Result<(), StorageError> {
        self.write(records, true).await
    }
}

impl fmt::Debug for SqliteFarmStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteFarmStore")
            .field("writes", &self.write_count())
            .finish_non_exhaustive()
    }
}

// ── Schema migrations ──
//
// Ordered migration list applied in one transaction. The applied version
// is mirrored to `PRAGMA user_version`; versions must stay monotonic.

use rusqlite::Connection;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: "CREATE TABLE IF NOT EXISTS farms (
              id            INTEGER PRIMARY KEY NOT NULL,
              name          TEXT NOT NULL,
              licensed_area REAL,
              updated_at    TEXT NOT NULL
          );
          CREATE INDEX IF NOT EXISTS idx_farms_name ON farms (name, id);",
}];

/// Latest schema version known by this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Apply every migration newer than the database's `user_version`.
pub(crate) fn apply_migrations(conn: &mut Connection) -> Result<(), StorageError> {
    let current = current_user_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(StorageError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> Result<u32, StorageError> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

// ── Runtime sync configuration ──
//
// These types describe *how* to reach the server and where to keep the
// local copy. They carry credential data and tuning, but never touch
// config files. Hosts (CLI, mobile shell) build a `SyncConfig` and hand it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// How to authenticate with the server.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// No session; only useful against open test servers.
    #[default]
    None,
    /// A previously obtained token pair, used as-is.
    Tokens {
        access_token: SecretString,
        refresh_token: SecretString,
    },
    /// Email/password exchanged for a token pair on connect.
    Login {
        email: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed staging servers).
    DangerAcceptInvalid,
}

/// Where the record store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file; parent directories are created on open.
    File(PathBuf),
    /// Process-local database, gone when the store is dropped.
    InMemory,
}

/// How a refresh writes the fetched set into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Insert new ids, overwrite existing ones, keep ids the server no
    /// longer returns.
    #[default]
    Upsert,
    /// Like `Upsert`, then delete every id absent from the fetched set.
    Mirror,
}

/// Configuration for one synchronized farm list.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server base URL (e.g. `https://api.pestscout.app`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Per-request timeout for remote calls.
    pub timeout: Duration,
    pub database: DatabaseLocation,
    pub write_mode: WriteMode,
    /// Coalesce overlapping `refresh()` calls into one fetch.
    pub single_flight: bool,
    /// Background refresh period in seconds. 0 = never.
    pub refresh_interval_secs: u64,
}

impl SyncConfig {
    /// Defaults for everything except the server URL: no credentials,
    /// strict TLS, 30s timeout, in-memory store, upsert writes,
    /// single-flight refresh, no background refresh.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth: AuthCredentials::None,
            tls: TlsVerification::SystemDefaults,
            timeout: Duration::from_secs(30),
            database: DatabaseLocation::InMemory,
            write_mode: WriteMode::Upsert,
            single_flight: true,
            refresh_interval_secs: 0,
        }
    }
}

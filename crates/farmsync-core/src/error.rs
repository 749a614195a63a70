// ── Core error types ──
//
// Three layers, matching the data flow: a remote source fails with
// `NetworkError`, the store with `StorageError`, and the repository wraps
// either into `RefreshError`. `CoreError` covers setup (config, login,
// opening the store). Consumers never see `reqwest` or HTTP status codes.

use std::sync::Arc;

use thiserror::Error;

// ── Remote ───────────────────────────────────────────────────────────

/// Failure of a remote fetch.
///
/// Transport, authentication and decoding failures are not distinguished
/// for the caller; only the message is meaningful. The originating API
/// error is kept as the `source()` for logging.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NetworkError {
    message: String,
    #[source]
    source: Option<farmsync_api::Error>,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<farmsync_api::Error> for NetworkError {
    fn from(err: farmsync_api::Error) -> Self {
        Self {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────────

/// Failure of the durable record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("storage connection lock poisoned")]
    Poisoned,
}

// ── Refresh ──────────────────────────────────────────────────────────

/// Failure of one refresh cycle.
///
/// `Clone` so a coalesced refresh can hand the same outcome to every
/// waiting caller. `Display` is the underlying message verbatim.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Network(Arc<NetworkError>),

    #[error(transparent)]
    Storage(Arc<StorageError>),

    #[error("refresh cancelled")]
    Cancelled,
}

impl RefreshError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<NetworkError> for RefreshError {
    fn from(err: NetworkError) -> Self {
        Self::Network(Arc::new(err))
    }
}

impl From<StorageError> for RefreshError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Arc::new(err))
    }
}

// ── Setup ────────────────────────────────────────────────────────────

/// Errors raised while wiring a repository from configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Server request timed out")]
    Timeout,

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<farmsync_api::Error> for CoreError {
    fn from(err: farmsync_api::Error) -> Self {
        use farmsync_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "no session -- configure credentials".into(),
            },
            Api::Transport(ref e) if e.is_timeout() => CoreError::Timeout,
            Api::Transport(ref e) if e.is_connect() => CoreError::ConnectionFailed {
                url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            Api::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response: {message}"),
                status: None,
            },
        }
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use farmsync_config::ConfigError;
use farmsync_core::{CoreError, RefreshError, StorageError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const STORAGE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(farmsync::connection_failed),
        help(
            "Check that the server is reachable.\n\
             URL: {url}\n\
             Self-signed staging server? Try --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(farmsync::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(farmsync::auth_failed),
        help(
            "Verify your email and password.\n\
             Run: farmsync config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(farmsync::no_credentials),
        help(
            "Configure credentials with: farmsync config init\n\
             Or set FARMSYNC_EMAIL and FARMSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Sync ─────────────────────────────────────────────────────────

    #[error("Refresh failed: {message}")]
    #[diagnostic(
        code(farmsync::refresh_failed),
        help("The local copy is unchanged. Run: farmsync farms list")
    )]
    RefreshFailed { message: String },

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(farmsync::api_error))]
    ApiError { status: String, message: String },

    // ── Storage ──────────────────────────────────────────────────────

    #[error("Local database error: {message}")]
    #[diagnostic(
        code(farmsync::storage),
        help(
            "Check the database path (--database or the profile's `database`).\n\
             The file only holds a copy of server data and can be deleted."
        )
    )]
    Storage { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(farmsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(farmsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: farmsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(farmsync::no_config),
        help(
            "Create one with: farmsync config init\n\
             Or pass --server and --email.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{message}")]
    #[diagnostic(code(farmsync::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Storage { .. } => exit_code::STORAGE,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Api { message, status } => CliError::ApiError {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Storage(e) => e.into(),
            CoreError::Refresh(e) => e.into(),
        }
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        CliError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<RefreshError> for CliError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Storage(e) => CliError::Storage {
                message: e.to_string(),
            },
            other => CliError::RefreshFailed {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

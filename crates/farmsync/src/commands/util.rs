//! Shared helpers for command handlers.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use farmsync_core::{Farm, SqliteFarmStore};
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use crate::error::CliError;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct FarmRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Area (ha)")]
    area: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Farm> for FarmRow {
    fn from(f: &Farm) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            area: f.licensed_area.map(|a| format!("{a:.2}")).unwrap_or_default(),
            updated: f.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Open the SQLite store off the async runtime.
pub async fn open_store(path: PathBuf) -> Result<SqliteFarmStore, CliError> {
    tracing::debug!(path = %path.display(), "opening local store");
    tokio::task::spawn_blocking(move || SqliteFarmStore::open(path))
        .await
        .map_err(|e| CliError::Storage {
            message: e.to_string(),
        })?
        .map_err(CliError::from)
}

/// Stderr spinner; hidden in quiet mode.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

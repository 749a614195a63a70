//! `watch`: drive a view model and print every state change.

use std::time::Duration;

use chrono::Local;
use farmsync_core::{Farm, FarmRepository, FarmUiState, FarmViewModel};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::FarmRow;

/// One state change as emitted in structured formats.
#[derive(Serialize)]
struct StateEvent<'a> {
    at: String,
    is_loading: bool,
    error: Option<&'a str>,
    farms: &'a [Farm],
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let sync = config::resolve_sync_config(global, &cfg)?;
    let interval = args.interval.unwrap_or(sync.refresh_interval_secs);

    let repository = FarmRepository::connect(&sync).await?;
    let view_model = FarmViewModel::new(repository.clone());
    let cancel = CancellationToken::new();
    let periodic = (interval > 0).then(|| {
        repository.spawn_periodic_refresh(Duration::from_secs(interval), cancel.clone())
    });
    info!(url = %sync.url, interval, "watching farm list");

    let color = output::should_color(&global.color);
    let mut state = view_model.state();
    let mut printer = StatePrinter::new(global, color);
    printer.print(&state.borrow_and_update().clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                printer.print(&snapshot);
            }
        }
    }

    debug!("stopping watch");
    cancel.cancel();
    view_model.shutdown();
    if let Some(handle) = periodic {
        join_periodic(handle).await;
    }
    Ok(())
}

/// Wait for the periodic refresh task to stop. Returns `false` (after
/// logging) if it panicked or was aborted.
async fn join_periodic(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "periodic refresh task failed");
            false
        }
    }
}

/// Renders state changes; tables are only reprinted when the farm list
/// actually changed.
struct StatePrinter<'a> {
    global: &'a GlobalOpts,
    color: bool,
    last_farms: Option<Vec<Farm>>,
}

impl<'a> StatePrinter<'a> {
    fn new(global: &'a GlobalOpts, color: bool) -> Self {
        Self {
            global,
            color,
            last_farms: None,
        }
    }

    fn print(&mut self, state: &FarmUiState) {
        let at = Local::now().format("%H:%M:%S").to_string();
        match self.global.output {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                // One event per line.
                let out = Self::render_event(&OutputFormat::JsonCompact, at, state);
                output::print_output(&out, self.global.quiet);
            }
            OutputFormat::Yaml => {
                let out = Self::render_event(&OutputFormat::Yaml, at, state);
                output::print_output(&format!("---\n{}", out.trim_end()), self.global.quiet);
            }
            OutputFormat::Table | OutputFormat::Plain => {
                output::print_output(&self.status_line(&at, state), self.global.quiet);
                let farms_changed = self.last_farms.as_ref() != Some(&state.farms);
                if farms_changed && matches!(self.global.output, OutputFormat::Table) {
                    let table = output::render_list(
                        &OutputFormat::Table,
                        &state.farms,
                        |f| FarmRow::from(f),
                        |f| f.id.to_string(),
                    );
                    output::print_output(&table, self.global.quiet);
                }
            }
        }
        self.last_farms = Some(state.farms.clone());
    }

    fn render_event(format: &OutputFormat, at: String, state: &FarmUiState) -> String {
        let event = StateEvent {
            at,
            is_loading: state.is_loading,
            error: state.error.as_deref(),
            farms: &state.farms,
        };
        output::render_single(format, &event, |_| String::new(), |_| String::new())
    }

    fn status_line(&self, at: &str, state: &FarmUiState) -> String {
        let mut line = format!(
            "{} {} farms",
            output::paint_muted(at, self.color),
            state.farms.len()
        );
        if state.is_loading {
            line.push_str(" · refreshing…");
        }
        if let Some(ref error) = state.error {
            line.push_str(" · ");
            line.push_str(&output::paint_error(&format!("error: {error}"), self.color));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clean_periodic_exit_is_reported_as_such() {
        let handle = tokio::spawn(async {});
        assert!(join_periodic(handle).await);
    }

    #[tokio::test]
    async fn aborted_periodic_task_is_reported() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        assert!(!join_periodic(handle).await);
    }
}

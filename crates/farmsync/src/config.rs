//! CLI configuration -- thin wrapper around `farmsync_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --email, --database, ...).

use std::path::PathBuf;

use farmsync_core::SyncConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use farmsync_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Database file for the active profile: flag > profile > platform default.
pub fn database_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    let profile_name = active_profile_name(global, config);
    global
        .database
        .clone()
        .or_else(|| {
            config
                .profiles
                .get(&profile_name)
                .and_then(|p| p.database.clone())
        })
        .unwrap_or_else(|| farmsync_config::default_database_path(&profile_name))
}

/// Build a `SyncConfig` from the config file, active profile, and flags.
///
/// Without a matching profile, `--server` alone is enough; credentials
/// then come from `--email` plus `FARMSYNC_PASSWORD`.
pub fn resolve_sync_config(global: &GlobalOpts, config: &Config) -> Result<SyncConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.server.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);
    Ok(farmsync_config::profile_to_sync_config(
        &profile,
        &profile_name,
        &config.defaults,
    )?)
}

/// Flag values win over profile values.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if let Some(ref database) = global.database {
        profile.database = Some(database.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

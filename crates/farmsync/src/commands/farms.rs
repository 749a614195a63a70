//! Farm command handlers.

use farmsync_core::{Farm, FarmRepository, RecordStore, WriteMode};

use crate::cli::{FarmsArgs, FarmsCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, FarmRow};

pub async fn handle(args: FarmsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();

    match args.command {
        FarmsCommand::List => {
            let store = util::open_store(config::database_path(global, &cfg)).await?;
            let farms: Vec<Farm> = store.snapshot().iter().map(Farm::from).collect();
            print_farms(&farms, global);
            Ok(())
        }

        FarmsCommand::Refresh { mirror } => {
            let mut sync = config::resolve_sync_config(global, &cfg)?;
            if mirror {
                sync.write_mode = WriteMode::Mirror;
            }

            let connecting = util::spinner("Connecting", global.quiet);
            let repository = FarmRepository::connect(&sync).await;
            connecting.finish_and_clear();
            let repository = repository?;

            let refreshing = util::spinner("Refreshing farms", global.quiet);
            let result = repository.refresh().await;
            refreshing.finish_and_clear();
            let report = result?;

            if !global.quiet {
                eprintln!("✓ Fetched {} farms from {}", report.fetched, sync.url);
            }
            print_farms(&repository.snapshot(), global);
            Ok(())
        }
    }
}

fn print_farms(farms: &[Farm], global: &GlobalOpts) {
    let out = output::render_list(&global.output, farms, |f| FarmRow::from(f), |f| {
        f.id.to_string()
    });
    output::print_output(&out, global.quiet);
}

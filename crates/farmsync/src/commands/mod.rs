//! Command dispatch: bridges CLI args -> core repository -> output formatting.

pub mod config_cmd;
pub mod farms;
pub mod util;
pub mod watch;

use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Farms(args) => farms::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        // Config commands never touch the server or the store
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "farmsync", &mut std::io::stdout());
            Ok(())
        }
    }
}

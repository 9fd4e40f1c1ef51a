//! Command dispatch: bridges CLI args -> integration calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod entities;
pub mod programs;
pub mod scenes;
pub mod util;
pub mod watch;

use smartwash_core::Integration;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an entry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    integration: &Integration,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(integration, args, global),
        Command::Programs(args) => programs::handle(integration, &args, global),
        Command::Entities(args) => entities::handle(integration, args, global).await,
        Command::Scenes(args) => scenes::handle(integration, args, global).await,
        Command::Watch(args) => watch::handle(integration, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "does not run against an entry".into(),
        }),
    }
}

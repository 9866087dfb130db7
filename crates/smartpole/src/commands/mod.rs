//! Command dispatch: bridges CLI args -> `Dashboard` calls -> output formatting.

pub mod assets;
pub mod config_cmd;
pub mod sync;
pub mod telemetry;

use smartpole_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a console-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::TestConnection => sync::test_connection(dashboard, global).await,
        Command::Sync => sync::handle(dashboard, global).await,
        Command::Assets(args) => assets::list_assets(dashboard, &args, global),
        Command::Devices(args) => assets::list_devices(dashboard, &args, global),
        Command::Asset(args) => assets::toggle_asset(dashboard, args),
        Command::Device(args) => assets::toggle_device(dashboard, args),
        Command::Read(args) => telemetry::read(dashboard, &args, global).await,
        Command::Watch(args) => telemetry::watch(dashboard, &args, global).await,
        Command::Config(args) => config_cmd::handle(args, dashboard, global),
    }
}

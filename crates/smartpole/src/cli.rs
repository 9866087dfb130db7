//! Clap derive structures for the `smartpole` command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use smartpole_core::MetricGroup;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// smartpole -- air and water quality telemetry from a doggo console
#[derive(Debug, Parser)]
#[command(
    name = "smartpole",
    version,
    about = "Sync sensor inventories and poll air/water quality telemetry",
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the configuration file
    #[arg(long, env = "SMARTPOLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the console connection settings
    Config(ConfigArgs),

    /// Log in with the stored settings and report the visible assets
    TestConnection,

    /// Discover assets and devices and merge them into the configuration
    Sync,

    /// List configured assets
    Assets(AssetsArgs),

    /// List the devices of one asset
    Devices(DevicesArgs),

    /// Enable or disable an asset
    Asset(AssetArgs),

    /// Enable or disable a device
    Device(DeviceArgs),

    /// Fetch the latest reading once
    Read(ReadArgs),

    /// Poll the latest reading until interrupted
    Watch(WatchArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write the connection settings and store an encrypted password
    Init(ConnectionArgs),

    /// Show the configuration with the password masked
    Show,

    /// Replace the stored password
    SetPassword(PasswordArgs),

    /// Change individual connection settings, keeping the password
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Console base URL (e.g. https://console.example.com)
    #[arg(long)]
    pub endpoint: String,

    #[arg(long)]
    pub username: String,

    /// Request timeout in seconds (1-300)
    #[arg(long, default_value_t = smartpole_core::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Accept self-signed certificates
    #[arg(long, short = 'k', conflicts_with = "ca_cert")]
    pub insecure: bool,

    /// Extra CA certificate (PEM)
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,

    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(Debug, Args)]
pub struct PasswordArgs {
    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// Request timeout in seconds (1-300)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept self-signed certificates
    #[arg(long)]
    pub insecure: Option<bool>,

    /// Extra CA certificate (PEM)
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,
}

// ── Inventory ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AssetsArgs {
    /// Include disabled and orphaned assets
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Asset ID
    pub asset: String,

    /// Include disabled and orphaned devices
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct AssetArgs {
    #[command(subcommand)]
    pub command: AssetCommand,
}

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    Enable { id: String },
    Disable { id: String },
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    Enable { asset: String, device: String },
    Disable { asset: String, device: String },
}

// ── Telemetry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupArg {
    /// Air quality only
    Air,
    /// Air quality plus water pH
    AirWater,
}

impl From<GroupArg> for MetricGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Air => Self::Air,
            GroupArg::AirWater => Self::AirWater,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    pub group: GroupArg,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    pub group: GroupArg,

    /// Poll interval in milliseconds (default: the asset's configured interval)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many polls
    #[arg(long)]
    pub count: Option<u64>,
}

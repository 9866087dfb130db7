//! Asset and device listing and enable/disable toggles.

use tabled::Tabled;

use smartpole_core::{Asset, Dashboard, Device, DeviceRole, RoleMatcher};

use crate::cli::{AssetArgs, AssetCommand, AssetsArgs, DeviceArgs, DeviceCommand, DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, yes_no};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Interval (ms)")]
    interval_ms: u64,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Orphaned")]
    orphaned: &'static str,
}

impl From<&Asset> for AssetRow {
    fn from(a: &Asset) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            enabled: yes_no(a.enabled),
            interval_ms: a.interval_ms,
            devices: a.devices.len(),
            orphaned: yes_no(a.orphaned),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Interval (ms)")]
    interval_ms: u64,
    #[tabled(rename = "Orphaned")]
    orphaned: &'static str,
}

fn device_row(d: &Device, roles: &RoleMatcher) -> DeviceRow {
    let role = [DeviceRole::Air, DeviceRole::Water]
        .into_iter()
        .find(|role| roles.matches(*role, &d.name))
        .map_or_else(|| "-".to_owned(), |role| role.to_string());
    DeviceRow {
        id: d.id.clone(),
        name: d.name.clone(),
        role,
        enabled: yes_no(d.enabled),
        interval_ms: d.interval_ms,
        orphaned: yes_no(d.orphaned),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn list_assets(
    dashboard: &Dashboard,
    args: &AssetsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let assets = if args.all {
        dashboard.assets()?
    } else {
        dashboard.enabled_assets()?
    };
    let out = output::render_list(global.output, &assets, |a| AssetRow::from(a))?;
    output::print_output(&out);
    Ok(())
}

pub fn list_devices(
    dashboard: &Dashboard,
    args: &DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let devices = if args.all {
        let config = dashboard.config()?;
        config
            .asset(&args.asset)
            .map(|a| a.devices.clone())
            .ok_or_else(|| CliError::NotFound {
                resource_type: "Asset".into(),
                identifier: args.asset.clone(),
                list_command: "assets --all".into(),
            })?
    } else {
        dashboard.enabled_devices(&args.asset)?
    };

    let roles = dashboard.telemetry().roles();
    let out = output::render_list(global.output, &devices, |d| device_row(d, roles))?;
    output::print_output(&out);
    Ok(())
}

pub fn toggle_asset(dashboard: &Dashboard, args: AssetArgs) -> Result<(), CliError> {
    let (id, enabled) = match args.command {
        AssetCommand::Enable { id } => (id, true),
        AssetCommand::Disable { id } => (id, false),
    };
    dashboard.set_asset_enabled(&id, enabled)?;
    eprintln!("Asset {id} {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub fn toggle_device(dashboard: &Dashboard, args: DeviceArgs) -> Result<(), CliError> {
    let (asset, device, enabled) = match args.command {
        DeviceCommand::Enable { asset, device } => (asset, device, true),
        DeviceCommand::Disable { asset, device } => (asset, device, false),
    };
    dashboard.set_device_enabled(&asset, &device, enabled)?;
    eprintln!(
        "Device {device} on asset {asset} {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

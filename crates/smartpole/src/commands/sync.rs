//! `test-connection` and `sync`.

use std::fmt::Write as _;

use tabled::Tabled;

use smartpole_core::{ConnectionReport, Dashboard, SyncReport};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, yes_no};

pub async fn test_connection(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let report = dashboard.test_connection().await?;
    let out = output::render_single(global.output, &report, connection_detail)?;
    output::print_output(&out);
    Ok(())
}

fn connection_detail(report: &ConnectionReport) -> String {
    format!(
        "Connected to {} as {}\nAssets visible: {}",
        report.endpoint, report.username, report.assets
    )
}

#[derive(Tabled)]
struct SyncedAssetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let report = dashboard.sync_assets().await?;
    let out = output::render_single(global.output, &report, sync_detail)?;
    output::print_output(&out);

    for failure in &report.errors {
        eprintln!(
            "warning: asset {} ({}) not synced: {}",
            failure.asset_id, failure.asset_name, failure.error
        );
    }
    Ok(())
}

fn sync_detail(report: &SyncReport) -> String {
    let rows: Vec<SyncedAssetRow> = report
        .assets
        .iter()
        .map(|a| {
            let status = if a.orphaned {
                "orphaned".to_owned()
            } else if let Some(failure) = report.errors.iter().find(|e| e.asset_id == a.id) {
                format!("failed: {}", failure.error.kind())
            } else {
                "ok".to_owned()
            };
            SyncedAssetRow {
                id: a.id.clone(),
                name: a.name.clone(),
                devices: a.devices.len(),
                enabled: yes_no(a.enabled),
                status,
            }
        })
        .collect();

    let mut out = output::table(&rows);
    let _ = write!(out, "\n{}", report.summary());
    out
}

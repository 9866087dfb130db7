//! `read` and `watch`: latest readings with cache fallback.

use std::fmt::Write as _;
use std::time::Duration;

use tabled::Tabled;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use smartpole_core::{
    DEFAULT_INTERVAL_MS, Dashboard, DeviceRole, LatestReading, MetricGroup, RoleMatcher,
    SyncConfig,
};

use crate::cli::{GlobalOpts, OutputFormat, ReadArgs, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn latest_detail(latest: &LatestReading) -> String {
    let mut out = String::new();
    let status = if latest.stale { "stale" } else { "fresh" };
    let _ = writeln!(out, "Group:    {}", latest.group);
    let _ = writeln!(out, "Status:   {status}");
    if let Some(ref message) = latest.message {
        let _ = writeln!(out, "Message:  {message}");
    }

    match &latest.data {
        Some(reading) => {
            let _ = writeln!(out, "Observed: {}", reading.observed_at.to_rfc3339());
            let rows: Vec<MetricRow> = reading
                .metrics
                .iter()
                .map(|(metric, value)| MetricRow {
                    metric: metric.to_string(),
                    value: format!("{value:.2}"),
                })
                .collect();
            out.push_str(&output::table(&rows));
        }
        None => out.push_str("No reading available yet"),
    }
    out
}

fn render_latest(format: OutputFormat, latest: &LatestReading) -> Result<String, CliError> {
    output::render_single(format, latest, latest_detail)
}

pub async fn read(dashboard: &Dashboard, args: &ReadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let latest = dashboard.latest(MetricGroup::from(args.group)).await?;
    output::print_output(&render_latest(global.output, &latest)?);
    Ok(())
}

/// Poll period: the air device's interval on the first enabled asset,
/// else the asset's own interval.
fn poll_interval_ms(config: &SyncConfig, roles: &RoleMatcher) -> u64 {
    config
        .assets
        .iter()
        .find(|a| a.enabled && !a.orphaned)
        .map_or(DEFAULT_INTERVAL_MS, |asset| {
            roles
                .find(DeviceRole::Air, asset.enabled_devices())
                .map_or(asset.interval_ms, |d| d.interval_ms)
        })
}

pub async fn watch(
    dashboard: &Dashboard,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let group = MetricGroup::from(args.group);
    let period_ms = match args.interval_ms {
        Some(ms) => ms,
        None => poll_interval_ms(&dashboard.config()?, dashboard.telemetry().roles()),
    };
    debug!(%group, period_ms, "watching");

    let mut ticker = tokio::time::interval(Duration::from_millis(period_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut polls: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let latest = dashboard.latest_until(group, &cancel).await?;
        output::print_output(&render_latest(global.output, &latest)?);

        polls += 1;
        if args.count.is_some_and(|n| polls >= n) {
            break;
        }
    }

    debug!(polls, "watch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use smartpole_core::{Asset, Device, Metric, Reading};

    use super::*;

    #[test]
    fn interval_follows_air_device() {
        let mut asset = Asset::discovered("12", "North Pole");
        asset.interval_ms = 4000;
        asset.devices.push(Device {
            interval_ms: 2500,
            ..Device::discovered("301", "Air Sensor")
        });
        let mut config = SyncConfig::default();
        config.assets.push(asset);

        let roles = RoleMatcher::default();
        assert_eq!(poll_interval_ms(&config, &roles), 2500);

        config.assets[0].devices[0].enabled = false;
        assert_eq!(poll_interval_ms(&config, &roles), 4000);

        config.assets[0].enabled = false;
        assert_eq!(poll_interval_ms(&config, &roles), DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn stale_detail_shows_reason_and_values() {
        let reading = Reading::new(MetricGroup::Air).with_metric(Metric::Co, Some(1.5));
        let latest = LatestReading {
            group: MetricGroup::Air,
            success: true,
            stale: true,
            message: Some("fetch failed: timeout".into()),
            data: Some(Arc::new(reading)),
        };

        let text = latest_detail(&latest);
        assert!(text.contains("stale"));
        assert!(text.contains("fetch failed"));
        assert!(text.contains("1.50"));
    }
}

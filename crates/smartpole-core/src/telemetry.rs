// ── Latest-reading fallback path ──
//
// Every poll either returns a fresh complete reading or degrades to the
// last complete one for the same group. Only an invalid configuration is
// surfaced as an error; transport, auth, and payload failures are logged
// and absorbed.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{DeviceRole, LatestReading, MetricGroup, Reading, RoleMatcher};
use crate::session::{Session, SessionManager};

// ── TelemetryCache ───────────────────────────────────────────────

/// Last complete reading per metric group.
///
/// Slots start empty, are replaced only by complete readings, and never
/// expire.
#[derive(Debug, Default)]
pub struct TelemetryCache {
    air: ArcSwapOption<Reading>,
    air_water: ArcSwapOption<Reading>,
}

impl TelemetryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, group: MetricGroup) -> &ArcSwapOption<Reading> {
        match group {
            MetricGroup::Air => &self.air,
            MetricGroup::AirWater => &self.air_water,
        }
    }

    pub fn last_complete(&self, group: MetricGroup) -> Option<Arc<Reading>> {
        self.slot(group).load_full()
    }

    /// Store `reading` if it is complete. Returns the stored entry.
    pub fn record(&self, reading: Reading) -> Option<Arc<Reading>> {
        if !reading.is_complete() {
            return None;
        }
        let reading = Arc::new(reading);
        self.slot(reading.group).store(Some(Arc::clone(&reading)));
        Some(reading)
    }
}

// ── Target resolution ────────────────────────────────────────────

/// Remote device ids a poll for one group needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Air { device: i64 },
    AirWater { air: i64, water: i64 },
}

/// Pick the devices for `group` from the first enabled asset.
///
/// Returns the reason as `Err` when nothing suitable is configured.
pub fn resolve_target(
    group: MetricGroup,
    config: &SyncConfig,
    roles: &RoleMatcher,
) -> Result<FetchTarget, String> {
    let asset = config
        .assets
        .iter()
        .find(|a| a.enabled && !a.orphaned)
        .ok_or_else(|| "no enabled asset configured".to_owned())?;

    let device_for = |role: DeviceRole| -> Result<i64, String> {
        let candidates = asset.enabled_devices().filter(|d| !d.orphaned);
        let device = roles
            .find(role, candidates)
            .ok_or_else(|| format!("no enabled {role} device on asset '{}'", asset.name))?;
        device
            .remote_id()
            .ok_or_else(|| format!("{role} device id '{}' is not numeric", device.id))
    };

    match group {
        MetricGroup::Air => Ok(FetchTarget::Air {
            device: device_for(DeviceRole::Air)?,
        }),
        MetricGroup::AirWater => Ok(FetchTarget::AirWater {
            air: device_for(DeviceRole::Air)?,
            water: device_for(DeviceRole::Water)?,
        }),
    }
}

// ── Telemetry ────────────────────────────────────────────────────

pub struct Telemetry {
    sessions: Arc<SessionManager>,
    roles: RoleMatcher,
    cache: TelemetryCache,
}

impl Telemetry {
    pub fn new(sessions: Arc<SessionManager>, roles: RoleMatcher) -> Self {
        Self {
            sessions,
            roles,
            cache: TelemetryCache::new(),
        }
    }

    pub fn cache(&self) -> &TelemetryCache {
        &self.cache
    }

    pub fn roles(&self) -> &RoleMatcher {
        &self.roles
    }

    /// Latest reading for `group`, falling back to the cache.
    ///
    /// Cancelling `cancel` abandons the in-flight request and returns the
    /// cached reading.
    pub async fn get_latest(
        &self,
        group: MetricGroup,
        config: &SyncConfig,
        cancel: &CancellationToken,
    ) -> Result<LatestReading, CoreError> {
        config.resolve(self.sessions.cipher())?;

        let target = match resolve_target(group, config, &self.roles) {
            Ok(target) => target,
            Err(reason) => {
                debug!(%group, %reason, "no device to poll");
                return Ok(LatestReading::stale(
                    group,
                    self.cache.last_complete(group),
                    reason,
                ));
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Degraded::Cancelled),
            result = self.poll(config, target) => result,
        };

        match outcome {
            Ok(reading) => Ok(self.accept(group, reading)),
            Err(Degraded::Config(e)) => Err(e),
            Err(degraded) => {
                let reason = degraded.to_string();
                warn!(%group, %reason, "serving cached reading");
                Ok(LatestReading::stale(
                    group,
                    self.cache.last_complete(group),
                    reason,
                ))
            }
        }
    }

    async fn poll(&self, config: &SyncConfig, target: FetchTarget) -> Result<Reading, Degraded> {
        let session = match self.sessions.ensure_authenticated(config).await {
            Ok(session) => session,
            Err(e @ CoreError::ConfigurationInvalid { .. }) => return Err(Degraded::Config(e)),
            Err(e) => return Err(Degraded::Auth(e)),
        };

        match fetch(&session, target).await {
            Ok(reading) => Ok(reading),
            Err(CoreError::Unauthorized) => {
                self.sessions.invalidate(&session);
                Err(Degraded::Fetch(CoreError::Unauthorized))
            }
            Err(e) => Err(Degraded::Fetch(e)),
        }
    }

    fn accept(&self, group: MetricGroup, reading: Reading) -> LatestReading {
        let missing = reading.missing_metrics();
        if let Some(stored) = self.cache.record(reading) {
            debug!(%group, "fresh reading");
            return LatestReading::fresh(stored);
        }

        let names: Vec<_> = missing.iter().map(ToString::to_string).collect();
        let reason = format!("incomplete reading, missing {}", names.join(", "));
        warn!(%group, %reason, "serving cached reading");
        LatestReading::stale(group, self.cache.last_complete(group), reason)
    }
}

async fn fetch(session: &Session, target: FetchTarget) -> Result<Reading, CoreError> {
    let client = session.client();
    let reading = match target {
        FetchTarget::Air { device } => Reading::from(client.air_sensor_data(device).await?),
        FetchTarget::AirWater { air, water } => {
            Reading::from(client.pole_sensor_data(air, water).await?)
        }
    };
    Ok(reading)
}

/// Why a poll fell back to the cache.
#[derive(Debug, thiserror::Error)]
enum Degraded {
    #[error(transparent)]
    Config(CoreError),
    #[error("authentication failed: {0}")]
    Auth(CoreError),
    #[error("fetch failed: {0}")]
    Fetch(CoreError),
    #[error("request cancelled")]
    Cancelled,
}

// ── Asset/device discovery and merge ──
//
// Device lists are fetched per asset, concurrently, one attempt each. A
// failing asset is recorded in the report and never aborts the others.
// The merge keeps local overrides and is deterministic, so syncing the
// same remote data twice yields the same tree.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use smartpole_api::RemoteDevice;

use crate::credentials::ConfigWriter;
use crate::error::CoreError;
use crate::model::{Asset, Device};
use crate::session::Session;

// ── Discovery input ──────────────────────────────────────────────

/// One asset as seen in the latest discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAsset {
    pub id: String,
    pub name: String,
    /// `None` when the device list could not be fetched.
    pub devices: Option<Vec<DiscoveredDevice>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: String,
}

impl From<&RemoteDevice> for DiscoveredDevice {
    fn from(remote: &RemoteDevice) -> Self {
        Self {
            id: remote.device_id.to_string(),
            name: remote.device_name.clone(),
        }
    }
}

// ── Report ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AssetSyncError {
    pub asset_id: String,
    pub asset_name: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: CoreError,
}

fn serialize_display<S: serde::Serializer>(err: &CoreError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Outcome of one sync pass. Returned even when some assets failed.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// The merged tree as persisted.
    pub assets: Vec<Asset>,
    /// Discovered assets recorded in the tree, failed ones included.
    pub merged: usize,
    /// Devices fetched across all assets that succeeded.
    pub devices: usize,
    pub errors: Vec<AssetSyncError>,
}

impl SyncReport {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        let synced = self.merged.saturating_sub(self.errors.len());
        let mut line = format!(
            "Successfully synced {synced} assets with {} total devices",
            self.devices
        );
        if self.is_partial() {
            line.push_str(&format!(", {} failed", self.errors.len()));
        }
        line
    }
}

// ── DeviceAssetSync ──────────────────────────────────────────────

pub struct DeviceAssetSync {
    writer: Arc<ConfigWriter>,
}

impl DeviceAssetSync {
    /// `writer` is shared with every other editor of the same store.
    pub fn new(writer: Arc<ConfigWriter>) -> Self {
        Self { writer }
    }

    /// Discover devices for every asset in the session's login inventory,
    /// merge into the stored tree, and persist.
    pub async fn sync(&self, session: &Session) -> Result<SyncReport, CoreError> {
        let client = session.client();
        let fetches = session.assets().iter().map(|asset| async move {
            let result = client.device_list_by_asset(asset.asset_id).await;
            (asset, result)
        });

        let mut discovered = Vec::with_capacity(session.assets().len());
        let mut errors = Vec::new();
        let mut devices = 0;

        for (asset, result) in join_all(fetches).await {
            let id = asset.asset_id.to_string();
            let fetched = match result {
                Ok(list) => {
                    debug!(asset_id = %id, count = list.len(), "fetched device list");
                    devices += list.len();
                    Some(list.iter().map(DiscoveredDevice::from).collect())
                }
                Err(e) => {
                    let error = CoreError::from(e);
                    warn!(asset_id = %id, error = %error, "device fetch failed");
                    errors.push(AssetSyncError {
                        asset_id: id.clone(),
                        asset_name: asset.name.clone(),
                        error,
                    });
                    None
                }
            };
            discovered.push(DiscoveredAsset {
                id,
                name: asset.name.clone(),
                devices: fetched,
            });
        }

        // Read after the fetches so toggles made meanwhile are not lost.
        let assets = self.writer.modify(|config| {
            config.assets = merge_inventory(&config.assets, &discovered);
            Ok(config.assets.clone())
        })?;

        let report = SyncReport {
            merged: discovered.len(),
            assets,
            devices,
            errors,
        };
        info!(
            merged = report.merged,
            devices = report.devices,
            failed = report.errors.len(),
            "inventory synced"
        );
        Ok(report)
    }
}

// ── Merge ────────────────────────────────────────────────────────

/// Reconcile `discovered` with the `local` tree.
///
/// Remote entries come first in remote order; local entries missing from
/// the discovery follow in their previous order, flagged `orphaned`.
/// Existing entries keep `enabled` and `interval_ms` and adopt the remote
/// name. An asset whose device fetch failed keeps its local devices.
pub fn merge_inventory(local: &[Asset], discovered: &[DiscoveredAsset]) -> Vec<Asset> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(local.len().max(discovered.len()));

    for remote in discovered {
        if !seen.insert(remote.id.as_str()) {
            continue;
        }
        let existing = local.iter().find(|a| a.id == remote.id);
        let mut asset = match existing {
            Some(prev) => Asset {
                name: remote.name.clone(),
                orphaned: false,
                ..prev.clone()
            },
            None => Asset::discovered(remote.id.clone(), remote.name.clone()),
        };
        if let Some(devices) = &remote.devices {
            asset.devices = merge_devices(&asset.devices, devices);
        }
        merged.push(asset);
    }

    for prev in local {
        if !seen.contains(prev.id.as_str()) {
            merged.push(Asset {
                orphaned: true,
                ..prev.clone()
            });
        }
    }

    merged
}

fn merge_devices(local: &[Device], discovered: &[DiscoveredDevice]) -> Vec<Device> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(local.len().max(discovered.len()));

    for remote in discovered {
        if !seen.insert(remote.id.as_str()) {
            continue;
        }
        let device = match local.iter().find(|d| d.id == remote.id) {
            Some(prev) => Device {
                name: remote.name.clone(),
                orphaned: false,
                ..prev.clone()
            },
            None => Device::discovered(remote.id.clone(), remote.name.clone()),
        };
        merged.push(device);
    }

    for prev in local {
        if !seen.contains(prev.id.as_str()) {
            merged.push(Device {
                orphaned: true,
                ..prev.clone()
            });
        }
    }

    merged
}

// ── Device role classification ──
//
// The console does not tag devices with a type; role comes from the
// device name. Rules are per-role predicates so deployments with other
// naming schemes can swap them out.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::asset::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceRole {
    Air,
    Water,
}

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Maps each [`DeviceRole`] to a predicate over the device name.
#[derive(Clone)]
pub struct RoleMatcher {
    rules: HashMap<DeviceRole, Predicate>,
}

impl RoleMatcher {
    /// Matcher with no rules; nothing classifies.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Replace the rule for `role`.
    #[must_use]
    pub fn with_rule<F>(mut self, role: DeviceRole, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.rules.insert(role, Arc::new(predicate));
        self
    }

    pub fn matches(&self, role: DeviceRole, name: &str) -> bool {
        self.rules.get(&role).is_some_and(|rule| rule(name))
    }

    /// First device in `devices` that matches `role`.
    pub fn find<'a, I>(&self, role: DeviceRole, devices: I) -> Option<&'a Device>
    where
        I: IntoIterator<Item = &'a Device>,
    {
        devices.into_iter().find(|d| self.matches(role, &d.name))
    }
}

impl Default for RoleMatcher {
    /// Case-insensitive substring rules: "air" for air, "ph" for water.
    fn default() -> Self {
        Self::empty()
            .with_rule(DeviceRole::Air, |name| name.to_lowercase().contains("air"))
            .with_rule(DeviceRole::Water, |name| name.to_lowercase().contains("ph"))
    }
}

impl fmt::Debug for RoleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roles: Vec<_> = self.rules.keys().map(ToString::to_string).collect();
        roles.sort();
        f.debug_struct("RoleMatcher").field("roles", &roles).finish()
    }
}

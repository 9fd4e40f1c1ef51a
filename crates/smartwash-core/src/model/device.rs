// ── Device domain types ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smartwash_api::{Device, DeviceStatus, MAIN, Status};

use super::program::Programs;

/// A device together with its normalized status and program catalog.
#[derive(Debug, Clone)]
pub struct FullDevice {
    pub device: Device,
    pub status: DeviceStatus,
    pub programs: Programs,
}

impl FullDevice {
    pub fn device_id(&self) -> &str {
        &self.device.device_id
    }

    pub fn label(&self) -> &str {
        &self.device.label
    }

    /// Only devices whose status has a `main` component are addressable.
    pub fn is_addressable(&self) -> bool {
        self.status.contains_key(MAIN)
    }

    /// Whether `component` reports `capability`.
    pub fn has_capability(&self, component: &str, capability: &str) -> bool {
        self.status
            .get(component)
            .is_some_and(|c| c.contains_key(capability))
    }

    pub fn attribute(&self, component: &str, capability: &str, attribute: &str) -> Option<&Status> {
        self.status.get(component)?.get(capability)?.get(attribute)
    }

    /// The attribute's value, `None` when absent or JSON `null`.
    pub fn attribute_value(
        &self,
        component: &str,
        capability: &str,
        attribute: &str,
    ) -> Option<&serde_json::Value> {
        self.attribute(component, capability, attribute)?.value()
    }

    /// The attribute's value as a string slice, if it is a JSON string.
    pub fn attribute_str(&self, component: &str, capability: &str, attribute: &str) -> Option<&str> {
        self.attribute_value(component, capability, attribute)?
            .as_str()
    }
}

/// MAC address connection for hub devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    pub kind: String,
    pub value: String,
}

/// Registry record describing one physical device to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub hw_version: Option<String>,
    pub sw_version: Option<String>,
    pub suggested_area: Option<String>,
    /// Parent device id when reached through a hub.
    pub via_device: Option<String>,
    pub connections: BTreeSet<Connection>,
    pub configuration_url: String,
    /// Config entries this device belongs to.
    pub config_entries: BTreeSet<String>,
}

// ── Device registry ──
//
// Host-facing records of the physical devices behind a config entry.
// A device may belong to several entries; it is dropped once the last
// entry lets go of it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use smartwash_api::Device;

use crate::model::{Connection, DeviceInfo, FullDevice};
use crate::store::collection::EntityCollection;

pub const CONFIGURATION_URL: &str = "https://account.smartthings.com";

/// Connection kind of a hub's network MAC address.
pub const CONNECTION_NETWORK_MAC: &str = "mac";

/// Build the registry record for one device.
///
/// Hub metadata applies first; OCF and then Viper metadata override it
/// where present.
pub fn device_info(device: &Device, rooms: &BTreeMap<String, String>) -> DeviceInfo {
    let mut info = DeviceInfo {
        device_id: device.device_id.clone(),
        name: device.label.clone(),
        manufacturer: None,
        model: None,
        hw_version: None,
        sw_version: None,
        suggested_area: device
            .room_id
            .as_ref()
            .and_then(|room| rooms.get(room))
            .cloned(),
        via_device: device.parent_device_id.clone(),
        connections: BTreeSet::new(),
        configuration_url: CONFIGURATION_URL.to_owned(),
        config_entries: BTreeSet::new(),
    };

    if let Some(hub) = &device.hub {
        info.sw_version.clone_from(&hub.firmware_version);
        info.model = hub.hardware_type().map(str::to_owned);
        if let Some(mac) = hub.mac_address().filter(|m| !m.is_empty()) {
            info.connections.insert(Connection {
                kind: CONNECTION_NETWORK_MAC.to_owned(),
                value: mac.to_owned(),
            });
        }
    }
    if let Some(ocf) = &device.ocf {
        info.manufacturer.clone_from(&ocf.manufacturer_name);
        info.model = ocf
            .model_number
            .as_deref()
            .and_then(|m| m.split('|').next())
            .map(str::to_owned);
        info.hw_version.clone_from(&ocf.hardware_version);
        info.sw_version.clone_from(&ocf.firmware_version);
    }
    if let Some(viper) = &device.viper {
        info.manufacturer.clone_from(&viper.manufacturer_name);
        info.model.clone_from(&viper.model_name);
        info.hw_version.clone_from(&viper.hardware_version);
        info.sw_version.clone_from(&viper.software_version);
    }
    info
}

/// Registry of device records keyed by vendor device id.
pub struct DeviceRegistry {
    devices: EntityCollection<DeviceInfo>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: EntityCollection::new(),
        }
    }

    /// Create or refresh a record and attach it to `entry_id`. Entries the
    /// device already belongs to are kept.
    pub fn get_or_create(&self, entry_id: &str, mut info: DeviceInfo) -> DeviceInfo {
        if let Some(existing) = self.devices.get(&info.device_id) {
            info.config_entries.clone_from(&existing.config_entries);
        }
        info.config_entries.insert(entry_id.to_owned());
        self.devices.upsert(info.device_id.clone(), info.clone());
        info
    }

    /// Register every device of a setup run, including those without a
    /// `main` component.
    pub fn create_devices(
        &self,
        entry_id: &str,
        devices: &[FullDevice],
        rooms: &BTreeMap<String, String>,
    ) {
        for device in devices {
            self.get_or_create(entry_id, device_info(&device.device, rooms));
        }
        tracing::debug!(entry_id, devices = devices.len(), "device registry updated");
    }

    pub fn device(&self, device_id: &str) -> Option<Arc<DeviceInfo>> {
        self.devices.get(device_id)
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<DeviceInfo>>> {
        self.devices.snapshot()
    }

    pub fn entries_for(&self, entry_id: &str) -> Vec<Arc<DeviceInfo>> {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.config_entries.contains(entry_id))
            .cloned()
            .collect()
    }

    /// Detach a device from `entry_id`. The record is deleted when no
    /// entries remain. Returns `true` if the record changed.
    pub fn remove_config_entry(&self, device_id: &str, entry_id: &str) -> bool {
        let changed = self
            .devices
            .update(device_id, |info| info.config_entries.remove(entry_id));
        if changed
            && self
                .devices
                .get(device_id)
                .is_some_and(|d| d.config_entries.is_empty())
        {
            self.devices.remove(device_id);
            tracing::debug!(device_id, "device removed from registry");
        }
        changed
    }

    /// Detach `entry_id` from every device not in `keep`. Returns the ids
    /// of the detached devices.
    pub fn remove_stale(&self, entry_id: &str, keep: &BTreeSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .entries_for(entry_id)
            .iter()
            .filter(|d| !keep.contains(&d.device_id))
            .map(|d| d.device_id.clone())
            .collect();
        for device_id in &stale {
            self.remove_config_entry(device_id, entry_id);
        }
        stale
    }
}

// ── Central reactive data store ──
//
// Holds the addressable devices, scenes and rooms of one config entry.
// Device events patch status copy-on-write so readers holding an older
// snapshot are never torn.

pub(crate) mod collection;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use smartwash_api::{Attribute, DeviceEvent, Scene, Status};

use crate::model::FullDevice;
use crate::program::process_programs;
use collection::EntityCollection;

/// Reactive store for one config entry's runtime data.
pub struct DeviceStore {
    devices: EntityCollection<FullDevice>,
    scenes: EntityCollection<Scene>,
    rooms: watch::Sender<Arc<BTreeMap<String, String>>>,
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStore {
    pub fn new() -> Self {
        let (rooms, _) = watch::channel(Arc::new(BTreeMap::new()));
        Self {
            devices: EntityCollection::new(),
            scenes: EntityCollection::new(),
            rooms,
        }
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Insert a device. Devices without a `main` component are rejected.
    pub fn insert_device(&self, device: FullDevice) -> bool {
        if !device.is_addressable() {
            tracing::debug!(device_id = device.device_id(), "skipping device without main component");
            return false;
        }
        self.devices
            .upsert(device.device.device_id.clone(), device);
        true
    }

    pub fn device(&self, device_id: &str) -> Option<Arc<FullDevice>> {
        self.devices.get(device_id)
    }

    pub fn contains_device(&self, device_id: &str) -> bool {
        self.devices.contains(device_id)
    }

    pub fn remove_device(&self, device_id: &str) -> Option<Arc<FullDevice>> {
        self.devices.remove(device_id)
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.keys()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Devices ordered by id.
    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<FullDevice>>> {
        self.devices.snapshot()
    }

    /// Receiver that sees a fresh device snapshot after every mutation.
    pub fn watch_devices(&self) -> watch::Receiver<Arc<Vec<Arc<FullDevice>>>> {
        self.devices.subscribe()
    }

    /// Apply a device event to the stored status.
    ///
    /// Only capabilities already present on the component are patched, so
    /// events for normalized-away capabilities do not resurrect them. The
    /// program catalog is rebuilt when the cycle list itself changes.
    /// Returns `true` if the store changed.
    pub fn apply_event(&self, event: &DeviceEvent) -> bool {
        self.devices.update(&event.device_id, |device| {
            let Some(capability) = device
                .status
                .get_mut(&event.component_id)
                .and_then(|c| c.get_mut(&event.capability))
            else {
                return false;
            };
            let previous = capability.remove(&event.attribute).unwrap_or_default();
            capability.insert(
                event.attribute.clone(),
                Status {
                    value: Some(event.value.clone()),
                    unit: previous.unit,
                    timestamp: Some(Utc::now()),
                    data: event.data.clone(),
                },
            );
            if event.attribute == Attribute::SupportedCycles.as_ref()
                || event.attribute == Attribute::SupportedCourses.as_ref()
            {
                device.programs = process_programs(&device.status);
            }
            true
        })
    }

    // ── Scenes & rooms ───────────────────────────────────────────────

    pub fn set_scenes(&self, scenes: Vec<Scene>) {
        self.scenes.clear();
        for scene in scenes {
            self.scenes.upsert(scene.scene_id.clone(), scene);
        }
    }

    pub fn scene(&self, scene_id: &str) -> Option<Arc<Scene>> {
        self.scenes.get(scene_id)
    }

    pub fn scenes_snapshot(&self) -> Arc<Vec<Arc<Scene>>> {
        self.scenes.snapshot()
    }

    pub fn set_rooms(&self, rooms: BTreeMap<String, String>) {
        self.rooms.send_replace(Arc::new(rooms));
    }

    /// room id -> room name
    pub fn rooms(&self) -> Arc<BTreeMap<String, String>> {
        self.rooms.borrow().clone()
    }

    /// Drop everything (on unload).
    pub fn clear(&self) {
        self.devices.clear();
        self.scenes.clear();
        self.rooms.send_replace(Arc::new(BTreeMap::new()));
    }
}

//! Shared helpers for command handlers.

use std::sync::Arc;

use smartwash_core::{FullDevice, Integration};
use smartwash_api::Scene;

use crate::error::CliError;

/// Resolve a device identifier (id or label, case-insensitive) via the
/// store snapshot.
pub fn resolve_device(
    integration: &Integration,
    identifier: &str,
) -> Result<Arc<FullDevice>, CliError> {
    let snap = integration.store().devices_snapshot();
    snap.iter()
        .find(|d| d.device_id() == identifier)
        .or_else(|| {
            snap.iter()
                .find(|d| d.label().eq_ignore_ascii_case(identifier))
        })
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

/// Resolve a scene identifier (id or name, case-insensitive).
pub fn resolve_scene(integration: &Integration, identifier: &str) -> Result<Arc<Scene>, CliError> {
    let snap = integration.store().scenes_snapshot();
    snap.iter()
        .find(|s| s.scene_id == identifier)
        .or_else(|| {
            snap.iter()
                .find(|s| s.scene_name.eq_ignore_ascii_case(identifier))
        })
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "scene".into(),
            identifier: identifier.into(),
            list_command: "scenes list".into(),
        })
}

/// Room name of a device, if it has one.
pub fn room_name(integration: &Integration, device: &FullDevice) -> Option<String> {
    let room_id = device.device.room_id.as_ref()?;
    integration.store().rooms().get(room_id).cloned()
}

// ── Binary sensor platform ──

use std::sync::Arc;

use smartwash_api::{Attribute, Capability};

use super::AnyEntity;
use crate::command::CommandHandle;
use crate::entity::{Entity, EntityCategory, EntityContext, EntityState, Platform};
use crate::program::translate_value;
use crate::store::DeviceStore;

#[derive(Debug, Clone, Copy)]
pub struct BinarySensorDescription {
    pub capability: Capability,
    pub attribute: Attribute,
    pub key: &'static str,
    pub translation_key: Option<&'static str>,
    pub device_class: Option<&'static str>,
    /// The attribute value that reads as "on".
    pub is_on_key: &'static str,
    pub entity_category: Option<EntityCategory>,
}

const fn sensor(
    capability: Capability,
    attribute: Attribute,
    key: &'static str,
    is_on_key: &'static str,
) -> BinarySensorDescription {
    BinarySensorDescription {
        capability,
        attribute,
        key,
        translation_key: None,
        device_class: None,
        is_on_key,
        entity_category: None,
    }
}

pub const BINARY_SENSORS: &[BinarySensorDescription] = &[
    BinarySensorDescription {
        translation_key: Some("acceleration"),
        device_class: Some("moving"),
        ..sensor(Capability::AccelerationSensor, Attribute::Acceleration, "acceleration", "active")
    },
    BinarySensorDescription {
        device_class: Some("door"),
        ..sensor(Capability::ContactSensor, Attribute::Contact, "contact", "open")
    },
    BinarySensorDescription {
        translation_key: Some("dryer_wrinkle_prevent_active"),
        entity_category: Some(EntityCategory::Diagnostic),
        ..sensor(
            Capability::CustomDryerWrinklePrevent,
            Attribute::OperatingState,
            "operatingState",
            "running",
        )
    },
    BinarySensorDescription {
        translation_key: Some("filter_status"),
        device_class: Some("problem"),
        ..sensor(Capability::FilterStatus, Attribute::FilterStatus, "filterStatus", "replace")
    },
    BinarySensorDescription {
        translation_key: Some("remote_control"),
        ..sensor(
            Capability::RemoteControlStatus,
            Attribute::RemoteControlEnabled,
            "remoteControlEnabled",
            "true",
        )
    },
    BinarySensorDescription {
        translation_key: Some("child_lock"),
        ..sensor(Capability::SamsungCeKidsLock, Attribute::LockState, "lockState", "locked")
    },
    BinarySensorDescription {
        device_class: Some("motion"),
        ..sensor(Capability::MotionSensor, Attribute::Motion, "motion", "active")
    },
    BinarySensorDescription {
        device_class: Some("presence"),
        ..sensor(Capability::PresenceSensor, Attribute::Presence, "presence", "present")
    },
    BinarySensorDescription {
        device_class: Some("sound"),
        ..sensor(Capability::SoundSensor, Attribute::Sound, "sound", "detected")
    },
    BinarySensorDescription {
        device_class: Some("tamper"),
        entity_category: Some(EntityCategory::Diagnostic),
        ..sensor(Capability::TamperAlert, Attribute::Tamper, "tamper", "detected")
    },
    BinarySensorDescription {
        device_class: Some("moisture"),
        ..sensor(Capability::WaterSensor, Attribute::Water, "water", "wet")
    },
    BinarySensorDescription {
        translation_key: Some("door"),
        device_class: Some("opening"),
        ..sensor(Capability::SamsungCeDoorState, Attribute::DoorState, "doorState", "open")
    },
];

/// Sensors derived from the current program rather than a raw attribute.
pub const PROGRAM_BINARY_SENSORS: &[BinarySensorDescription] = &[BinarySensorDescription {
    translation_key: Some("bubblesoak_support"),
    ..sensor(
        Capability::SamsungCeWasherCycle,
        Attribute::WasherCycle,
        "bubblesoak_support",
        "true",
    )
}];

// ── SmartThingsBinarySensor ──────────────────────────────────────────

#[derive(Debug)]
pub struct SmartThingsBinarySensor {
    ctx: EntityContext,
    description: &'static BinarySensorDescription,
    unique_id: String,
}

impl SmartThingsBinarySensor {
    pub fn new(ctx: EntityContext, description: &'static BinarySensorDescription) -> Self {
        let unique_id = format!(
            "{}_{}_{}_{}_{}",
            ctx.device_id(),
            ctx.component(),
            description.capability,
            description.attribute,
            description.key
        );
        Self {
            ctx,
            description,
            unique_id,
        }
    }

    pub fn description(&self) -> &'static BinarySensorDescription {
        self.description
    }

    pub fn is_on(&self) -> bool {
        self.ctx
            .attribute_str(self.description.capability, self.description.attribute)
            .is_some_and(|v| v == self.description.is_on_key)
    }
}

impl Entity for SmartThingsBinarySensor {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        self.description.translation_key
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.description.entity_category
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::On(self.is_on())
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── ProgramBinarySensor ──────────────────────────────────────────────

/// On when the washer's current program supports bubble soak.
#[derive(Debug)]
pub struct ProgramBinarySensor {
    ctx: EntityContext,
    description: &'static BinarySensorDescription,
    unique_id: String,
}

impl ProgramBinarySensor {
    pub fn new(ctx: EntityContext, description: &'static BinarySensorDescription) -> Self {
        let unique_id = format!(
            "{}_{}_{}_{}_{}",
            ctx.device_id(),
            ctx.component(),
            description.capability,
            description.attribute,
            description.attribute
        );
        Self {
            ctx,
            description,
            unique_id,
        }
    }

    /// `false` when the current cycle is not in the program catalog.
    pub fn is_on(&self) -> bool {
        let Some(device) = self.ctx.device() else {
            return false;
        };
        let current = translate_value(device.attribute_value(
            self.ctx.component(),
            self.description.capability.as_ref(),
            self.description.attribute.as_ref(),
        ));
        device.programs.get(&current).is_some_and(|p| p.bubble_soak)
    }
}

impl Entity for ProgramBinarySensor {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        self.description.translation_key
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::On(self.is_on())
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── Setup ────────────────────────────────────────────────────────────

pub(crate) fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Vec<AnyEntity> {
    let devices = store.devices_snapshot();
    let context = |device_id: &str, component: &str, capability| {
        EntityContext::new(
            Arc::clone(store),
            commands.clone(),
            device_id,
            component,
            [capability],
        )
    };

    let mut entities = Vec::new();
    for device in devices.iter() {
        for description in BINARY_SENSORS {
            for component in device.status.keys() {
                if device.has_capability(component, description.capability.as_ref()) {
                    let ctx = context(device.device_id(), component, description.capability);
                    entities.push(AnyEntity::BinarySensor(SmartThingsBinarySensor::new(
                        ctx,
                        description,
                    )));
                }
            }
        }
    }
    for device in devices.iter() {
        for description in PROGRAM_BINARY_SENSORS {
            for component in device.status.keys() {
                if device.has_capability(component, description.capability.as_ref()) {
                    let ctx = context(device.device_id(), component, description.capability);
                    entities.push(AnyEntity::ProgramBinarySensor(ProgramBinarySensor::new(
                        ctx,
                        description,
                    )));
                }
            }
        }
    }
    entities
}

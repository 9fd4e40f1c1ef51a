// ── Switch platform ──
//
// Capability switches (wrinkle prevent, sabbath mode, ...) plus one
// program switch per program and cycle capability.

use std::sync::Arc;

use serde_json::Value;

use smartwash_api::{Attribute, Capability, Command};

use super::AnyEntity;
use crate::command::CommandHandle;
use crate::entity::{Entity, EntityCategory, EntityContext, EntityState, Platform};
use crate::error::CoreError;
use crate::model::FullDevice;
use crate::program::{
    CAPABILITIES_WITH_PROGRAMS, ProgramCapability, get_program_table_id, translate_value,
};
use crate::store::DeviceStore;

/// Static description of a capability switch.
#[derive(Debug, Clone, Copy)]
pub struct SwitchDescription {
    pub capability: Capability,
    pub attribute: Attribute,
    pub key: &'static str,
    /// `None` names the entity after its device.
    pub translation_key: Option<&'static str>,
    /// Command taking `"on"`/`"off"`; `None` sends bare `on`/`off`.
    pub command: Option<Command>,
    pub entity_category: Option<EntityCategory>,
}

pub const SWITCHES: &[SwitchDescription] = &[
    SwitchDescription {
        capability: Capability::CustomDryerWrinklePrevent,
        attribute: Attribute::DryerWrinklePrevent,
        key: "custom.dryerWrinklePrevent",
        translation_key: Some("wrinkle_prevent"),
        command: Some(Command::SetDryerWrinklePrevent),
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::CustomSteamClosetWrinklePrevent,
        attribute: Attribute::SteamClosetWrinklePrevent,
        key: "custom.steamClosetWrinklePrevent",
        translation_key: Some("wrinkle_prevent"),
        command: Some(Command::SetSteamClosetWrinklePrevent),
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::SamsungCeSabbathMode,
        attribute: Attribute::Status,
        key: "samsungce.sabbathMode",
        translation_key: Some("sabbath_mode"),
        command: None,
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::SamsungCeSteamClosetKeepFreshMode,
        attribute: Attribute::Status,
        key: "samsungce.steamClosetKeepFreshMode",
        translation_key: Some("steam_closet_keep_fresh_mode"),
        command: None,
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::SamsungCeSteamClosetSanitizeMode,
        attribute: Attribute::Status,
        key: "samsungce.steamClosetSanitizeMode",
        translation_key: Some("steam_closet_sanitize_mode"),
        command: None,
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::SamsungCeWasherBubbleSoak,
        attribute: Attribute::Status,
        key: "samsungce.washerBubbleSoak",
        translation_key: Some("bubble_soak"),
        command: None,
        entity_category: Some(EntityCategory::Config),
    },
    SwitchDescription {
        capability: Capability::Switch,
        attribute: Attribute::Switch,
        key: "switch",
        translation_key: None,
        command: None,
        entity_category: None,
    },
];

/// A component carrying any of these is a light or fan, not a switch.
const LIGHT_OR_FAN_CAPABILITIES: [Capability; 4] = [
    Capability::SwitchLevel,
    Capability::ColorControl,
    Capability::ColorTemperature,
    Capability::FanSpeed,
];

/// A component carrying all of these is an air conditioner.
const AC_CAPABILITIES: [Capability; 4] = [
    Capability::AirConditionerMode,
    Capability::AirConditionerFanMode,
    Capability::TemperatureMeasurement,
    Capability::ThermostatCoolingSetpoint,
];

fn handled_by_other_platform(device: &FullDevice, component: &str) -> bool {
    let has = |c: &Capability| device.has_capability(component, c.as_ref());
    LIGHT_OR_FAN_CAPABILITIES.iter().any(has) || AC_CAPABILITIES.iter().all(has)
}

// ── SmartThingsSwitch ────────────────────────────────────────────────

#[derive(Debug)]
pub struct SmartThingsSwitch {
    ctx: EntityContext,
    description: &'static SwitchDescription,
    unique_id: String,
}

impl SmartThingsSwitch {
    pub fn new(ctx: EntityContext, description: &'static SwitchDescription) -> Self {
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

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    pub fn description(&self) -> &'static SwitchDescription {
        self.description
    }

    pub fn is_on(&self) -> bool {
        self.ctx
            .attribute_str(self.description.capability, self.description.attribute)
            .is_some_and(|v| v == "on")
    }

    pub async fn turn_on(&self) -> Result<(), CoreError> {
        self.send("on", Command::On).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        self.send("off", Command::Off).await
    }

    async fn send(&self, argument: &str, bare: Command) -> Result<(), CoreError> {
        match self.description.command {
            Some(command) => {
                self.ctx
                    .execute(
                        self.description.capability,
                        command,
                        Some(vec![Value::from(argument)]),
                    )
                    .await
            }
            None => self.ctx.execute(self.description.capability, bare, None).await,
        }
    }
}

impl Entity for SmartThingsSwitch {
    fn platform(&self) -> Platform {
        Platform::Switch
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

// ── ProgramSwitch ────────────────────────────────────────────────────

/// Starts one program; on while that program is the current cycle.
#[derive(Debug)]
pub struct ProgramSwitch {
    ctx: EntityContext,
    program: &'static ProgramCapability,
    program_id: String,
    unique_id: String,
    translation_key: String,
}

impl ProgramSwitch {
    pub fn new(
        ctx: EntityContext,
        program: &'static ProgramCapability,
        program_id: String,
        table_id: &str,
    ) -> Self {
        let program_course = program_id.to_lowercase();
        let translation_key = if table_id.is_empty() {
            program_course.clone()
        } else {
            format!("{table_id}_{program_course}")
        };
        let unique_id = format!(
            "{}_{}_{}_{}_{}",
            ctx.device_id(),
            ctx.component(),
            program.capability,
            program.attribute,
            program_course
        );
        Self {
            ctx,
            program,
            program_id,
            unique_id,
            translation_key,
        }
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    pub fn is_on(&self) -> bool {
        let current = translate_value(
            self.ctx
                .attribute_value(self.program.capability, self.program.attribute)
                .as_ref(),
        );
        !current.is_empty() && current == self.program_id
    }

    pub async fn turn_on(&self) -> Result<(), CoreError> {
        self.ctx
            .execute(
                self.program.capability,
                self.program.command,
                Some(vec![Value::from(self.program_id.as_str())]),
            )
            .await
    }

    /// Programs cannot be switched off; starting another one replaces it.
    pub async fn turn_off(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

impl Entity for ProgramSwitch {
    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        Some(&self.translation_key)
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
    let mut entities = Vec::new();
    for device in store.devices_snapshot().iter() {
        for description in SWITCHES {
            for component in device.status.keys() {
                if !device.has_capability(component, description.capability.as_ref())
                    || handled_by_other_platform(device, component)
                {
                    continue;
                }
                let ctx = EntityContext::new(
                    Arc::clone(store),
                    commands.clone(),
                    device.device_id(),
                    component.clone(),
                    [description.capability],
                );
                entities.push(AnyEntity::Switch(SmartThingsSwitch::new(ctx, description)));
            }
        }

        let table_id = get_program_table_id(&device.status);
        for program_id in device.programs.keys() {
            for program in &CAPABILITIES_WITH_PROGRAMS {
                for component in device.status.keys() {
                    if !device.has_capability(component, program.capability.as_ref()) {
                        continue;
                    }
                    let ctx = EntityContext::new(
                        Arc::clone(store),
                        commands.clone(),
                        device.device_id(),
                        component.clone(),
                        [program.capability],
                    );
                    entities.push(AnyEntity::ProgramSwitch(ProgramSwitch::new(
                        ctx,
                        program,
                        program_id.clone(),
                        &table_id,
                    )));
                }
            }
        }
    }
    entities
}

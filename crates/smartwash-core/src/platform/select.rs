// ── Select platform ──
//
// Capability selects (dry level, spin level, machine state, ...) and one
// program select per cycle capability. Selects bound to a program option
// narrow their option list whenever the device's current program changes.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use smartwash_api::{Attribute, Capability, Command, MAIN};

use super::AnyEntity;
use crate::command::CommandHandle;
use crate::entity::{Entity, EntityCategory, EntityContext, EntityState, Platform};
use crate::error::CoreError;
use crate::model::{FullDevice, SupportedOption};
use crate::program::{
    CAPABILITIES_WITH_PROGRAMS, get_program_options, get_program_table_id,
    translate_program_course, translate_value,
};
use crate::store::DeviceStore;

/// Static description of a select.
#[derive(Debug, Clone, Copy)]
pub struct SelectDescription {
    pub capability: Capability,
    pub attribute: Attribute,
    pub key: &'static str,
    pub translation_key: &'static str,
    pub entity_category: Option<EntityCategory>,
    /// Attribute listing the supported values.
    pub options_attribute: Option<Attribute>,
    pub command: Command,
    /// Program option this select mirrors, if any.
    pub supported_option: Option<SupportedOption>,
    /// Skip on `main` when a program select already covers it.
    pub duplicates_program: bool,
}

const fn select(
    capability: Capability,
    attribute: Attribute,
    key: &'static str,
    translation_key: &'static str,
    options_attribute: Attribute,
    command: Command,
) -> SelectDescription {
    SelectDescription {
        capability,
        attribute,
        key,
        translation_key,
        entity_category: Some(EntityCategory::Config),
        options_attribute: Some(options_attribute),
        command,
        supported_option: None,
        duplicates_program: false,
    }
}

const fn machine_state(capability: Capability, key: &'static str) -> SelectDescription {
    SelectDescription {
        entity_category: None,
        ..select(
            capability,
            Attribute::MachineState,
            key,
            "machine_state",
            Attribute::SupportedMachineStates,
            Command::SetMachineState,
        )
    }
}

const fn program_option(
    description: SelectDescription,
    option: SupportedOption,
) -> SelectDescription {
    SelectDescription {
        supported_option: Some(option),
        ..description
    }
}

pub const SELECTS: &[SelectDescription] = &[
    program_option(
        select(
            Capability::CustomDryerDryLevel,
            Attribute::DryerDryLevel,
            "custom.dryerDryLevel",
            "dryer_dry_level",
            Attribute::SupportedDryerDryLevel,
            Command::SetDryerDryLevel,
        ),
        SupportedOption::DryingLevel,
    ),
    SelectDescription {
        entity_category: None,
        ..select(
            Capability::CustomSteamClosetOperatingState,
            Attribute::SteamClosetMachineState,
            "custom.steamClosetOperatingState",
            "machine_state",
            Attribute::SupportedSteamClosetMachineState,
            Command::SetSteamClosetMachineState,
        )
    },
    SelectDescription {
        duplicates_program: true,
        ..select(
            Capability::CustomSupportedOptions,
            Attribute::Course,
            "course",
            "course",
            Attribute::SupportedCourses,
            Command::SetCourse,
        )
    },
    program_option(
        select(
            Capability::CustomWasherRinseCycles,
            Attribute::WasherRinseCycles,
            "custom.washerRinseCycles",
            "washer_rinse_cycles",
            Attribute::SupportedWasherRinseCycles,
            Command::SetWasherRinseCycles,
        ),
        SupportedOption::RinseCycle,
    ),
    program_option(
        select(
            Capability::CustomWasherSoilLevel,
            Attribute::WasherSoilLevel,
            "custom.washerSoilLevel",
            "washer_soil_level",
            Attribute::SupportedWasherSoilLevel,
            Command::SetWasherSoilLevel,
        ),
        SupportedOption::SoilLevel,
    ),
    program_option(
        select(
            Capability::CustomWasherSpinLevel,
            Attribute::WasherSpinLevel,
            "custom.washerSpinLevel",
            "washer_spin_level",
            Attribute::SupportedWasherSpinLevel,
            Command::SetWasherSpinLevel,
        ),
        SupportedOption::SpinLevel,
    ),
    program_option(
        select(
            Capability::CustomWasherWaterTemperature,
            Attribute::WasherWaterTemperature,
            "custom.washerWaterTemperature",
            "washer_water_temperature",
            Attribute::SupportedWasherWaterTemperature,
            Command::SetWasherWaterTemperature,
        ),
        SupportedOption::WaterTemperature,
    ),
    machine_state(Capability::DishwasherOperatingState, "dishwasherOperatingState"),
    machine_state(Capability::DryerOperatingState, "dryerOperatingState"),
    select(
        Capability::SamsungCeAutoDispenseDetergent,
        Attribute::Amount,
        "samsungce.autoDispenseDetergent",
        "auto_dispense_detergent_amount",
        Attribute::SupportedAmount,
        Command::SetAmount,
    ),
    select(
        Capability::SamsungCeAutoDispenseDetergent,
        Attribute::Density,
        "samsungce.autoDispenseDetergent",
        "auto_dispense_detergent_density",
        Attribute::SupportedDensity,
        Command::SetDensity,
    ),
    select(
        Capability::SamsungCeAutoDispenseSoftener,
        Attribute::Amount,
        "samsungce.autoDispenseSoftener",
        "auto_dispense_softener_amount",
        Attribute::SupportedAmount,
        Command::SetAmount,
    ),
    select(
        Capability::SamsungCeAutoDispenseSoftener,
        Attribute::Density,
        "samsungce.autoDispenseSoftener",
        "auto_dispense_softener_density",
        Attribute::SupportedDensity,
        Command::SetDensity,
    ),
    select(
        Capability::SamsungCeDryerDryingTime,
        Attribute::DryingTime,
        "samsungce.dryerDryingTime",
        "dryer_drying_time",
        Attribute::SupportedDryingTime,
        Command::SetDryingTime,
    ),
    select(
        Capability::SamsungCeDryerDryingTemperature,
        Attribute::DryingTemperature,
        "samsungce.dryerDryingTemperature",
        "dryer_drying_temperature",
        Attribute::SupportedDryingTemperature,
        Command::SetDryingTemperature,
    ),
    machine_state(Capability::WasherOperatingState, "washerOperatingState"),
];

/// Program selects, one per cycle capability.
pub const PROGRAM_SELECTS: &[SelectDescription] = &[
    program_select(
        Capability::SamsungCeDryerCycle,
        Attribute::DryerCycle,
        "dryerCycle",
        Command::SetDryerCycle,
    ),
    program_select(
        Capability::SamsungCeSteamClosetCycle,
        Attribute::SteamClosetCycle,
        "steamClosetCycle",
        Command::SetSteamClosetCycle,
    ),
    program_select(
        Capability::SamsungCeWasherCycle,
        Attribute::WasherCycle,
        "washerCycle",
        Command::SetWasherCycle,
    ),
];

const fn program_select(
    capability: Capability,
    attribute: Attribute,
    key: &'static str,
    command: Command,
) -> SelectDescription {
    SelectDescription {
        capability,
        attribute,
        key,
        translation_key: "cycle",
        entity_category: Some(EntityCategory::Config),
        options_attribute: None,
        command,
        supported_option: None,
        duplicates_program: false,
    }
}

impl SelectDescription {
    fn suppressed_on(&self, device: &FullDevice, component: &str) -> bool {
        self.duplicates_program
            && component == MAIN
            && CAPABILITIES_WITH_PROGRAMS
                .iter()
                .any(|p| device.has_capability(MAIN, p.capability.as_ref()))
    }
}

fn unique_id(ctx: &EntityContext, description: &SelectDescription) -> String {
    format!(
        "{}_{}_{}_{}_{}",
        ctx.device_id(),
        ctx.component(),
        description.capability,
        description.attribute,
        description.key
    )
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── SmartThingsSelect ────────────────────────────────────────────────

#[derive(Debug)]
pub struct SmartThingsSelect {
    ctx: EntityContext,
    description: &'static SelectDescription,
    unique_id: String,
    options: watch::Sender<Vec<String>>,
}

impl SmartThingsSelect {
    pub fn new(ctx: EntityContext, description: &'static SelectDescription) -> Self {
        let initial = description
            .options_attribute
            .and_then(|attr| ctx.attribute_list(description.capability, attr))
            .unwrap_or_default();
        let (options, _) = watch::channel(initial);
        Self {
            unique_id: unique_id(&ctx, description),
            ctx,
            description,
            options,
        }
    }

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    pub fn description(&self) -> &'static SelectDescription {
        self.description
    }

    pub fn options(&self) -> Vec<String> {
        self.options.borrow().clone()
    }

    /// Watch option list replacements.
    pub fn subscribe_options(&self) -> watch::Receiver<Vec<String>> {
        self.options.subscribe()
    }

    pub fn native_value(&self) -> Option<String> {
        self.ctx
            .attribute_value(self.description.capability, self.description.attribute)
            .and_then(value_text)
    }

    /// The value, if it is one of the current options.
    pub fn current_option(&self) -> Option<String> {
        self.native_value()
            .filter(|v| self.options.borrow().iter().any(|o| o == v))
    }

    pub async fn select_option(&self, option: &str) -> Result<(), CoreError> {
        let options = self.options();
        if !options.iter().any(|o| o == option) {
            return Err(CoreError::InvalidOption {
                option: option.to_owned(),
                options,
            });
        }
        self.ctx
            .execute(
                self.description.capability,
                self.description.command,
                Some(vec![Value::from(option)]),
            )
            .await
    }

    pub fn update_options(&self, options: Vec<String>) {
        tracing::debug!(unique_id = %self.unique_id, ?options, "select options updated");
        self.options.send_replace(options);
    }

    /// Re-derive the option list after the device's program changed to
    /// `program_state` (the program select's state, e.g. `course_1c`).
    ///
    /// With remote control disabled the capability's own supported values
    /// apply; otherwise the program catalog's values for this option do.
    /// Returns `true` if the list was replaced.
    pub fn refresh_options(&self, program_state: &str) -> bool {
        let Some(supported_option) = self.description.supported_option else {
            return false;
        };

        let remote_disabled = self
            .ctx
            .attribute_str(Capability::RemoteControlStatus, Attribute::RemoteControlEnabled)
            .is_some_and(|v| v == "false");

        let options = if remote_disabled {
            self.description
                .options_attribute
                .and_then(|attr| self.ctx.attribute_list(self.description.capability, attr))
                .map(|list| list.iter().map(|o| o.to_lowercase()).collect())
        } else {
            let program_id = translate_program_course(Some(program_state), true);
            self.ctx.device().and_then(|device| {
                get_program_options(&device.programs, &program_id, supported_option)
                    .map(|opts| opts.iter().cloned().collect())
            })
        };

        match options {
            Some(options) => {
                self.update_options(options);
                true
            }
            None => false,
        }
    }
}

impl Entity for SmartThingsSelect {
    fn platform(&self) -> Platform {
        Platform::Select
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        Some(self.description.translation_key)
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.description.entity_category
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::Text(self.current_option())
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── ProgramSelect ────────────────────────────────────────────────────

/// Picks the device's current cycle from its program catalog.
#[derive(Debug)]
pub struct ProgramSelect {
    ctx: EntityContext,
    description: &'static SelectDescription,
    unique_id: String,
    translation_key: String,
    options: Vec<String>,
}

impl ProgramSelect {
    pub fn new(ctx: EntityContext, description: &'static SelectDescription) -> Self {
        let device = ctx.device();
        let table_id = device
            .as_deref()
            .map(|d| get_program_table_id(&d.status))
            .unwrap_or_default();
        let translation_key = if table_id.is_empty() {
            description.translation_key.to_owned()
        } else {
            format!("{}_{table_id}", description.translation_key)
        };
        let options = device
            .map(|d| d.programs.keys().map(|p| p.to_lowercase()).collect())
            .unwrap_or_default();
        Self {
            unique_id: unique_id(&ctx, description),
            ctx,
            description,
            translation_key,
            options,
        }
    }

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    pub fn description(&self) -> &'static SelectDescription {
        self.description
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Lower-cased display key of the current cycle, `""` when unknown.
    pub fn native_value(&self) -> String {
        translate_value(
            self.ctx
                .attribute_value(self.description.capability, self.description.attribute)
                .as_ref(),
        )
        .to_lowercase()
    }

    pub fn current_option(&self) -> Option<String> {
        let value = self.native_value();
        self.options.contains(&value).then_some(value)
    }

    /// Start the cycle for `option` (a lower-cased program id).
    pub async fn select_option(&self, option: &str) -> Result<(), CoreError> {
        if !self.options.iter().any(|o| o == option) {
            return Err(CoreError::InvalidOption {
                option: option.to_owned(),
                options: self.options.clone(),
            });
        }
        let program_id = translate_program_course(Some(option), true);
        self.ctx
            .execute(
                self.description.capability,
                self.description.command,
                Some(vec![Value::from(program_id)]),
            )
            .await
    }
}

impl Entity for ProgramSelect {
    fn platform(&self) -> Platform {
        Platform::Select
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        Some(&self.translation_key)
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.description.entity_category
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::Text(self.current_option())
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── Setup ────────────────────────────────────────────────────────────

pub(crate) fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Vec<AnyEntity> {
    let mut entities = Vec::new();
    let devices = store.devices_snapshot();

    for device in devices.iter() {
        for description in SELECTS {
            for component in device.status.keys() {
                if !device.has_capability(component, description.capability.as_ref())
                    || description.suppressed_on(device, component)
                {
                    continue;
                }
                let mut capabilities = vec![description.capability];
                if description.supported_option.is_some() {
                    capabilities.push(Capability::RemoteControlStatus);
                }
                let ctx = EntityContext::new(
                    Arc::clone(store),
                    commands.clone(),
                    device.device_id(),
                    component.clone(),
                    capabilities,
                );
                entities.push(AnyEntity::Select(SmartThingsSelect::new(ctx, description)));
            }
        }
    }

    for device in devices.iter() {
        for description in PROGRAM_SELECTS {
            for component in device.status.keys() {
                if !device.has_capability(component, description.capability.as_ref()) {
                    continue;
                }
                let ctx = EntityContext::new(
                    Arc::clone(store),
                    commands.clone(),
                    device.device_id(),
                    component.clone(),
                    [description.capability],
                );
                entities.push(AnyEntity::ProgramSelect(ProgramSelect::new(ctx, description)));
            }
        }
    }
    entities
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Command as CoreCommand;
    use crate::entity::testing::{device, idle_commands, recording_commands, store_with};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use smartwash_api::DeviceEvent;

    fn washer(remote_control: &str) -> serde_json::Value {
        json!({"main": {
            "remoteControlStatus": {"remoteControlEnabled": {"value": remote_control}},
            "custom.supportedOptions": {
                "referenceTable": {"value": {"id": "Table_02"}},
                "course": {"value": "1C"},
                "supportedCourses": {"value": ["1C", "1D"]}
            },
            "custom.washerSpinLevel": {
                "washerSpinLevel": {"value": "1200"},
                "supportedWasherSpinLevel": {"value": ["rinseHold", "400", "800", "1200"]}
            },
            "samsungce.washerCycle": {
                "washerCycle": {"value": "Table_02_Course_1C"},
                "supportedCycles": {"value": [
                    {"cycle": "1C", "cycleType": "washingOnly", "supportedOptions": {
                        "spinLevel": {"raw": "A20F", "default": "1200", "options": ["400", "800"]}
                    }},
                    {"cycle": "1D", "cycleType": "washingOnly", "supportedOptions": {
                        "spinLevel": {"raw": "A20F", "default": "400", "options": ["rinseHold"]}
                    }}
                ]}
            }
        }})
    }

    fn selects(entities: &[AnyEntity]) -> Vec<&SmartThingsSelect> {
        entities
            .iter()
            .filter_map(|e| match e {
                AnyEntity::Select(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn program_selects(entities: &[AnyEntity]) -> Vec<&ProgramSelect> {
        entities
            .iter()
            .filter_map(|e| match e {
                AnyEntity::ProgramSelect(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn course_select_is_suppressed_when_main_has_cycles() {
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &idle_commands());
        let keys: Vec<_> = selects(&entities)
            .iter()
            .map(|s| s.description().key)
            .collect();
        assert_eq!(keys, vec!["custom.washerSpinLevel"]);
        assert_eq!(program_selects(&entities).len(), 1);
    }

    #[test]
    fn course_select_exists_without_cycles() {
        let store = store_with(vec![device(
            "d1",
            json!({"main": {"custom.supportedOptions": {
                "course": {"value": "1C"},
                "supportedCourses": {"value": ["1C", "1D"]}
            }}}),
        )]);
        let entities = build(&store, &idle_commands());
        let course = selects(&entities)[0];
        assert_eq!(course.unique_id(), "d1_main_custom.supportedOptions_course_course");
        assert_eq!(course.options(), vec!["1C", "1D"]);
        assert_eq!(course.current_option().as_deref(), Some("1C"));
    }

    #[test]
    fn spin_select_reads_raw_options_and_tracks_remote_control() {
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &idle_commands());
        let spin = selects(&entities)[0];
        assert_eq!(spin.options(), vec!["rinseHold", "400", "800", "1200"]);
        assert_eq!(spin.current_option().as_deref(), Some("1200"));
        assert!(spin.context().tracks("main", "remoteControlStatus"));
    }

    #[test]
    fn program_change_narrows_options_from_catalog() {
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &idle_commands());
        let spin = selects(&entities)[0];

        assert!(spin.refresh_options("course_1d"));
        assert_eq!(spin.options(), vec!["rinseHold", "400"]);
        assert_eq!(spin.current_option(), None);

        assert!(!spin.refresh_options("course_zz"));
        assert_eq!(spin.options(), vec!["rinseHold", "400"]);
    }

    #[test]
    fn remote_control_off_uses_supported_values_lowercased() {
        let store = store_with(vec![device("d1", washer("false"))]);
        let entities = build(&store, &idle_commands());
        let spin = selects(&entities)[0];
        assert!(spin.refresh_options("course_1d"));
        assert_eq!(spin.options(), vec!["rinsehold", "400", "800", "1200"]);
    }

    #[test]
    fn program_select_uses_lowercased_program_ids() {
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &idle_commands());
        let cycle = program_selects(&entities)[0];
        assert_eq!(cycle.translation_key(), Some("cycle_table_02"));
        assert_eq!(cycle.options(), ["course_1c", "course_1d"]);
        assert_eq!(cycle.current_option().as_deref(), Some("course_1c"));

        store.apply_event(
            &serde_json::from_value::<DeviceEvent>(json!({
                "deviceId": "d1",
                "capability": "samsungce.washerCycle",
                "attribute": "washerCycle",
                "value": "Table_02_Course_1D"
            }))
            .unwrap(),
        );
        assert_eq!(cycle.native_value(), "course_1d");
    }

    #[tokio::test]
    async fn selecting_a_program_sends_the_display_key() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &commands);
        let cycle = program_selects(&entities)[0];

        cycle.select_option("course_1d").await.unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            CoreCommand::device(
                "d1",
                "main",
                "samsungce.washerCycle",
                "setWasherCycle",
                Some(vec![json!("Course_1D")])
            )
        );

        let err = cycle.select_option("course_9z").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { .. }));
    }

    #[tokio::test]
    async fn selecting_an_option_sends_it_verbatim() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", washer("true"))]);
        let entities = build(&store, &commands);
        selects(&entities)[0].select_option("800").await.unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            CoreCommand::device(
                "d1",
                "main",
                "custom.washerSpinLevel",
                "setWasherSpinLevel",
                Some(vec![json!("800")])
            )
        );
    }

    #[test]
    fn softener_density_is_keyed_by_softener() {
        let density = SELECTS
            .iter()
            .find(|d| d.translation_key == "auto_dispense_softener_density")
            .unwrap();
        assert_eq!(density.key, "samsungce.autoDispenseSoftener");
    }
}

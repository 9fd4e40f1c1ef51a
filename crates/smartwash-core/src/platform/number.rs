// ── Number platform ──
//
// Delay-end timers, refrigerator cooling setpoints and hood fan speed.
// Bounds come from the description, a `{minimum, maximum, step}` range
// attribute, or a pair of min/max attributes.

use std::sync::Arc;

use serde_json::Value;

use smartwash_api::{Attribute, Capability, Command};

use super::AnyEntity;
use crate::command::CommandHandle;
use crate::entity::{
    Entity, EntityCategory, EntityContext, EntityState, Platform, ValueType, format_argument,
    map_unit,
};
use crate::error::CoreError;
use crate::store::DeviceStore;

/// Static description of a number entity.
#[derive(Debug, Clone, Copy)]
pub struct NumberDescription {
    pub capability: Capability,
    pub attribute: Attribute,
    pub key: &'static str,
    pub translation_key: Option<&'static str>,
    /// Per-component translation keys; components not listed keep
    /// `translation_key`.
    pub component_translation_keys: &'static [(&'static str, &'static str)],
    /// Only these components get the entity, when set.
    pub components: Option<&'static [&'static str]>,
    pub entity_category: Option<EntityCategory>,
    pub device_class: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub command: Command,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub step: Option<f64>,
    /// `None` means the device does not say how to encode values.
    pub value_type: Option<ValueType>,
    pub min_attribute: Option<Attribute>,
    pub max_attribute: Option<Attribute>,
    pub range_attribute: Option<Attribute>,
    /// Take the unit from the attribute's status instead of `unit`.
    pub use_temperature_unit: bool,
}

const fn delay_end(capability: Capability, key: &'static str) -> NumberDescription {
    NumberDescription {
        capability,
        attribute: Attribute::RemainingTime,
        key,
        translation_key: Some("delay_time"),
        component_translation_keys: &[],
        components: None,
        entity_category: Some(EntityCategory::Config),
        device_class: None,
        unit: Some("min"),
        command: Command::SetDelayTime,
        min_value: Some(0.0),
        max_value: Some(1440.0),
        step: Some(5.0),
        value_type: Some(ValueType::Integer),
        min_attribute: None,
        max_attribute: None,
        range_attribute: None,
        use_temperature_unit: false,
    }
}

pub const NUMBERS: &[NumberDescription] = &[
    delay_end(Capability::SamsungCeDryerDelayEnd, "samsungce.dryerDelayEnd"),
    delay_end(
        Capability::SamsungCeSteamClosetDelayEnd,
        "samsungce.steamClosetDelayEnd",
    ),
    delay_end(Capability::SamsungCeWasherDelayEnd, "samsungce.washerDelayEnd"),
    NumberDescription {
        capability: Capability::ThermostatCoolingSetpoint,
        attribute: Attribute::CoolingSetpoint,
        key: "thermostatCoolingSetpoint",
        translation_key: None,
        component_translation_keys: &[
            ("freezer", "freezer_temperature"),
            ("cooler", "cooler_temperature"),
            ("onedoor", "target_temperature"),
        ],
        components: Some(&["freezer", "cooler", "onedoor"]),
        entity_category: Some(EntityCategory::Config),
        device_class: Some("temperature"),
        unit: None,
        command: Command::SetCoolingSetpoint,
        min_value: None,
        max_value: None,
        step: None,
        value_type: Some(ValueType::Float),
        min_attribute: None,
        max_attribute: None,
        range_attribute: Some(Attribute::CoolingSetpointRange),
        use_temperature_unit: true,
    },
    NumberDescription {
        capability: Capability::SamsungCeHoodFanSpeed,
        attribute: Attribute::HoodFanSpeed,
        key: "samsungce.hoodFanSpeed",
        translation_key: Some("hood_fan_speed"),
        component_translation_keys: &[],
        components: None,
        entity_category: Some(EntityCategory::Config),
        device_class: None,
        unit: None,
        command: Command::SetHoodFanSpeed,
        min_value: None,
        max_value: None,
        step: Some(1.0),
        value_type: Some(ValueType::Float),
        min_attribute: Some(Attribute::SettableMinFanSpeed),
        max_attribute: Some(Attribute::SettableMaxFanSpeed),
        range_attribute: None,
        use_temperature_unit: false,
    },
];

impl NumberDescription {
    fn applies_to(&self, component: &str) -> bool {
        self.components.is_none_or(|list| list.contains(&component))
    }
}

/// `{minimum, maximum, step}` as reported by range attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    minimum: f64,
    maximum: f64,
    step: f64,
}

impl Range {
    fn from_value(value: &Value) -> Self {
        let field = |name: &str, default: f64| {
            value.get(name).and_then(Value::as_f64).unwrap_or(default)
        };
        Self {
            minimum: field("minimum", 0.0),
            maximum: field("maximum", 0.0),
            step: field("step", 1.0),
        }
    }
}

// ── SmartThingsNumber ────────────────────────────────────────────────

#[derive(Debug)]
pub struct SmartThingsNumber {
    ctx: EntityContext,
    description: &'static NumberDescription,
    unique_id: String,
    translation_key: Option<&'static str>,
}

impl SmartThingsNumber {
    pub fn new(ctx: EntityContext, description: &'static NumberDescription) -> Self {
        let unique_id = format!(
            "{}_{}_{}_{}_{}",
            ctx.device_id(),
            ctx.component(),
            description.capability,
            description.attribute,
            description.key
        );
        let translation_key = description
            .component_translation_keys
            .iter()
            .find(|(component, _)| *component == ctx.component())
            .map(|(_, key)| *key)
            .or(description.translation_key);
        Self {
            ctx,
            description,
            unique_id,
            translation_key,
        }
    }

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    pub fn description(&self) -> &'static NumberDescription {
        self.description
    }

    fn read(&self, attribute: Attribute) -> Option<f64> {
        self.ctx.attribute_f64(self.description.capability, attribute)
    }

    fn range(&self) -> Option<Range> {
        let attribute = self.description.range_attribute?;
        Some(
            self.ctx
                .attribute_value(self.description.capability, attribute)
                .map_or(
                    Range {
                        minimum: 0.0,
                        maximum: 0.0,
                        step: 1.0,
                    },
                    |v| Range::from_value(&v),
                ),
        )
    }

    /// Integer bounds read from the min/max attributes. `None` when either
    /// is missing or the range is empty.
    #[allow(clippy::cast_possible_truncation)]
    fn bounds(&self) -> Option<(i64, i64)> {
        let min = self.read(self.description.min_attribute?)? as i64;
        let max = self.read(self.description.max_attribute?)? as i64;
        (min <= max).then_some((min, max))
    }

    /// Discrete settable values, when the device reports min/max attributes.
    pub fn options(&self) -> Option<Vec<i64>> {
        let (min, max) = self.bounds()?;
        Some((min..=max).collect())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn min_value(&self) -> f64 {
        let d = self.description;
        if d.min_attribute.is_some() && d.max_attribute.is_some() {
            return self.bounds().map_or(0.0, |b| b.0 as f64);
        }
        if let Some(range) = self.range() {
            return range.minimum;
        }
        if let Some(attribute) = d.min_attribute {
            return self.read(attribute).unwrap_or(0.0);
        }
        d.min_value.unwrap_or(0.0)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn max_value(&self) -> f64 {
        let d = self.description;
        if d.min_attribute.is_some() && d.max_attribute.is_some() {
            return self.bounds().map_or(0.0, |b| b.1 as f64);
        }
        if let Some(range) = self.range() {
            return range.maximum;
        }
        if let Some(attribute) = d.max_attribute {
            return self.read(attribute).unwrap_or(0.0);
        }
        d.max_value.unwrap_or(0.0)
    }

    pub fn step(&self) -> f64 {
        match self.range() {
            Some(range) => range.step,
            None => self.description.step.unwrap_or(1.0),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        if self.description.use_temperature_unit {
            let unit = self
                .ctx
                .status(self.description.capability, self.description.attribute)
                .and_then(|s| s.unit);
            if let Some(mapped) = unit.as_deref().and_then(map_unit) {
                return Some(mapped);
            }
        }
        self.description.unit
    }

    pub fn native_value(&self) -> Option<f64> {
        self.description.value_type?;
        self.read(self.description.attribute)
    }

    pub async fn set_value(&self, value: f64) -> Result<(), CoreError> {
        let Some(value_type) = self.description.value_type else {
            return Err(CoreError::Unsupported {
                operation: format!("set value of {}: device provides no type data", self.unique_id),
            });
        };
        let (min, max) = (self.min_value(), self.max_value());
        if value < min || value > max {
            return Err(CoreError::OutOfRange { value, min, max });
        }
        self.ctx
            .execute(
                self.description.capability,
                self.description.command,
                Some(vec![format_argument(value, value_type)]),
            )
            .await
    }
}

impl Entity for SmartThingsNumber {
    fn platform(&self) -> Platform {
        Platform::Number
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        self.translation_key
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.description.entity_category
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::Number(self.native_value())
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── Setup ────────────────────────────────────────────────────────────

pub(crate) fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Vec<AnyEntity> {
    let mut entities = Vec::new();
    for device in store.devices_snapshot().iter() {
        for description in NUMBERS {
            for component in device.status.keys() {
                if !device.has_capability(component, description.capability.as_ref())
                    || !description.applies_to(component)
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
                entities.push(AnyEntity::Number(SmartThingsNumber::new(ctx, description)));
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

    fn numbers(entities: Vec<AnyEntity>) -> Vec<SmartThingsNumber> {
        entities
            .into_iter()
            .filter_map(|e| match e {
                AnyEntity::Number(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn fridge() -> serde_json::Value {
        json!({
            "main": {"thermostatCoolingSetpoint": {"coolingSetpoint": {"value": 3, "unit": "C"}}},
            "cooler": {"thermostatCoolingSetpoint": {
                "coolingSetpoint": {"value": 3, "unit": "C"},
                "coolingSetpointRange": {"value": {"minimum": 1, "maximum": 7, "step": 1}}
            }},
            "freezer": {"thermostatCoolingSetpoint": {
                "coolingSetpoint": {"value": -18, "unit": "F"}
            }}
        })
    }

    #[tokio::test]
    async fn delay_end_is_an_integer_timer() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device(
            "d1",
            json!({"main": {"samsungce.washerDelayEnd": {"remainingTime": {"value": 0}}}}),
        )]);
        let n = numbers(build(&store, &commands)).remove(0);
        assert_eq!(
            n.unique_id(),
            "d1_main_samsungce.washerDelayEnd_remainingTime_samsungce.washerDelayEnd"
        );
        assert_eq!((n.min_value(), n.max_value(), n.step()), (0.0, 1440.0, 5.0));
        assert_eq!(n.unit(), Some("min"));
        assert_eq!(n.native_value(), Some(0.0));

        n.set_value(90.0).await.unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            CoreCommand::device(
                "d1",
                "main",
                "samsungce.washerDelayEnd",
                "setDelayTime",
                Some(vec![json!(90)])
            )
        );

        let err = n.set_value(2000.0).await.unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { .. }));
    }

    #[test]
    fn cooling_setpoint_only_on_fridge_compartments() {
        let store = store_with(vec![device("d1", fridge())]);
        let found = numbers(build(&store, &idle_commands()));
        let components: Vec<_> = found.iter().map(|n| n.context().component().to_string()).collect();
        assert_eq!(components, vec!["cooler", "freezer"]);
        assert_eq!(found[0].translation_key(), Some("cooler_temperature"));
        assert_eq!(found[1].translation_key(), Some("freezer_temperature"));
    }

    #[test]
    fn cooling_setpoint_range_and_unit() {
        let store = store_with(vec![device("d1", fridge())]);
        let found = numbers(build(&store, &idle_commands()));
        let cooler = &found[0];
        assert_eq!((cooler.min_value(), cooler.max_value(), cooler.step()), (1.0, 7.0, 1.0));
        assert_eq!(cooler.unit(), Some("°C"));

        let freezer = &found[1];
        assert_eq!((freezer.min_value(), freezer.max_value(), freezer.step()), (0.0, 0.0, 1.0));
        assert_eq!(freezer.unit(), Some("°F"));
    }

    #[tokio::test]
    async fn float_setpoint_is_sent_as_decimal_string() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", fridge())]);
        let cooler = numbers(build(&store, &commands)).remove(0);
        cooler.set_value(4.0).await.unwrap();
        let CoreCommand::Device { command, .. } = seen.recv().await.unwrap() else {
            panic!("expected a device command");
        };
        assert_eq!(command.arguments, Some(vec![json!("4.0")]));
        assert_eq!(command.component, "cooler");
    }

    #[test]
    fn hood_fan_speed_bounds_come_from_attributes() {
        let store = store_with(vec![device(
            "d1",
            json!({"main": {"samsungce.hoodFanSpeed": {
                "hoodFanSpeed": {"value": 2},
                "settableMinFanSpeed": {"value": 1},
                "settableMaxFanSpeed": {"value": 4}
            }}}),
        )]);
        let hood = numbers(build(&store, &idle_commands())).remove(0);
        assert_eq!(hood.options(), Some(vec![1, 2, 3, 4]));
        assert_eq!((hood.min_value(), hood.max_value()), (1.0, 4.0));
        assert_eq!(hood.native_value(), Some(2.0));
    }

    #[test]
    fn hood_fan_speed_bounds_do_not_expand_the_range() {
        let store = store_with(vec![device(
            "d1",
            json!({"main": {"samsungce.hoodFanSpeed": {
                "hoodFanSpeed": {"value": 2},
                "settableMinFanSpeed": {"value": 0},
                "settableMaxFanSpeed": {"value": 1_000_000_000_000_i64}
            }}}),
        )]);
        let hood = numbers(build(&store, &idle_commands())).remove(0);
        assert_eq!((hood.min_value(), hood.max_value()), (0.0, 1e12));

        let store = store_with(vec![device(
            "d1",
            json!({"main": {"samsungce.hoodFanSpeed": {
                "hoodFanSpeed": {"value": 2},
                "settableMinFanSpeed": {"value": 5},
                "settableMaxFanSpeed": {"value": 1}
            }}}),
        )]);
        let hood = numbers(build(&store, &idle_commands())).remove(0);
        assert_eq!(hood.options(), None);
        assert_eq!((hood.min_value(), hood.max_value()), (0.0, 0.0));
    }
}

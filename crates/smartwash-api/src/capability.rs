//! Vendor identifiers for capabilities, attributes and commands.
//!
//! Status trees are keyed by raw strings (unknown capabilities must survive
//! a round trip), so these enums are used for lookups via `as_ref()` rather
//! than as map keys. Only identifiers the integration actually touches are
//! listed.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Capability identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString,
    IntoStaticStr,
)]
pub enum Capability {
    #[strum(serialize = "accelerationSensor")]
    AccelerationSensor,
    #[strum(serialize = "airConditionerFanMode")]
    AirConditionerFanMode,
    #[strum(serialize = "airConditionerMode")]
    AirConditionerMode,
    #[strum(serialize = "button")]
    Button,
    #[strum(serialize = "colorControl")]
    ColorControl,
    #[strum(serialize = "colorTemperature")]
    ColorTemperature,
    #[strum(serialize = "contactSensor")]
    ContactSensor,
    #[strum(serialize = "custom.disabledCapabilities")]
    CustomDisabledCapabilities,
    #[strum(serialize = "custom.disabledComponents")]
    CustomDisabledComponents,
    #[strum(serialize = "custom.dryerDryLevel")]
    CustomDryerDryLevel,
    #[strum(serialize = "custom.dryerWrinklePrevent")]
    CustomDryerWrinklePrevent,
    #[strum(serialize = "custom.steamClosetOperatingState")]
    CustomSteamClosetOperatingState,
    #[strum(serialize = "custom.steamClosetWrinklePrevent")]
    CustomSteamClosetWrinklePrevent,
    #[strum(serialize = "custom.supportedOptions")]
    CustomSupportedOptions,
    #[strum(serialize = "custom.washerRinseCycles")]
    CustomWasherRinseCycles,
    #[strum(serialize = "custom.washerSoilLevel")]
    CustomWasherSoilLevel,
    #[strum(serialize = "custom.washerSpinLevel")]
    CustomWasherSpinLevel,
    #[strum(serialize = "custom.washerWaterTemperature")]
    CustomWasherWaterTemperature,
    #[strum(serialize = "demandResponseLoadControl")]
    DemandResponseLoadControl,
    #[strum(serialize = "dishwasherOperatingState")]
    DishwasherOperatingState,
    #[strum(serialize = "dryerOperatingState")]
    DryerOperatingState,
    #[strum(serialize = "fanSpeed")]
    FanSpeed,
    #[strum(serialize = "filterStatus")]
    FilterStatus,
    #[strum(serialize = "motionSensor")]
    MotionSensor,
    #[strum(serialize = "presenceSensor")]
    PresenceSensor,
    #[strum(serialize = "remoteControlStatus")]
    RemoteControlStatus,
    #[strum(serialize = "samsungce.autoDispenseDetergent")]
    SamsungCeAutoDispenseDetergent,
    #[strum(serialize = "samsungce.autoDispenseSoftener")]
    SamsungCeAutoDispenseSoftener,
    #[strum(serialize = "samsungce.doorState")]
    SamsungCeDoorState,
    #[strum(serialize = "samsungce.dryerCycle")]
    SamsungCeDryerCycle,
    #[strum(serialize = "samsungce.dryerDelayEnd")]
    SamsungCeDryerDelayEnd,
    #[strum(serialize = "samsungce.dryerDryingTemperature")]
    SamsungCeDryerDryingTemperature,
    #[strum(serialize = "samsungce.dryerDryingTime")]
    SamsungCeDryerDryingTime,
    #[strum(serialize = "samsungce.hoodFanSpeed")]
    SamsungCeHoodFanSpeed,
    #[strum(serialize = "samsungce.kidsLock")]
    SamsungCeKidsLock,
    #[strum(serialize = "samsungce.sabbathMode")]
    SamsungCeSabbathMode,
    #[strum(serialize = "samsungce.steamClosetCycle")]
    SamsungCeSteamClosetCycle,
    #[strum(serialize = "samsungce.steamClosetDelayEnd")]
    SamsungCeSteamClosetDelayEnd,
    #[strum(serialize = "samsungce.steamClosetKeepFreshMode")]
    SamsungCeSteamClosetKeepFreshMode,
    #[strum(serialize = "samsungce.steamClosetSanitizeMode")]
    SamsungCeSteamClosetSanitizeMode,
    #[strum(serialize = "samsungce.washerBubbleSoak")]
    SamsungCeWasherBubbleSoak,
    #[strum(serialize = "samsungce.washerCycle")]
    SamsungCeWasherCycle,
    #[strum(serialize = "samsungce.washerDelayEnd")]
    SamsungCeWasherDelayEnd,
    #[strum(serialize = "samsungce.washerOperatingState")]
    SamsungCeWasherOperatingState,
    #[strum(serialize = "soundSensor")]
    SoundSensor,
    #[strum(serialize = "switch")]
    Switch,
    #[strum(serialize = "switchLevel")]
    SwitchLevel,
    #[strum(serialize = "tamperAlert")]
    TamperAlert,
    #[strum(serialize = "temperatureMeasurement")]
    TemperatureMeasurement,
    #[strum(serialize = "thermostatCoolingSetpoint")]
    ThermostatCoolingSetpoint,
    #[strum(serialize = "washerOperatingState")]
    WasherOperatingState,
    #[strum(serialize = "waterSensor")]
    WaterSensor,
}

/// Attribute identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString,
    IntoStaticStr,
)]
pub enum Attribute {
    #[strum(serialize = "acceleration")]
    Acceleration,
    #[strum(serialize = "amount")]
    Amount,
    #[strum(serialize = "button")]
    Button,
    #[strum(serialize = "contact")]
    Contact,
    #[strum(serialize = "coolingSetpoint")]
    CoolingSetpoint,
    #[strum(serialize = "coolingSetpointRange")]
    CoolingSetpointRange,
    #[strum(serialize = "course")]
    Course,
    #[strum(serialize = "density")]
    Density,
    #[strum(serialize = "disabledCapabilities")]
    DisabledCapabilities,
    #[strum(serialize = "disabledComponents")]
    DisabledComponents,
    #[strum(serialize = "doorState")]
    DoorState,
    #[strum(serialize = "dryerCycle")]
    DryerCycle,
    #[strum(serialize = "dryerDryLevel")]
    DryerDryLevel,
    #[strum(serialize = "dryerWrinklePrevent")]
    DryerWrinklePrevent,
    #[strum(serialize = "dryingTemperature")]
    DryingTemperature,
    #[strum(serialize = "dryingTime")]
    DryingTime,
    #[strum(serialize = "filterStatus")]
    FilterStatus,
    #[strum(serialize = "hoodFanSpeed")]
    HoodFanSpeed,
    #[strum(serialize = "lockState")]
    LockState,
    #[strum(serialize = "machineState")]
    MachineState,
    #[strum(serialize = "motion")]
    Motion,
    #[strum(serialize = "operatingState")]
    OperatingState,
    #[strum(serialize = "presence")]
    Presence,
    #[strum(serialize = "referenceTable")]
    ReferenceTable,
    #[strum(serialize = "remainingTime")]
    RemainingTime,
    #[strum(serialize = "remoteControlEnabled")]
    RemoteControlEnabled,
    #[strum(serialize = "settableMaxFanSpeed")]
    SettableMaxFanSpeed,
    #[strum(serialize = "settableMinFanSpeed")]
    SettableMinFanSpeed,
    #[strum(serialize = "sound")]
    Sound,
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "steamClosetCycle")]
    SteamClosetCycle,
    #[strum(serialize = "steamClosetMachineState")]
    SteamClosetMachineState,
    #[strum(serialize = "steamClosetWrinklePrevent")]
    SteamClosetWrinklePrevent,
    #[strum(serialize = "supportedAmount")]
    SupportedAmount,
    #[strum(serialize = "supportedCourses")]
    SupportedCourses,
    #[strum(serialize = "supportedCycles")]
    SupportedCycles,
    #[strum(serialize = "supportedDensity")]
    SupportedDensity,
    #[strum(serialize = "supportedDryerDryLevel")]
    SupportedDryerDryLevel,
    #[strum(serialize = "supportedDryingTemperature")]
    SupportedDryingTemperature,
    #[strum(serialize = "supportedDryingTime")]
    SupportedDryingTime,
    #[strum(serialize = "supportedMachineStates")]
    SupportedMachineStates,
    #[strum(serialize = "supportedSteamClosetMachineState")]
    SupportedSteamClosetMachineState,
    #[strum(serialize = "supportedWasherRinseCycles")]
    SupportedWasherRinseCycles,
    #[strum(serialize = "supportedWasherSoilLevel")]
    SupportedWasherSoilLevel,
    #[strum(serialize = "supportedWasherSpinLevel")]
    SupportedWasherSpinLevel,
    #[strum(serialize = "supportedWasherWaterTemperature")]
    SupportedWasherWaterTemperature,
    #[strum(serialize = "switch")]
    Switch,
    #[strum(serialize = "tamper")]
    Tamper,
    #[strum(serialize = "washerCycle")]
    WasherCycle,
    #[strum(serialize = "washerRinseCycles")]
    WasherRinseCycles,
    #[strum(serialize = "washerSoilLevel")]
    WasherSoilLevel,
    #[strum(serialize = "washerSpinLevel")]
    WasherSpinLevel,
    #[strum(serialize = "washerWaterTemperature")]
    WasherWaterTemperature,
    #[strum(serialize = "water")]
    Water,
}

/// Command identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, IntoStaticStr,
)]
pub enum Command {
    #[strum(serialize = "cancel")]
    Cancel,
    #[strum(serialize = "estimateOperationTime")]
    EstimateOperationTime,
    #[strum(serialize = "off")]
    Off,
    #[strum(serialize = "on")]
    On,
    #[strum(serialize = "pause")]
    Pause,
    #[strum(serialize = "resume")]
    Resume,
    #[strum(serialize = "setAmount")]
    SetAmount,
    #[strum(serialize = "setCoolingSetpoint")]
    SetCoolingSetpoint,
    #[strum(serialize = "setCourse")]
    SetCourse,
    #[strum(serialize = "setDelayTime")]
    SetDelayTime,
    #[strum(serialize = "setDensity")]
    SetDensity,
    #[strum(serialize = "setDryerCycle")]
    SetDryerCycle,
    #[strum(serialize = "setDryerDryLevel")]
    SetDryerDryLevel,
    #[strum(serialize = "setDryerWrinklePrevent")]
    SetDryerWrinklePrevent,
    #[strum(serialize = "setDryingTemperature")]
    SetDryingTemperature,
    #[strum(serialize = "setDryingTime")]
    SetDryingTime,
    #[strum(serialize = "setHoodFanSpeed")]
    SetHoodFanSpeed,
    #[strum(serialize = "setMachineState")]
    SetMachineState,
    #[strum(serialize = "setSteamClosetCycle")]
    SetSteamClosetCycle,
    #[strum(serialize = "setSteamClosetMachineState")]
    SetSteamClosetMachineState,
    #[strum(serialize = "setSteamClosetWrinklePrevent")]
    SetSteamClosetWrinklePrevent,
    #[strum(serialize = "setWasherCycle")]
    SetWasherCycle,
    #[strum(serialize = "setWasherRinseCycles")]
    SetWasherRinseCycles,
    #[strum(serialize = "setWasherSoilLevel")]
    SetWasherSoilLevel,
    #[strum(serialize = "setWasherSpinLevel")]
    SetWasherSpinLevel,
    #[strum(serialize = "setWasherWaterTemperature")]
    SetWasherWaterTemperature,
    #[strum(serialize = "start")]
    Start,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn identifiers_use_vendor_spelling() {
        assert_eq!(
            Capability::SamsungCeWasherCycle.as_ref(),
            "samsungce.washerCycle"
        );
        assert_eq!(
            Attribute::SupportedMachineStates.to_string(),
            "supportedMachineStates"
        );
        assert_eq!(Command::EstimateOperationTime.as_ref(), "estimateOperationTime");
    }

    #[test]
    fn parses_known_capability() {
        assert_eq!(
            Capability::from_str("custom.disabledCapabilities").unwrap(),
            Capability::CustomDisabledCapabilities
        );
        assert!(Capability::from_str("not.a.capability").is_err());
    }
}

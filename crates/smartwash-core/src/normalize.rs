// ── Status normalization ──
//
// Devices advertise components and capabilities they do not actually
// support, then list them under `custom.disabledComponents` and
// `custom.disabledCapabilities`. Normalization drops those entries so the
// platforms never build entities for them.

use smartwash_api::{Attribute, Capability, CapabilityStatus, ComponentStatus, DeviceStatus, MAIN};

/// Read a JSON array of strings from a status attribute. Non-strings are skipped.
fn string_list(capability: &CapabilityStatus, attribute: Attribute) -> Vec<String> {
    capability
        .get(attribute.as_ref())
        .and_then(|s| s.value())
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether a disabled capability must survive normalization anyway.
fn keep_disabled(capability: &str, status: &CapabilityStatus) -> bool {
    const OPERATING_STATES: [Capability; 2] = [
        Capability::DryerOperatingState,
        Capability::WasherOperatingState,
    ];

    if capability == Capability::DemandResponseLoadControl.as_ref() {
        return true;
    }
    if OPERATING_STATES.iter().any(|c| c.as_ref() == capability) {
        return status
            .get(Attribute::SupportedMachineStates.as_ref())
            .and_then(|s| s.value())
            .is_some();
    }
    false
}

/// Remove disabled components and capabilities in place.
///
/// A tree without a `main` component is left untouched. Applying this
/// twice has the same effect as applying it once.
pub fn process_status(status: &mut DeviceStatus) {
    let Some(main) = status.get(MAIN) else {
        return;
    };

    let disabled_components = main
        .get(Capability::CustomDisabledComponents.as_ref())
        .map(|cap| string_list(cap, Attribute::DisabledComponents))
        .unwrap_or_default();
    for component in &disabled_components {
        status.remove(component);
    }

    for component in status.values_mut() {
        process_component_status(component);
    }
}

fn process_component_status(component: &mut ComponentStatus) {
    let Some(disabled) = component
        .get(Capability::CustomDisabledCapabilities.as_ref())
        .map(|cap| string_list(cap, Attribute::DisabledCapabilities))
    else {
        return;
    };

    for capability in disabled {
        let drop = component
            .get(&capability)
            .is_some_and(|status| !keep_disabled(&capability, status));
        if drop {
            component.remove(&capability);
        }
    }
}

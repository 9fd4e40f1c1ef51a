// ── Entity platforms ──
//
// Each platform module owns a static description table and the wrappers
// built from it. `Entities` instantiates every platform for the devices
// in the store and routes host actions to the right wrapper.

pub mod binary_sensor;
pub mod button;
pub mod number;
pub mod scene;
pub mod select;
pub mod switch;

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::CommandHandle;
use crate::entity::{Entity, EntityCategory, EntityState, Platform};
use crate::error::CoreError;
use crate::event::HostEvent;
use crate::program::program_capability;
use crate::store::DeviceStore;

pub use binary_sensor::{ProgramBinarySensor, SmartThingsBinarySensor};
pub use button::SmartThingsButton;
pub use number::SmartThingsNumber;
pub use scene::SceneEntity;
pub use select::{ProgramSelect, SmartThingsSelect};
pub use switch::{ProgramSwitch, SmartThingsSwitch};

// ── AnyEntity ────────────────────────────────────────────────────────

/// Every entity wrapper the integration creates.
#[derive(Debug)]
pub enum AnyEntity {
    Switch(SmartThingsSwitch),
    ProgramSwitch(ProgramSwitch),
    Select(SmartThingsSelect),
    ProgramSelect(ProgramSelect),
    Number(SmartThingsNumber),
    Button(SmartThingsButton),
    BinarySensor(SmartThingsBinarySensor),
    ProgramBinarySensor(ProgramBinarySensor),
    Scene(SceneEntity),
}

impl AnyEntity {
    fn inner(&self) -> &dyn Entity {
        match self {
            Self::Switch(e) => e,
            Self::ProgramSwitch(e) => e,
            Self::Select(e) => e,
            Self::ProgramSelect(e) => e,
            Self::Number(e) => e,
            Self::Button(e) => e,
            Self::BinarySensor(e) => e,
            Self::ProgramBinarySensor(e) => e,
            Self::Scene(e) => e,
        }
    }

    /// Options a select offers, `None` for other entities.
    pub fn options(&self) -> Option<Vec<String>> {
        match self {
            Self::Select(e) => Some(e.options()),
            Self::ProgramSelect(e) => Some(e.options().to_vec()),
            _ => None,
        }
    }

    /// Run a host action against this entity.
    pub async fn perform(&self, action: EntityAction) -> Result<(), CoreError> {
        match (self, action) {
            (Self::Switch(e), EntityAction::TurnOn) => e.turn_on().await,
            (Self::Switch(e), EntityAction::TurnOff) => e.turn_off().await,
            (Self::ProgramSwitch(e), EntityAction::TurnOn) => e.turn_on().await,
            (Self::ProgramSwitch(e), EntityAction::TurnOff) => e.turn_off().await,
            (Self::Select(e), EntityAction::SelectOption(option)) => e.select_option(&option).await,
            (Self::ProgramSelect(e), EntityAction::SelectOption(option)) => {
                e.select_option(&option).await
            }
            (Self::Number(e), EntityAction::SetValue(value)) => e.set_value(value).await,
            (Self::Button(e), EntityAction::Press) => e.press().await,
            (Self::Scene(e), EntityAction::Activate) => e.activate().await,
            (entity, action) => Err(CoreError::Unsupported {
                operation: format!("{action} on {} entity", entity.platform()),
            }),
        }
    }
}

impl Entity for AnyEntity {
    fn platform(&self) -> Platform {
        self.inner().platform()
    }

    fn unique_id(&self) -> &str {
        self.inner().unique_id()
    }

    fn translation_key(&self) -> Option<&str> {
        self.inner().translation_key()
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.inner().entity_category()
    }

    fn device_id(&self) -> Option<&str> {
        self.inner().device_id()
    }

    fn state(&self) -> EntityState {
        self.inner().state()
    }

    fn available(&self) -> bool {
        self.inner().available()
    }
}

// ── EntityAction ─────────────────────────────────────────────────────

/// A service call a host can make on an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityAction {
    TurnOn,
    TurnOff,
    SelectOption(String),
    SetValue(f64),
    Press,
    Activate,
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnOn => f.write_str("turn_on"),
            Self::TurnOff => f.write_str("turn_off"),
            Self::SelectOption(option) => write!(f, "select_option({option})"),
            Self::SetValue(value) => write!(f, "set_value({value})"),
            Self::Press => f.write_str("press"),
            Self::Activate => f.write_str("activate"),
        }
    }
}

// ── Entities ─────────────────────────────────────────────────────────

/// All entities of one config entry, in platform order.
#[derive(Debug, Default)]
pub struct Entities {
    items: Vec<AnyEntity>,
}

impl Entities {
    /// Instantiate every platform's wrappers for the devices and scenes
    /// currently in `store`.
    pub fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Self {
        let mut items = Vec::new();
        items.extend(binary_sensor::build(store, commands));
        items.extend(button::build(store, commands));
        items.extend(number::build(store, commands));
        items.extend(scene::build(store, commands));
        items.extend(select::build(store, commands));
        items.extend(switch::build(store, commands));
        debug!(entities = items.len(), "entities built");
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyEntity> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, unique_id: &str) -> Option<&AnyEntity> {
        self.items.iter().find(|e| e.unique_id() == unique_id)
    }

    /// Entities belonging to one device.
    pub fn for_device<'a>(&'a self, device_id: &'a str) -> impl Iterator<Item = &'a AnyEntity> {
        self.items
            .iter()
            .filter(move |e| e.device_id() == Some(device_id))
    }

    pub async fn perform(&self, unique_id: &str, action: EntityAction) -> Result<(), CoreError> {
        let entity = self.get(unique_id).ok_or_else(|| CoreError::EntityNotFound {
            unique_id: unique_id.to_owned(),
        })?;
        entity.perform(action).await
    }

    /// React to a host event. A change of a device's current cycle
    /// re-derives the option lists of that device's program-bound
    /// selects. Returns the number of selects whose options changed.
    pub fn on_host_event(&self, event: &HostEvent) -> usize {
        let HostEvent::StatusUpdated {
            device_id,
            component_id,
            capability,
            attribute,
        } = event
        else {
            return 0;
        };
        let is_cycle = program_capability(capability)
            .is_some_and(|p| p.attribute.as_ref() == attribute.as_str());
        if !is_cycle {
            return 0;
        }
        self.refresh_program_options(device_id, component_id, capability)
    }

    fn refresh_program_options(
        &self,
        device_id: &str,
        component_id: &str,
        capability: &str,
    ) -> usize {
        let program_states: Vec<String> = self
            .items
            .iter()
            .filter_map(|e| match e {
                AnyEntity::ProgramSelect(s)
                    if s.context().device_id() == device_id
                        && s.context().component() == component_id
                        && s.description().capability.as_ref() == capability =>
                {
                    Some(s.native_value())
                }
                _ => None,
            })
            .collect();

        let mut refreshed = 0;
        for state in &program_states {
            let selects = self.items.iter().filter_map(|e| match e {
                AnyEntity::Select(s) if s.context().device_id() == device_id => Some(s),
                _ => None,
            });
            for select in selects {
                if select.refresh_options(state) {
                    refreshed += 1;
                }
            }
        }
        refreshed
    }
}

/// Keep program-bound select options in step with the current cycle until
/// `cancel` fires or the event channel closes.
pub async fn track_program_changes(
    entities: Arc<Entities>,
    mut events: broadcast::Receiver<Arc<HostEvent>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    let refreshed = entities.on_host_event(&event);
                    if refreshed > 0 {
                        debug!(refreshed, "select options refreshed after program change");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "program tracker lagged behind host events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::entity::testing::{device, idle_commands, recording_commands, store_with};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use smartwash_api::DeviceEvent;

    fn washer() -> serde_json::Value {
        json!({"main": {
            "remoteControlStatus": {"remoteControlEnabled": {"value": "true"}},
            "custom.washerSpinLevel": {
                "washerSpinLevel": {"value": "1200"},
                "supportedWasherSpinLevel": {"value": ["rinseHold", "400", "800", "1200"]}
            },
            "samsungce.washerOperatingState": {"operatingState": {"value": "ready"}},
            "samsungce.washerCycle": {
                "washerCycle": {"value": "Table_00_Course_1C"},
                "supportedCycles": {"value": [
                    {"cycle": "1C", "cycleType": "washingOnly", "supportedOptions": {
                        "spinLevel": {"raw": "A20F", "default": "1200", "options": ["800", "1200"]}
                    }},
                    {"cycle": "1D", "cycleType": "washingOnly", "supportedOptions": {
                        "spinLevel": {"raw": "A20F", "default": "400", "options": ["400"]}
                    }}
                ]}
            }
        }})
    }

    fn spin_options(entities: &Entities) -> Vec<String> {
        entities
            .get("d1_main_custom.washerSpinLevel_washerSpinLevel_custom.washerSpinLevel")
            .and_then(AnyEntity::options)
            .unwrap()
    }

    #[test]
    fn every_platform_is_built() {
        let store = store_with(vec![device("d1", washer())]);
        let entities = Entities::build(&store, &idle_commands());
        let platforms: std::collections::BTreeSet<_> =
            entities.iter().map(Entity::platform).collect();
        assert_eq!(
            platforms.into_iter().collect::<Vec<_>>(),
            vec![
                Platform::BinarySensor,
                Platform::Button,
                Platform::Select,
                Platform::Switch
            ]
        );
        assert_eq!(entities.for_device("d1").count(), entities.len());
    }

    #[test]
    fn cycle_change_refreshes_program_bound_selects() {
        let store = store_with(vec![device("d1", washer())]);
        let entities = Entities::build(&store, &idle_commands());
        assert_eq!(spin_options(&entities), vec!["rinseHold", "400", "800", "1200"]);

        let event: DeviceEvent = serde_json::from_value(json!({
            "deviceId": "d1",
            "capability": "samsungce.washerCycle",
            "attribute": "washerCycle",
            "value": "Table_00_Course_1D"
        }))
        .unwrap();
        store.apply_event(&event);

        let refreshed = entities.on_host_event(&HostEvent::StatusUpdated {
            device_id: "d1".into(),
            component_id: "main".into(),
            capability: "samsungce.washerCycle".into(),
            attribute: "washerCycle".into(),
        });
        assert_eq!(refreshed, 1);
        assert_eq!(spin_options(&entities), vec!["400"]);
    }

    #[test]
    fn cycle_change_only_uses_the_changed_cycle_capability() {
        let mut combo = washer();
        combo["main"]["samsungce.dryerCycle"] =
            json!({"dryerCycle": {"value": "Table_00_Course_1C"}});
        let store = store_with(vec![device("d1", combo)]);
        let entities = Entities::build(&store, &idle_commands());

        let event: DeviceEvent = serde_json::from_value(json!({
            "deviceId": "d1",
            "capability": "samsungce.washerCycle",
            "attribute": "washerCycle",
            "value": "Table_00_Course_1D"
        }))
        .unwrap();
        store.apply_event(&event);

        let refreshed = entities.on_host_event(&HostEvent::StatusUpdated {
            device_id: "d1".into(),
            component_id: "main".into(),
            capability: "samsungce.washerCycle".into(),
            attribute: "washerCycle".into(),
        });
        assert_eq!(refreshed, 1);
        assert_eq!(spin_options(&entities), vec!["400"]);
    }

    #[test]
    fn unrelated_status_updates_are_ignored() {
        let store = store_with(vec![device("d1", washer())]);
        let entities = Entities::build(&store, &idle_commands());
        let refreshed = entities.on_host_event(&HostEvent::StatusUpdated {
            device_id: "d1".into(),
            component_id: "main".into(),
            capability: "custom.washerSpinLevel".into(),
            attribute: "washerSpinLevel".into(),
        });
        assert_eq!(refreshed, 0);
    }

    #[tokio::test]
    async fn actions_route_to_the_matching_wrapper() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", washer())]);
        let entities = Entities::build(&store, &commands);

        entities
            .perform("d1.start", EntityAction::Press)
            .await
            .unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            Command::device("d1", "main", "samsungce.washerOperatingState", "start", None)
        );

        let err = entities
            .perform("d1.start", EntityAction::TurnOn)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));

        let err = entities
            .perform("missing", EntityAction::Press)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EntityNotFound { .. }));
    }
}

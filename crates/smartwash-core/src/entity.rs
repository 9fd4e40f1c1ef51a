// ── Entity plumbing shared by every platform ──
//
// An entity is a (device, component, capability set) view over the device
// store plus a command handle. Wrappers read state lazily from the latest
// store snapshot, so a device event is visible to every entity at once.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};

use smartwash_api::{Attribute, Capability, Status};

use crate::command::{Command, CommandHandle};
use crate::error::CoreError;
use crate::model::FullDevice;
use crate::store::DeviceStore;

/// Vendor unit -> display unit.
pub const UNIT_MAP: [(&str, &str); 3] = [("C", "°C"), ("F", "°F"), ("lux", "lx")];

/// Display unit for a vendor unit string.
pub fn map_unit(unit: &str) -> Option<&'static str> {
    UNIT_MAP
        .iter()
        .find(|(vendor, _)| *vendor == unit)
        .map(|(_, display)| *display)
}

// ── Classification ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Button,
    Number,
    Scene,
    Select,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// Vendor data-point type of a numeric attribute. Decides how a new value
/// is encoded as a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ValueType {
    Boolean,
    Enum,
    Float,
    Integer,
    Json,
    Raw,
    String,
}

/// Encode a numeric value as a command argument.
///
/// Integers are sent as JSON integers, floats as a decimal string that
/// always carries a fractional part (`22` -> `"22.0"`), anything else as
/// the string of the truncated integer.
#[allow(clippy::cast_possible_truncation)]
pub fn format_argument(value: f64, value_type: ValueType) -> Value {
    match value_type {
        ValueType::Integer => Value::from(value.trunc() as i64),
        ValueType::Float => Value::String(format!("{value:?}")),
        _ => Value::String((value.trunc() as i64).to_string()),
    }
}

// ── State ────────────────────────────────────────────────────────────

/// Current state of an entity as a host would render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityState {
    On(bool),
    Text(Option<String>),
    Number(Option<f64>),
    /// Buttons and scenes carry no state.
    Stateless,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On(true) => f.write_str("on"),
            Self::On(false) => f.write_str("off"),
            Self::Text(Some(s)) => f.write_str(s),
            Self::Number(Some(n)) => write!(f, "{n}"),
            Self::Text(None) | Self::Number(None) => f.write_str("unknown"),
            Self::Stateless => f.write_str("-"),
        }
    }
}

/// Common read-only surface of every entity.
pub trait Entity {
    fn platform(&self) -> Platform;

    fn unique_id(&self) -> &str;

    /// Host translation key; `None` means the device name is used.
    fn translation_key(&self) -> Option<&str>;

    fn entity_category(&self) -> Option<EntityCategory> {
        None
    }

    /// Owning device, `None` for location-level entities.
    fn device_id(&self) -> Option<&str>;

    fn state(&self) -> EntityState;

    /// Whether the backing device is still in the store.
    fn available(&self) -> bool;
}

// ── EntityContext ────────────────────────────────────────────────────

/// Shared state of a device-bound entity.
#[derive(Clone)]
pub struct EntityContext {
    store: Arc<DeviceStore>,
    commands: CommandHandle,
    device_id: String,
    component: String,
    capabilities: BTreeSet<Capability>,
}

impl fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityContext")
            .field("device_id", &self.device_id)
            .field("component", &self.component)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl EntityContext {
    pub fn new(
        store: Arc<DeviceStore>,
        commands: CommandHandle,
        device_id: impl Into<String>,
        component: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            store,
            commands,
            device_id: device_id.into(),
            component: component.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Capabilities whose updates this entity tracks.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn device(&self) -> Option<Arc<FullDevice>> {
        self.store.device(&self.device_id)
    }

    pub fn available(&self) -> bool {
        self.store.contains_device(&self.device_id)
    }

    /// Whether an update to `capability` on this entity's component
    /// concerns it.
    pub fn tracks(&self, component: &str, capability: &str) -> bool {
        component == self.component && self.capabilities.iter().any(|c| c.as_ref() == capability)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn status(&self, capability: Capability, attribute: Attribute) -> Option<Status> {
        self.device()?
            .attribute(&self.component, capability.as_ref(), attribute.as_ref())
            .cloned()
    }

    /// The attribute's value; absent and JSON `null` both read as `None`.
    pub fn attribute_value(&self, capability: Capability, attribute: Attribute) -> Option<Value> {
        self.device()?
            .attribute_value(&self.component, capability.as_ref(), attribute.as_ref())
            .cloned()
    }

    pub fn attribute_str(&self, capability: Capability, attribute: Attribute) -> Option<String> {
        match self.attribute_value(capability, attribute)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn attribute_f64(&self, capability: Capability, attribute: Attribute) -> Option<f64> {
        self.attribute_value(capability, attribute)?.as_f64()
    }

    /// A JSON array attribute as strings; non-string items are skipped.
    pub fn attribute_list(&self, capability: Capability, attribute: Attribute) -> Option<Vec<String>> {
        let value = self.attribute_value(capability, attribute)?;
        let items = value.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        )
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Execute a command on this entity's component. Failures propagate
    /// unchanged and are never retried.
    pub async fn execute(
        &self,
        capability: Capability,
        command: impl AsRef<str>,
        arguments: Option<Vec<Value>>,
    ) -> Result<(), CoreError> {
        tracing::debug!(
            device_id = %self.device_id,
            component = %self.component,
            %capability,
            command = command.as_ref(),
            "executing device command"
        );
        self.commands
            .execute(Command::device(
                self.device_id.clone(),
                self.component.clone(),
                capability,
                command,
                arguments,
            ))
            .await
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arguments_follow_value_type() {
        assert_eq!(format_argument(30.0, ValueType::Integer), json!(30));
        assert_eq!(format_argument(30.9, ValueType::Integer), json!(30));
        assert_eq!(format_argument(-18.0, ValueType::Float), json!("-18.0"));
        assert_eq!(format_argument(2.5, ValueType::Float), json!("2.5"));
        assert_eq!(format_argument(3.7, ValueType::String), json!("3"));
    }

    #[test]
    fn units_map_to_display_symbols() {
        assert_eq!(map_unit("C"), Some("°C"));
        assert_eq!(map_unit("lux"), Some("lx"));
        assert_eq!(map_unit("K"), None);
    }

    #[test]
    fn context_reads_and_tracks_component() {
        let store = testing::store_with(vec![testing::device(
            "d1",
            json!({"main": {"switch": {"switch": {"value": "on"}}}}),
        )]);
        let ctx = EntityContext::new(
            store,
            testing::idle_commands(),
            "d1",
            "main",
            [Capability::Switch],
        );
        assert_eq!(
            ctx.attribute_str(Capability::Switch, Attribute::Switch).as_deref(),
            Some("on")
        );
        assert!(ctx.tracks("main", "switch"));
        assert!(!ctx.tracks("sub", "switch"));
        assert!(ctx.available());
    }

    #[test]
    fn state_display() {
        assert_eq!(EntityState::On(true).to_string(), "on");
        assert_eq!(EntityState::Text(None).to_string(), "unknown");
        assert_eq!(EntityState::Number(Some(22.5)).to_string(), "22.5");
    }
}

// ── Host events ──
//
// Everything the integration reports to its host after setup. The bridge
// task publishes these on a broadcast channel; entity platforms and the
// CLI both subscribe.

use serde::Serialize;
use serde_json::Value;

/// Event name of a physical button press.
pub const EVENT_BUTTON: &str = "smartthings.button";

/// Payload of a [`EVENT_BUTTON`] event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonEvent {
    pub component_id: String,
    pub device_id: String,
    pub location_id: String,
    pub value: Value,
    /// Device label.
    pub name: String,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    ButtonPressed(ButtonEvent),
    /// A device attribute changed and the store holds the new value.
    StatusUpdated {
        device_id: String,
        component_id: String,
        capability: String,
        attribute: String,
    },
    DeviceRemoved {
        device_id: String,
    },
    /// The event subscription was replaced or dropped. The host should
    /// persist the new id with the entry.
    SubscriptionChanged {
        subscription_id: Option<String>,
    },
    /// The event stream gave up; the host should reload the entry.
    ReloadRequested,
}

impl HostEvent {
    /// Host-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ButtonPressed(_) => EVENT_BUTTON,
            Self::StatusUpdated { .. } => "status_updated",
            Self::DeviceRemoved { .. } => "device_removed",
            Self::SubscriptionChanged { .. } => "subscription_changed",
            Self::ReloadRequested => "reload_requested",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn button_event_serializes_flat() {
        let event = HostEvent::ButtonPressed(ButtonEvent {
            component_id: "main".into(),
            device_id: "d1".into(),
            location_id: "loc".into(),
            value: json!("pushed"),
            name: "Remote".into(),
            data: None,
        });
        assert_eq!(event.name(), "smartthings.button");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "button_pressed",
                "component_id": "main",
                "device_id": "d1",
                "location_id": "loc",
                "value": "pushed",
                "name": "Remote",
                "data": null
            })
        );
    }
}

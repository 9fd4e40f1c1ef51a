// ── Wire models for the SmartThings REST and event APIs ──
//
// Field names follow the cloud's camelCase JSON. Optional fields default
// so older or partial payloads still deserialize.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the primary component every addressable device exposes.
pub const MAIN: &str = "main";

// ── Paging ───────────────────────────────────────────────────────────

/// `{ items: [...], _links: { next: { href } } }` envelope used by list calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, rename = "_links")]
    pub links: Option<PageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

impl<T> Page<T> {
    /// Absolute URL of the next page, if any.
    pub fn next_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .map(|n| n.href.as_str())
    }
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub parent_device_id: Option<String>,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub hub: Option<Hub>,
    #[serde(default)]
    pub ocf: Option<Ocf>,
    #[serde(default)]
    pub viper: Option<Viper>,
}

impl Device {
    /// Look up a component by id.
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Category of the main component: user override first, then manufacturer.
    pub fn main_category(&self) -> Option<&str> {
        let main = self.component(MAIN)?;
        main.user_category().or_else(|| main.manufacturer_category())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<CapabilityReference>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Component {
    fn category_of(&self, kind: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.category_type.as_deref() == Some(kind))
            .map(|c| c.name.as_str())
    }

    pub fn user_category(&self) -> Option<&str> {
        self.category_of("user")
    }

    pub fn manufacturer_category(&self) -> Option<&str> {
        self.category_of("manufacturer")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityReference {
    pub id: String,
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub category_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hub {
    #[serde(default)]
    pub hub_eui: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub hub_data: Option<HubData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubData {
    #[serde(default)]
    pub hardware_type: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
}

impl Hub {
    pub fn hardware_type(&self) -> Option<&str> {
        self.hub_data.as_ref()?.hardware_type.as_deref()
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.hub_data.as_ref()?.mac_address.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ocf {
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    /// `"<model>|<variant>|..."`
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default, rename = "hwVersion")]
    pub hardware_version: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viper {
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, rename = "hwVersion")]
    pub hardware_version: Option<String>,
    #[serde(default, rename = "swVersion")]
    pub software_version: Option<String>,
}

// ── Status ───────────────────────────────────────────────────────────

/// One attribute reading: value plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Status {
    /// The value, treating JSON `null` the same as absent.
    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }
}

/// attribute -> status
pub type CapabilityStatus = BTreeMap<String, Status>;
/// capability -> attributes
pub type ComponentStatus = BTreeMap<String, CapabilityStatus>;
/// component -> capabilities
pub type DeviceStatus = BTreeMap<String, ComponentStatus>;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceStatusResponse {
    #[serde(default)]
    pub components: DeviceStatus,
}

// ── Rooms & scenes ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub scene_id: String,
    #[serde(default)]
    pub scene_name: String,
    #[serde(default)]
    pub scene_icon: Option<String>,
    #[serde(default)]
    pub scene_color: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
}

// ── Commands ─────────────────────────────────────────────────────────

/// One entry of the `POST devices/{id}/commands` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCommand {
    pub component: String,
    pub capability: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
pub(crate) struct CommandBody<'a> {
    pub commands: &'a [DeviceCommand],
}

// ── Subscriptions ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "id")]
    pub subscription_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// SSE endpoint for this subscription.
    pub registration_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSubscription<'a> {
    pub name: &'a str,
    pub version: u32,
    pub installed_app_id: &'a str,
    pub subscription_filters: Vec<SubscriptionFilter<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionFilter<'a> {
    #[serde(rename = "type")]
    pub filter_type: &'static str,
    pub value: Vec<&'a str>,
    pub event_type: &'static [&'static str],
}

// ── Events ───────────────────────────────────────────────────────────

/// A capability attribute changed on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub location_id: String,
    pub device_id: String,
    #[serde(default = "main_component")]
    pub component_id: String,
    pub capability: String,
    pub attribute: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub state_change: Option<bool>,
}

fn main_component() -> String {
    MAIN.to_string()
}

/// Device created, updated or deleted in the location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLifecycleEvent {
    pub lifecycle: Lifecycle,
    pub device_id: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
    Create,
    Update,
    Delete,
    RoomMove,
    #[serde(other)]
    Other,
}

/// Decoded payload of one event-stream message.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Device(DeviceEvent),
    Lifecycle(DeviceLifecycleEvent),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventEnvelope {
    pub event_type: String,
    #[serde(default)]
    pub device_event: Option<DeviceEvent>,
    #[serde(default)]
    pub device_lifecycle_event: Option<DeviceLifecycleEvent>,
}

impl EventEnvelope {
    pub(crate) fn into_event(self) -> Option<Event> {
        match self.event_type.as_str() {
            "DEVICE_EVENT" => self.device_event.map(Event::Device),
            "DEVICE_LIFECYCLE_EVENT" => self.device_lifecycle_event.map(Event::Lifecycle),
            _ => None,
        }
    }
}

//! Async client for the SmartThings cloud.
//!
//! Covers the REST surface the integration needs (devices, status, rooms,
//! scenes, commands, subscriptions), the server-sent event stream, and
//! OAuth2 token refresh.

pub mod auth;
pub mod capability;
pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod transport;

pub use auth::{OAuthClient, OAuthSession, OAuthToken, StaticToken, TokenProvider};
pub use capability::{Attribute, Capability, Command};
pub use client::SmartThingsClient;
pub use error::Error;
pub use events::{EventStreamHandle, ReconnectConfig, StreamMessage, StreamTarget};
pub use models::{
    CapabilityStatus, Component, ComponentStatus, Device, DeviceCommand, DeviceEvent,
    DeviceLifecycleEvent, DeviceStatus, Event, Lifecycle, MAIN, Room, Scene, Status, Subscription,
};
pub use transport::TransportConfig;

// smartwash-core: Integration logic between smartwash-api and hosts (CLI).

pub mod command;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod integration;
pub mod model;
pub mod normalize;
pub mod platform;
pub mod program;
pub mod registry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandHandle};
pub use config::{CURRENT_VERSION, EntryConfig, OAuthClientConfig, TokenData, migrate_entry};
pub use entity::{Entity, EntityCategory, EntityState, Platform, ValueType};
pub use error::CoreError;
pub use event::{ButtonEvent, EVENT_BUTTON, HostEvent};
pub use integration::{EntryState, Integration};
pub use platform::{AnyEntity, Entities, EntityAction};
pub use registry::DeviceRegistry;
pub use store::DeviceStore;

pub use normalize::process_status;
pub use program::{process_programs, translate_program_course};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Connection, DeviceInfo, FullDevice, Program, ProgramOptions, Programs, SupportedOption,
};

// ── Domain model ──

pub mod device;
pub mod program;

pub use device::{Connection, DeviceInfo, FullDevice};
pub use program::{Program, ProgramOptions, Programs, SupportedOption};

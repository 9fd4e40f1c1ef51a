// ── Program domain types ──

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Option keys a washer/dryer program may declare in `supportedOptions`.
///
/// Iteration order is the order options are read from a cycle entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SupportedOption {
    BubbleSoak,
    DryingLevel,
    DryingTemperature,
    KeepFresh,
    RinseCycle,
    Sanitize,
    SoilLevel,
    SpinLevel,
    WaterTemperature,
}

/// The option values one program allows for one [`SupportedOption`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOptions {
    pub supported_option: SupportedOption,
    /// Vendor-encoded option bitfield.
    pub raw: String,
    pub default: Option<String>,
    /// Always contains `default` when one is set.
    pub options: IndexSet<String>,
}

/// A selectable washer/dryer/steam-closet cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Display key, e.g. `Course_1C`.
    pub program_id: String,
    pub program_type: String,
    pub bubble_soak: bool,
    pub supported_options: IndexMap<SupportedOption, ProgramOptions>,
}

impl Program {
    /// A course-only program with no option table.
    pub fn course(program_id: String) -> Self {
        Self {
            program_id,
            program_type: "Course".into(),
            bubble_soak: false,
            supported_options: IndexMap::new(),
        }
    }
}

/// Program catalog of one device, keyed by program id.
pub type Programs = IndexMap<String, Program>;

//! Clap derive structures for the `smartwash` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// smartwash -- drive SmartThings appliances from the command line
#[derive(Debug, Parser)]
#[command(
    name = "smartwash",
    version,
    about = "Control SmartThings washers, dryers and appliances from the command line",
    long_about = "Sets up a SmartThings config entry against the cloud API, exposes its\n\
        appliances as switches, selects, numbers, buttons and binary sensors,\n\
        and streams device events.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SMARTWASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Config entry to use
    #[arg(long, short = 'e', env = "SMARTWASH_ENTRY", global = true)]
    pub entry: Option<String>,

    /// SmartThings location id (overrides the entry)
    #[arg(long, env = "SMARTWASH_LOCATION", global = true)]
    pub location: Option<String>,

    /// Installed app id (overrides the entry)
    #[arg(long, env = "SMARTWASH_INSTALLED_APP", global = true)]
    pub installed_app: Option<String>,

    /// Access token (overrides the entry)
    #[arg(long, env = "SMARTWASH_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// REST base URL (overrides the entry)
    #[arg(long, env = "SMARTWASH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SMARTWASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SMARTWASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect appliances
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show the program catalog of an appliance
    #[command(alias = "prog")]
    Programs(ProgramsArgs),

    /// List entities and drive entity actions
    #[command(alias = "ent")]
    Entities(EntitiesArgs),

    /// List and activate scenes
    Scenes(ScenesArgs),

    /// Stream host events (status updates, button presses, removals)
    Watch(WatchArgs),

    /// Manage config entries
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List appliances of the entry
    #[command(alias = "ls")]
    List,

    /// Show registry details and status of one appliance
    Get {
        /// Device id or label
        device: String,
    },
}

// ── Programs ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProgramsArgs {
    /// Device id or label
    pub device: String,

    /// Also list every option value per program
    #[arg(long)]
    pub options: bool,
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    #[command(subcommand)]
    pub command: EntitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntitiesCommand {
    /// List entities
    #[command(alias = "ls")]
    List {
        /// Only entities of this device (id or label)
        #[arg(long, short = 'd')]
        device: Option<String>,

        /// Only entities of this platform
        #[arg(long, short = 'p')]
        platform: Option<PlatformArg>,
    },

    /// Show one entity
    Get {
        /// Entity unique id
        unique_id: String,
    },

    /// Turn a switch on
    TurnOn { unique_id: String },

    /// Turn a switch off
    TurnOff { unique_id: String },

    /// Pick a select option
    Select { unique_id: String, option: String },

    /// Set a number value
    Set {
        unique_id: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Press a button
    Press { unique_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    BinarySensor,
    Button,
    Number,
    Scene,
    Select,
    Switch,
}

// ── Scenes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScenesArgs {
    #[command(subcommand)]
    pub command: ScenesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScenesCommand {
    /// List scenes of the entry's location
    #[command(alias = "ls")]
    List,

    /// Activate a scene
    Activate {
        /// Scene id or name
        scene: String,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Only events of this device
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// List config entries
    Entries,

    /// Set the default entry
    Use {
        /// Entry name
        name: String,
    },

    /// Store an access token in the system keyring
    SetToken {
        /// Entry name (defaults to the active entry)
        #[arg(long)]
        entry: Option<String>,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

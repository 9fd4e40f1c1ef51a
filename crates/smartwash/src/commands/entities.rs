//! Entity command handlers: list, inspect, and act on entities.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use smartwash_core::{
    AnyEntity, Entities, Entity, EntityAction, EntityCategory, EntityState, Integration, Platform,
};

use crate::cli::{EntitiesArgs, EntitiesCommand, GlobalOpts, PlatformArg};
use crate::error::CliError;
use crate::output;

use super::util;

// ── View ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EntityView {
    unique_id: String,
    platform: Platform,
    device_id: Option<String>,
    translation_key: Option<String>,
    category: Option<EntityCategory>,
    state: EntityState,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
}

impl From<&AnyEntity> for EntityView {
    fn from(e: &AnyEntity) -> Self {
        Self {
            unique_id: e.unique_id().to_owned(),
            platform: e.platform(),
            device_id: e.device_id().map(str::to_owned),
            translation_key: e.translation_key().map(str::to_owned),
            category: e.entity_category(),
            state: e.state(),
            available: e.available(),
            options: e.options(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Unique ID")]
    unique_id: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "State")]
    state: String,
}

impl EntityRow {
    fn new(v: &EntityView, color: bool) -> Self {
        Self {
            unique_id: v.unique_id.clone(),
            platform: v.platform.to_string(),
            key: v.translation_key.clone().unwrap_or_default(),
            category: v.category.map(|c| c.to_string()).unwrap_or_default(),
            state: output::paint_state(&v.state.to_string(), v.available, color),
        }
    }
}

fn detail(v: &EntityView) -> String {
    let mut lines = vec![
        format!("Unique ID:  {}", v.unique_id),
        format!("Platform:   {}", v.platform),
        format!("Device:     {}", v.device_id.as_deref().unwrap_or("-")),
        format!("Key:        {}", v.translation_key.as_deref().unwrap_or("-")),
        format!(
            "Category:   {}",
            v.category.map_or_else(|| "-".into(), |c| c.to_string())
        ),
        format!("State:      {}", v.state),
        format!("Available:  {}", if v.available { "yes" } else { "no" }),
    ];
    if let Some(ref options) = v.options {
        lines.push(format!("Options:    {}", options.join(", ")));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    integration: &Integration,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entities = loaded_entities(integration).await?;

    let (unique_id, action) = match args.command {
        EntitiesCommand::List { device, platform } => {
            let device_id = match device {
                Some(ref d) => Some(util::resolve_device(integration, d)?.device_id().to_owned()),
                None => None,
            };
            let platform = platform.map(platform_of);
            let views: Vec<EntityView> = entities
                .iter()
                .filter(|e| device_id.is_none() || e.device_id() == device_id.as_deref())
                .filter(|e| platform.is_none_or(|p| e.platform() == p))
                .map(EntityView::from)
                .collect();
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &views,
                |v| EntityRow::new(v, color),
                |v| v.unique_id.clone(),
            );
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        EntitiesCommand::Get { unique_id } => {
            let entity = find(&entities, &unique_id)?;
            let view = EntityView::from(entity);
            let out =
                output::render_single(&global.output, &view, detail, |v| v.unique_id.clone());
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        EntitiesCommand::TurnOn { unique_id } => (unique_id, EntityAction::TurnOn),
        EntitiesCommand::TurnOff { unique_id } => (unique_id, EntityAction::TurnOff),
        EntitiesCommand::Select { unique_id, option } => {
            (unique_id, EntityAction::SelectOption(option))
        }
        EntitiesCommand::Set { unique_id, value } => (unique_id, EntityAction::SetValue(value)),
        EntitiesCommand::Press { unique_id } => (unique_id, EntityAction::Press),
    };

    find(&entities, &unique_id)?;
    let label = action.to_string();
    entities.perform(&unique_id, action).await?;
    if !global.quiet {
        eprintln!("{label} sent to {unique_id}");
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Entities of the running entry; absent only when setup never finished.
pub(super) async fn loaded_entities(integration: &Integration) -> Result<Arc<Entities>, CliError> {
    integration
        .entities()
        .await
        .ok_or_else(|| CliError::ConnectionFailed {
            message: format!("entry is not loaded ({:?})", integration.state()),
        })
}

fn find<'a>(entities: &'a Entities, unique_id: &str) -> Result<&'a AnyEntity, CliError> {
    entities.get(unique_id).ok_or_else(|| CliError::NotFound {
        resource_type: "entity".into(),
        identifier: unique_id.into(),
        list_command: "entities list".into(),
    })
}

fn platform_of(arg: PlatformArg) -> Platform {
    match arg {
        PlatformArg::BinarySensor => Platform::BinarySensor,
        PlatformArg::Button => Platform::Button,
        PlatformArg::Number => Platform::Number,
        PlatformArg::Scene => Platform::Scene,
        PlatformArg::Select => Platform::Select,
        PlatformArg::Switch => Platform::Switch,
    }
}

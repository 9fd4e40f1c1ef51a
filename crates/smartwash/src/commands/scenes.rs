//! Scene command handlers.

use std::sync::Arc;

use tabled::Tabled;

use smartwash_api::Scene;
use smartwash_core::{EntityAction, Integration};

use crate::cli::{GlobalOpts, ScenesArgs, ScenesCommand};
use crate::error::CliError;
use crate::output;

use super::{entities, util};

#[derive(Tabled)]
struct SceneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Icon")]
    icon: String,
}

impl From<&Arc<Scene>> for SceneRow {
    fn from(s: &Arc<Scene>) -> Self {
        Self {
            id: s.scene_id.clone(),
            name: s.scene_name.clone(),
            icon: s.scene_icon.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(
    integration: &Integration,
    args: ScenesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ScenesCommand::List => {
            let scenes = integration.store().scenes_snapshot();
            let out = output::render_list(&global.output, &scenes, |s| SceneRow::from(s), |s| {
                s.scene_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ScenesCommand::Activate { scene } => {
            let scene = util::resolve_scene(integration, &scene)?;
            let entities = entities::loaded_entities(integration).await?;
            entities
                .perform(&scene.scene_id, EntityAction::Activate)
                .await?;
            if !global.quiet {
                eprintln!("Activated scene {}", scene.scene_name);
            }
            Ok(())
        }
    }
}

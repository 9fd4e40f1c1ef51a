// ── Scene platform ──

use std::fmt;
use std::sync::Arc;

use smartwash_api::Scene;

use super::AnyEntity;
use crate::command::{Command, CommandHandle};
use crate::entity::{Entity, EntityState, Platform};
use crate::error::CoreError;
use crate::store::DeviceStore;

/// A location scene. Activation runs it in the cloud; there is no state.
pub struct SceneEntity {
    scene: Arc<Scene>,
    commands: CommandHandle,
    store: Arc<DeviceStore>,
}

impl fmt::Debug for SceneEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEntity")
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}

impl SceneEntity {
    pub fn new(scene: Arc<Scene>, store: Arc<DeviceStore>, commands: CommandHandle) -> Self {
        Self {
            scene,
            commands,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.scene.scene_name
    }

    pub fn location_id(&self) -> Option<&str> {
        self.scene.location_id.as_deref()
    }

    pub async fn activate(&self) -> Result<(), CoreError> {
        tracing::debug!(scene_id = %self.scene.scene_id, "activating scene");
        self.commands
            .execute(Command::ExecuteScene {
                scene_id: self.scene.scene_id.clone(),
            })
            .await
    }
}

impl Entity for SceneEntity {
    fn platform(&self) -> Platform {
        Platform::Scene
    }

    fn unique_id(&self) -> &str {
        &self.scene.scene_id
    }

    fn translation_key(&self) -> Option<&str> {
        None
    }

    fn device_id(&self) -> Option<&str> {
        None
    }

    fn state(&self) -> EntityState {
        EntityState::Stateless
    }

    fn available(&self) -> bool {
        self.store.scene(&self.scene.scene_id).is_some()
    }
}

pub(crate) fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Vec<AnyEntity> {
    store
        .scenes_snapshot()
        .iter()
        .map(|scene| {
            AnyEntity::Scene(SceneEntity::new(
                Arc::clone(scene),
                Arc::clone(store),
                commands.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::testing::recording_commands;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn activation_executes_the_scene() {
        let (commands, mut seen) = recording_commands();
        let store = Arc::new(DeviceStore::new());
        store.set_scenes(vec![
            serde_json::from_value(json!({
                "sceneId": "s1",
                "sceneName": "Laundry done",
                "locationId": "loc"
            }))
            .unwrap(),
        ]);

        let entities = build(&store, &commands);
        let [AnyEntity::Scene(scene)] = entities.as_slice() else {
            panic!("expected one scene entity");
        };
        assert_eq!(scene.unique_id(), "s1");
        assert_eq!(scene.name(), "Laundry done");
        assert!(scene.available());

        scene.activate().await.unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            Command::ExecuteScene {
                scene_id: "s1".into()
            }
        );
    }
}

// ── Button platform ──
//
// Washer operating-state buttons on the main component. The pause/resume
// button toggles between its two commands on every press.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use smartwash_api::{Capability, Command, MAIN};

use super::AnyEntity;
use crate::command::CommandHandle;
use crate::entity::{Entity, EntityContext, EntityState, Platform};
use crate::error::CoreError;
use crate::store::DeviceStore;

#[derive(Debug, Clone, Copy)]
pub struct ButtonDescription {
    pub capability: Capability,
    pub key: &'static str,
    pub translation_key: &'static str,
    pub icon: &'static str,
    /// Command sent by a single-command button; for a toggle, the
    /// command the cycle starts from.
    pub command: Command,
    /// Commands cycled through on successive presses. Empty for plain
    /// buttons.
    pub command_list: &'static [Command],
}

pub const BUTTONS: &[ButtonDescription] = &[
    ButtonDescription {
        capability: Capability::SamsungCeWasherOperatingState,
        key: "start",
        translation_key: "state_start",
        icon: "mdi:play-circle",
        command: Command::Start,
        command_list: &[],
    },
    ButtonDescription {
        capability: Capability::SamsungCeWasherOperatingState,
        key: "cancel",
        translation_key: "state_cancel",
        icon: "mdi:stop-circle",
        command: Command::Cancel,
        command_list: &[],
    },
    ButtonDescription {
        capability: Capability::SamsungCeWasherOperatingState,
        key: "pause_resume",
        translation_key: "state_pause_resume",
        icon: "mdi:pause-circle",
        command: Command::Resume,
        command_list: &[Command::Pause, Command::Resume],
    },
    ButtonDescription {
        capability: Capability::SamsungCeWasherOperatingState,
        key: "estimateOperationTime",
        translation_key: "estimate_operation_time",
        icon: "mdi:clock-end",
        command: Command::EstimateOperationTime,
        command_list: &[],
    },
];

#[derive(Debug)]
pub struct SmartThingsButton {
    ctx: EntityContext,
    description: &'static ButtonDescription,
    unique_id: String,
    /// Index into `command_list` of the last command sent.
    position: AtomicUsize,
}

impl SmartThingsButton {
    pub fn new(ctx: EntityContext, description: &'static ButtonDescription) -> Self {
        let unique_id = format!("{}.{}", ctx.device_id(), description.key);
        let position = description
            .command_list
            .iter()
            .position(|c| *c == description.command)
            .unwrap_or(0);
        Self {
            ctx,
            description,
            unique_id,
            position: AtomicUsize::new(position),
        }
    }

    pub fn description(&self) -> &'static ButtonDescription {
        self.description
    }

    /// The command the next press will send.
    pub fn next_command(&self) -> Command {
        let list = self.description.command_list;
        if list.is_empty() {
            return self.description.command;
        }
        list[(self.position.load(Ordering::SeqCst) + 1) % list.len()]
    }

    pub async fn press(&self) -> Result<(), CoreError> {
        let list = self.description.command_list;
        let command = if list.is_empty() {
            self.description.command
        } else {
            let len = list.len();
            let previous = self
                .position
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
                .unwrap_or_else(|i| i);
            list[(previous + 1) % len]
        };
        self.ctx.execute(self.description.capability, command, None).await
    }
}

impl Entity for SmartThingsButton {
    fn platform(&self) -> Platform {
        Platform::Button
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn translation_key(&self) -> Option<&str> {
        Some(self.description.translation_key)
    }

    fn device_id(&self) -> Option<&str> {
        Some(self.ctx.device_id())
    }

    fn state(&self) -> EntityState {
        EntityState::Stateless
    }

    fn available(&self) -> bool {
        self.ctx.available()
    }
}

// ── Setup ────────────────────────────────────────────────────────────

pub(crate) fn build(store: &Arc<DeviceStore>, commands: &CommandHandle) -> Vec<AnyEntity> {
    let mut entities = Vec::new();
    for device in store.devices_snapshot().iter() {
        for description in BUTTONS {
            if !device.has_capability(MAIN, description.capability.as_ref()) {
                continue;
            }
            let ctx = EntityContext::new(
                Arc::clone(store),
                commands.clone(),
                device.device_id(),
                MAIN,
                [description.capability],
            );
            entities.push(AnyEntity::Button(SmartThingsButton::new(ctx, description)));
        }
    }
    entities
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Command as CoreCommand;
    use crate::entity::testing::{device, idle_commands, recording_commands, store_with};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn washer() -> serde_json::Value {
        json!({
            "main": {"samsungce.washerOperatingState": {"operatingState": {"value": "ready"}}},
            "sub": {"samsungce.washerOperatingState": {"operatingState": {"value": "ready"}}}
        })
    }

    fn buttons(entities: Vec<AnyEntity>) -> Vec<SmartThingsButton> {
        entities
            .into_iter()
            .filter_map(|e| match e {
                AnyEntity::Button(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn buttons_exist_on_main_only() {
        let store = store_with(vec![device("d1", washer())]);
        let ids: Vec<_> = buttons(build(&store, &idle_commands()))
            .iter()
            .map(|b| b.unique_id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["d1.start", "d1.cancel", "d1.pause_resume", "d1.estimateOperationTime"]
        );
    }

    #[tokio::test]
    async fn pause_resume_alternates_starting_with_pause() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", washer())]);
        let toggle = buttons(build(&store, &commands)).remove(2);
        assert_eq!(toggle.next_command(), Command::Pause);

        for expected in ["pause", "resume", "pause"] {
            toggle.press().await.unwrap();
            assert_eq!(
                seen.recv().await.unwrap(),
                CoreCommand::device("d1", "main", "samsungce.washerOperatingState", expected, None)
            );
        }
    }

    #[tokio::test]
    async fn start_sends_start() {
        let (commands, mut seen) = recording_commands();
        let store = store_with(vec![device("d1", washer())]);
        buttons(build(&store, &commands))[0].press().await.unwrap();
        assert_eq!(
            seen.recv().await.unwrap(),
            CoreCommand::device("d1", "main", "samsungce.washerOperatingState", "start", None)
        );
    }
}

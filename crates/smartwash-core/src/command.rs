// ── Command API ──
//
// All writes to the cloud flow through a unified `Command` enum. Entity
// wrappers hold a `CommandHandle`; the integration's command processor
// owns the client and executes one command at a time.

use tokio::sync::{mpsc, oneshot};

use smartwash_api::DeviceCommand;

use crate::error::CoreError;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<(), CoreError>>,
}

/// All write operations the integration performs on behalf of entities.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `POST devices/{device_id}/commands` with a single command.
    Device {
        device_id: String,
        command: DeviceCommand,
    },
    ExecuteScene {
        scene_id: String,
    },
}

impl Command {
    pub fn device(
        device_id: impl Into<String>,
        component: impl Into<String>,
        capability: impl AsRef<str>,
        command: impl AsRef<str>,
        arguments: Option<Vec<serde_json::Value>>,
    ) -> Self {
        Self::Device {
            device_id: device_id.into(),
            command: DeviceCommand {
                component: component.into(),
                capability: capability.as_ref().to_owned(),
                command: command.as_ref().to_owned(),
                arguments,
            },
        }
    }
}

/// Sending half of the command channel, cloned into every entity.
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::Sender<CommandEnvelope>,
}

impl CommandHandle {
    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<CommandEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Send a command and wait for the processor's reply.
    ///
    /// Fails with [`CoreError::ControllerDisconnected`] once the processor
    /// has stopped.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(CommandEnvelope {
                command,
                response_tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;
        response_rx
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn execute_round_trips_through_the_processor() {
        let (handle, mut rx) = CommandHandle::channel(4);
        let processor = tokio::spawn(async move {
            let envelope = rx.recv().await.unwrap();
            let ok = matches!(&envelope.command, Command::Device { device_id, .. } if device_id == "d1");
            let _ = envelope.response_tx.send(if ok {
                Ok(())
            } else {
                Err(CoreError::Unsupported {
                    operation: "unexpected".into(),
                })
            });
        });

        let cmd = Command::device("d1", "main", "switch", "on", Some(vec![json!("on")]));
        handle.execute(cmd).await.unwrap();
        processor.await.unwrap();
    }

    #[tokio::test]
    async fn closed_processor_reports_disconnected() {
        let (handle, rx) = CommandHandle::channel(1);
        drop(rx);
        let err = handle
            .execute(Command::ExecuteScene {
                scene_id: "s1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ControllerDisconnected));
    }
}

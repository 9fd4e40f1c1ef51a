// ── Integration lifecycle ──
//
// Setup, unload and shutdown of one config entry. Setup authenticates,
// replaces the event subscription, loads rooms/devices/status/scenes into
// the store, and spawns the background tasks: the event bridge, the
// command processor and the program-change tracker.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use smartwash_api::{
    Attribute, Capability, DeviceEvent, Error as ApiError, Event, EventStreamHandle, Lifecycle,
    OAuthClient, OAuthSession, OAuthToken, ReconnectConfig, SmartThingsClient, StaticToken,
    StreamMessage, StreamTarget, TokenProvider, TransportConfig,
};

use crate::command::{Command, CommandEnvelope, CommandHandle};
use crate::config::{EntryConfig, TokenData};
use crate::error::CoreError;
use crate::event::{ButtonEvent, HostEvent};
use crate::model::FullDevice;
use crate::normalize::process_status;
use crate::platform::{Entities, track_program_changes};
use crate::program::process_programs;
use crate::registry::DeviceRegistry;
use crate::store::DeviceStore;

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 256;

// ── EntryState ───────────────────────────────────────────────────────

/// Lifecycle state of the config entry, observable by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    NotLoaded,
    SettingUp,
    Loaded,
    /// A transient failure; the host should retry setup later.
    SetupRetry,
    /// Credentials were rejected; the user must re-authenticate.
    ReauthRequired,
    SetupError,
}

// ── Integration ──────────────────────────────────────────────────────

/// Runtime of one config entry.
///
/// Cheaply cloneable via `Arc<IntegrationInner>`. One instance runs one
/// setup/unload cycle; a reload builds a fresh instance from the entry.
#[derive(Clone)]
pub struct Integration {
    inner: Arc<IntegrationInner>,
}

struct IntegrationInner {
    entry: watch::Sender<EntryConfig>,
    store: Arc<DeviceStore>,
    registry: Arc<DeviceRegistry>,
    state: watch::Sender<EntryState>,
    event_tx: broadcast::Sender<Arc<HostEvent>>,
    commands: CommandHandle,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    client: Mutex<Option<Arc<SmartThingsClient>>>,
    session: Mutex<Option<Arc<OAuthSession>>>,
    entities: Mutex<Option<Arc<Entities>>>,
    /// Subscription created by setup, deleted again on host shutdown.
    setup_subscription: Mutex<Option<String>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Integration {
    /// Create the runtime for `entry`. Does NOT contact the cloud; call
    /// [`setup()`](Self::setup).
    pub fn new(entry: EntryConfig, registry: Arc<DeviceRegistry>) -> Self {
        let (entry, _) = watch::channel(entry);
        let (state, _) = watch::channel(EntryState::NotLoaded);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (commands, command_rx) = CommandHandle::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(IntegrationInner {
                entry,
                store: Arc::new(DeviceStore::new()),
                registry,
                state,
                event_tx,
                commands,
                command_rx: Mutex::new(Some(command_rx)),
                client: Mutex::new(None),
                session: Mutex::new(None),
                entities: Mutex::new(None),
                setup_subscription: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Current entry data, including any rewritten subscription id.
    pub fn entry(&self) -> EntryConfig {
        self.inner.entry.borrow().clone()
    }

    pub fn watch_entry(&self) -> watch::Receiver<EntryConfig> {
        self.inner.entry.subscribe()
    }

    pub fn state(&self) -> EntryState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<EntryState> {
        self.inner.state.subscribe()
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.inner.registry
    }

    /// Subscribe to host events.
    pub fn events(&self) -> broadcast::Receiver<Arc<HostEvent>> {
        self.inner.event_tx.subscribe()
    }

    /// Entities built during setup, `None` before setup completes.
    pub async fn entities(&self) -> Option<Arc<Entities>> {
        self.inner.entities.lock().await.clone()
    }

    /// Token material after any refresh, for the host to persist.
    /// `None` when no refreshing session is in use.
    pub async fn current_token(&self) -> Option<TokenData> {
        let session = self.inner.session.lock().await.clone()?;
        let token = session.token().await;
        let installed_app_id = token
            .installed_app_id
            .or_else(|| self.entry().token.map(|t| t.installed_app_id))?;
        Some(TokenData {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_at,
            installed_app_id,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Set the entry up.
    ///
    /// Fails with [`CoreError::ReauthRequired`] when the token is missing
    /// or rejected and with [`CoreError::NotReady`] on transient failures.
    /// Background tasks started before a failure are stopped again.
    pub async fn setup(&self) -> Result<(), CoreError> {
        let _ = self.inner.state.send(EntryState::SettingUp);
        match self.try_setup().await {
            Ok(()) => {
                let _ = self.inner.state.send(EntryState::Loaded);
                Ok(())
            }
            Err(e) => {
                self.stop_tasks().await;
                let state = match &e {
                    CoreError::ReauthRequired { .. } => EntryState::ReauthRequired,
                    e if e.is_retryable() => EntryState::SetupRetry,
                    _ => EntryState::SetupError,
                };
                let _ = self.inner.state.send(state);
                warn!(error = %e, ?state, "setup failed");
                Err(e)
            }
        }
    }

    async fn try_setup(&self) -> Result<(), CoreError> {
        let entry = self.entry();
        let Some(token) = entry.token.clone() else {
            return Err(CoreError::ReauthRequired {
                message: "config entry missing token".into(),
            });
        };

        let transport = TransportConfig {
            base_url: entry.api_url.clone(),
            timeout: entry.timeout,
        };
        let tokens = self.token_provider(&entry, &token, &transport).await?;
        let client = Arc::new(SmartThingsClient::new(tokens, &transport)?);

        if let Some(old) = entry.subscription_id.as_deref() {
            debug!(subscription_id = old, "deleting old subscription");
            match client.delete_subscription(old).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(subscription_id = old, "old subscription already gone");
                }
                Err(e) if e.is_connection_error() => {
                    return Err(CoreError::NotReady {
                        message: format!("could not delete old subscription: {e}"),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!("creating a new subscription");
        let subscription = client
            .create_subscription(&entry.location_id, &token.installed_app_id)
            .await
            .map_err(|e| {
                warn!(error = %e, "couldn't create a new subscription");
                CoreError::from(e)
            })?;
        self.set_subscription_id(Some(subscription.subscription_id.clone()));
        *self.inner.setup_subscription.lock().await = Some(subscription.subscription_id.clone());

        let mut handles = self.inner.task_handles.lock().await;

        let stream = EventStreamHandle::spawn(
            Arc::clone(&client),
            StreamTarget {
                location_id: entry.location_id.clone(),
                installed_app_id: token.installed_app_id.clone(),
                subscription,
            },
            ReconnectConfig::default(),
            self.inner.cancel.child_token(),
        );
        handles.push(tokio::spawn(event_bridge_task(
            self.clone(),
            stream.subscribe(),
        )));

        let (rooms, devices) = load_devices(&client, &entry.location_id).await?;
        self.inner
            .registry
            .create_devices(&entry.entry_id, &devices, &rooms);

        let scenes = client.get_scenes(&entry.location_id).await?;

        let known: BTreeSet<String> = devices.iter().map(|d| d.device_id().to_owned()).collect();
        let store = &self.inner.store;
        store.set_rooms(rooms);
        store.set_scenes(scenes);
        for device in devices {
            store.insert_device(device);
        }

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(
                Arc::clone(&client),
                rx,
                self.inner.cancel.clone(),
            )));
        }

        let entities = Arc::new(Entities::build(store, &self.inner.commands));
        handles.push(tokio::spawn(track_program_changes(
            Arc::clone(&entities),
            self.events(),
            self.inner.cancel.clone(),
        )));
        *self.inner.entities.lock().await = Some(entities);
        drop(handles);

        *self.inner.client.lock().await = Some(client);

        let stale = self.inner.registry.remove_stale(&entry.entry_id, &known);
        if !stale.is_empty() {
            debug!(?stale, "detached devices no longer reported by the cloud");
        }

        info!(
            devices = store.device_count(),
            scenes = store.scenes_snapshot().len(),
            "integration set up"
        );
        Ok(())
    }

    async fn token_provider(
        &self,
        entry: &EntryConfig,
        token: &TokenData,
        transport: &TransportConfig,
    ) -> Result<Arc<dyn TokenProvider>, CoreError> {
        let Some(oauth) = &entry.oauth else {
            debug!("no OAuth client registered, using the access token as-is");
            return Ok(Arc::new(StaticToken::new(token.access_token.clone())));
        };

        let session = Arc::new(OAuthSession::new(
            OAuthClient {
                client_id: oauth.client_id.clone(),
                client_secret: oauth.client_secret.clone(),
                token_url: oauth.token_url.clone(),
            },
            OAuthToken {
                access_token: token.access_token.clone(),
                refresh_token: token.refresh_token.clone(),
                expires_at: token.expires_at,
                installed_app_id: Some(token.installed_app_id.clone()),
            },
            transport,
        )?);
        session.ensure_token_valid().await.map_err(token_error)?;
        *self.inner.session.lock().await = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Unload the entry: stop background tasks, delete the current
    /// subscription and drop the runtime data. Connection failures while
    /// deleting the subscription are ignored.
    pub async fn unload(&self) -> Result<(), CoreError> {
        self.stop_tasks().await;

        let client = self.inner.client.lock().await.take();
        let subscription_id = self.entry().subscription_id;
        let result = match (client, subscription_id) {
            (Some(client), Some(id)) => match client.delete_subscription(&id).await {
                Ok(()) => {
                    debug!(subscription_id = %id, "subscription deleted");
                    Ok(())
                }
                Err(e) if e.is_connection_error() || e.is_not_found() => {
                    debug!(error = %e, "could not delete subscription on unload");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            _ => Ok(()),
        };

        *self.inner.entities.lock().await = None;
        self.inner.store.clear();
        let _ = self.inner.state.send(EntryState::NotLoaded);
        info!("integration unloaded");
        result
    }

    /// Host shutdown: delete the subscription created by setup.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        let client = self.inner.client.lock().await.clone();
        let subscription_id = self.inner.setup_subscription.lock().await.clone();
        if let (Some(client), Some(id)) = (client, subscription_id) {
            client.delete_subscription(&id).await?;
            debug!(subscription_id = %id, "subscription deleted on shutdown");
        }
        Ok(())
    }

    async fn stop_tasks(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Execute a command through the command processor.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        if self.state() != EntryState::Loaded {
            return Err(CoreError::ControllerDisconnected);
        }
        self.inner.commands.execute(command).await
    }

    // ── Event bridge ─────────────────────────────────────────────────

    fn emit(&self, event: HostEvent) {
        let _ = self.inner.event_tx.send(Arc::new(event));
    }

    fn set_subscription_id(&self, subscription_id: Option<String>) {
        self.inner
            .entry
            .send_modify(|entry| entry.subscription_id.clone_from(&subscription_id));
        match &subscription_id {
            Some(id) => debug!(subscription_id = %id, "updating subscription id"),
            None => debug!("removing subscription id"),
        }
        self.emit(HostEvent::SubscriptionChanged { subscription_id });
    }

    fn handle_stream_message(&self, message: &StreamMessage) {
        match message {
            StreamMessage::Event(Event::Device(event)) => self.handle_device_event(event),
            StreamMessage::Event(Event::Lifecycle(event)) => {
                if event.lifecycle == Lifecycle::Delete {
                    self.handle_deleted_device(&event.device_id);
                }
            }
            StreamMessage::SubscriptionChanged(id) => self.set_subscription_id(id.clone()),
            StreamMessage::MaxConnectionsReached => {
                debug!("hit the limit of max connections, requesting reload");
                self.emit(HostEvent::ReloadRequested);
            }
        }
    }

    fn handle_device_event(&self, event: &DeviceEvent) {
        if event.capability == Capability::Button.as_ref()
            && event.attribute == Attribute::Button.as_ref()
        {
            match self.inner.store.device(&event.device_id) {
                Some(device) => self.emit(HostEvent::ButtonPressed(ButtonEvent {
                    component_id: event.component_id.clone(),
                    device_id: event.device_id.clone(),
                    location_id: event.location_id.clone(),
                    value: event.value.clone(),
                    name: device.label().to_owned(),
                    data: event.data.clone(),
                })),
                None => debug!(device_id = %event.device_id, "button event for unknown device"),
            }
        }

        if self.inner.store.apply_event(event) {
            self.emit(HostEvent::StatusUpdated {
                device_id: event.device_id.clone(),
                component_id: event.component_id.clone(),
                capability: event.capability.clone(),
                attribute: event.attribute.clone(),
            });
        }
    }

    fn handle_deleted_device(&self, device_id: &str) {
        let entry_id = self.inner.entry.borrow().entry_id.clone();
        self.inner.registry.remove_config_entry(device_id, &entry_id);
        self.inner.store.remove_device(device_id);
        debug!(device_id, "device deleted in the cloud");
        self.emit(HostEvent::DeviceRemoved {
            device_id: device_id.to_owned(),
        });
    }
}

/// Rooms by id, then every device with its normalized status and program
/// catalog. Requests run one after another.
async fn load_devices(
    client: &SmartThingsClient,
    location_id: &str,
) -> Result<(BTreeMap<String, String>, Vec<FullDevice>), CoreError> {
    let rooms = client
        .get_rooms(location_id)
        .await?
        .into_iter()
        .map(|room| (room.room_id, room.name))
        .collect();
    let mut devices = Vec::new();
    for device in client.get_devices().await? {
        let mut status = client.get_device_status(&device.device_id).await?;
        process_status(&mut status);
        let programs = process_programs(&status);
        devices.push(FullDevice {
            device,
            status,
            programs,
        });
    }
    Ok((rooms, devices))
}

/// Token validation failures: HTTP 400 from the token endpoint needs a
/// new login, anything else is retried.
fn token_error(err: ApiError) -> CoreError {
    if err.is_auth_failure() {
        CoreError::ReauthRequired {
            message: format!("token not valid, trigger renewal: {err}"),
        }
    } else {
        CoreError::NotReady {
            message: err.to_string(),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Forward event-stream messages into the store and the host event bus.
async fn event_bridge_task(
    integration: Integration,
    mut rx: broadcast::Receiver<Arc<StreamMessage>>,
) {
    let cancel = integration.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Ok(message) => integration.handle_stream_message(&message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event bridge lagged behind the event stream");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("event stream closed");
                    break;
                }
            },
        }
    }
}

/// Execute entity commands one at a time.
async fn command_processor_task(
    client: Arc<SmartThingsClient>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&client, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

async fn route_command(client: &SmartThingsClient, command: Command) -> Result<(), CoreError> {
    match command {
        Command::Device { device_id, command } => {
            client.execute_device_command(&device_id, command).await?;
        }
        Command::ExecuteScene { scene_id } => client.execute_scene(&scene_id).await?,
    }
    Ok(())
}

//! Server-sent event stream with auto-reconnect.
//!
//! Reads a subscription's `registrationUrl` and broadcasts parsed device and
//! lifecycle events through a [`tokio::sync::broadcast`] channel. Dropped
//! connections are retried with exponential backoff; an expired subscription
//! is replaced and the new identifier is announced on the same channel.
//!
//! # Example
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let handle = EventStreamHandle::spawn(client, target, ReconnectConfig::default(), cancel);
//! let mut rx = handle.subscribe();
//! while let Ok(msg) = rx.recv().await {
//!     println!("{msg:?}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::client::SmartThingsClient;
use crate::error::Error;
use crate::models::{Event, EventEnvelope, Subscription};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── StreamMessage ────────────────────────────────────────────────────

/// Everything the background task reports to its consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A device or lifecycle event.
    Event(Event),
    /// The subscription was replaced (`Some`) or dropped (`None`).
    SubscriptionChanged(Option<String>),
    /// The cloud refused the connection; the stream has stopped.
    MaxConnectionsReached,
}

/// What the stream is attached to, and how to recreate it.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub location_id: String,
    pub installed_app_id: String,
    pub subscription: Subscription,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,
    /// Upper bound on backoff delay. Default: 60s.
    pub max_delay: Duration,
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running event stream task.
pub struct EventStreamHandle {
    event_rx: broadcast::Receiver<Arc<StreamMessage>>,
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the reconnection loop and return immediately.
    pub fn spawn(
        client: Arc<SmartThingsClient>,
        target: StreamTarget,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(client, target, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// Get a new broadcast receiver. Slow consumers see `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StreamMessage>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn stream_loop(
    client: Arc<SmartThingsClient>,
    mut target: StreamTarget,
    event_tx: broadcast::Sender<Arc<StreamMessage>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            r = connect_and_read(&client, &target.subscription.registration_url, &event_tx, &cancel) => r,
        };

        match result {
            Ok(()) => {
                if cancel.is_cancelled() {
                    break;
                }
                tracing::info!("event stream closed by server, reconnecting");
                attempt = 0;
                continue;
            }
            Err(Error::MaxConnectionsReached) => {
                tracing::warn!("maximum event connections reached, stopping stream");
                let _ = event_tx.send(Arc::new(StreamMessage::MaxConnectionsReached));
                break;
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(
                    subscription_id = %target.subscription.subscription_id,
                    "subscription expired, creating a new one"
                );
                let _ = event_tx.send(Arc::new(StreamMessage::SubscriptionChanged(None)));
                match client
                    .create_subscription(&target.location_id, &target.installed_app_id)
                    .await
                {
                    Ok(sub) => {
                        let _ = event_tx.send(Arc::new(StreamMessage::SubscriptionChanged(Some(
                            sub.subscription_id.clone(),
                        ))));
                        target.subscription = sub;
                        attempt = 0;
                        continue;
                    }
                    Err(Error::MaxConnectionsReached) => {
                        let _ = event_tx.send(Arc::new(StreamMessage::MaxConnectionsReached));
                        break;
                    }
                    Err(e) => tracing::warn!(error = %e, "could not recreate subscription"),
                }
            }
            Err(e) => tracing::warn!(error = %e, attempt, "event stream error"),
        }

        if let Some(max) = reconnect.max_retries {
            if attempt >= max {
                tracing::error!(max_retries = max, "event stream retry limit reached, giving up");
                break;
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn connect_and_read(
    client: &SmartThingsClient,
    registration_url: &str,
    event_tx: &broadcast::Sender<Arc<StreamMessage>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let resp = client.open_event_stream(registration_url).await?;
    tracing::info!("event stream connected");

    let mut body = resp.bytes_stream();
    let mut decoder = SseDecoder::default();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for frame in decoder.feed(&bytes) {
                        if let Some(event) = parse_frame(&frame) {
                            // No receivers is fine.
                            let _ = event_tx.send(Arc::new(StreamMessage::Event(event)));
                        }
                    }
                }
                Some(Err(e)) => return Err(Error::Stream(e.to_string())),
                None => return Ok(()),
            },
        }
    }
}

// ── SSE framing ──────────────────────────────────────────────────────

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    line: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes; returns every frame completed by them.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for &b in bytes {
            if b != b'\n' {
                self.line.push(b);
                continue;
            }
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
            let line = String::from_utf8_lossy(&self.line).into_owned();
            self.line.clear();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            if self.data.is_empty() {
                self.event = None;
                return None;
            }
            return Some(SseFrame {
                event: self.event.take(),
                data: std::mem::take(&mut self.data).join("\n"),
            });
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

/// Decode a frame's JSON payload into an [`Event`]. Unknown types are dropped.
fn parse_frame(frame: &SseFrame) -> Option<Event> {
    match serde_json::from_str::<EventEnvelope>(&frame.data) {
        Ok(envelope) => envelope.into_event(),
        Err(e) => {
            tracing::debug!(error = %e, event = ?frame.event, "unparseable event payload");
            None
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// `delay = min(initial * 2^attempt, max)` with +-25% deterministic jitter.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exp = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exp);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

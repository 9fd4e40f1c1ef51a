// Async HTTP client for the SmartThings REST API.
//
// Base path: /v1/
// Auth: `Authorization: Bearer <token>` resolved per request

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::Error;
use crate::models::{
    CommandBody, CreateSubscription, Device, DeviceCommand, DeviceStatus, DeviceStatusResponse,
    Page, Room, Scene, Subscription, SubscriptionFilter,
};
use crate::transport::TransportConfig;

/// Event types the subscription asks the cloud to forward.
const SUBSCRIBED_EVENTS: &[&str] = &["DEVICE_EVENT", "DEVICE_LIFECYCLE_EVENT"];

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(serde::Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the SmartThings cloud.
///
/// Cheap to share behind an `Arc`; every call asks the [`TokenProvider`]
/// for a fresh bearer token.
pub struct SmartThingsClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl SmartThingsClient {
    pub fn new(tokens: Arc<dyn TokenProvider>, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url: transport.base_url.clone(),
            tokens,
        })
    }

    /// The REST base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn bearer(&self) -> Result<String, Error> {
        let token = self.tokens.access_token().await?;
        Ok(format!("Bearer {}", token.expose_secret()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, Error> {
        let mut url = self.url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let mut all = Vec::new();
        loop {
            let page: Page<T> = self.get(url).await?;
            let next = page.next_href().map(Url::parse).transpose()?;
            all.extend(page.items);
            match next {
                Some(n) => url = n,
                None => break,
            }
        }
        Ok(all)
    }

    async fn post_raw<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");
        Ok(self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .json(body)
            .send()
            .await?)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Devices ──────────────────────────────────────────────────────

    /// Every device visible to the token, following `_links.next`.
    pub async fn get_devices(&self) -> Result<Vec<Device>, Error> {
        self.get_all("devices", &[]).await
    }

    pub async fn get_device_status(&self, device_id: &str) -> Result<DeviceStatus, Error> {
        let url = self.url(&format!("devices/{device_id}/status"))?;
        let resp: DeviceStatusResponse = self.get(url).await?;
        Ok(resp.components)
    }

    /// Send one command to a device.
    pub async fn execute_device_command(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<(), Error> {
        debug!(
            device_id,
            component = %command.component,
            capability = %command.capability,
            command = %command.command,
            "executing device command"
        );
        let commands = [command];
        let resp = self
            .post_raw(
                &format!("devices/{device_id}/commands"),
                &CommandBody {
                    commands: &commands,
                },
            )
            .await?;
        handle_empty(resp).await
    }

    // ── Locations ────────────────────────────────────────────────────

    pub async fn get_rooms(&self, location_id: &str) -> Result<Vec<Room>, Error> {
        self.get_all(&format!("locations/{location_id}/rooms"), &[])
            .await
    }

    // ── Scenes ───────────────────────────────────────────────────────

    pub async fn get_scenes(&self, location_id: &str) -> Result<Vec<Scene>, Error> {
        self.get_all("scenes", &[("locationId", location_id)]).await
    }

    pub async fn execute_scene(&self, scene_id: &str) -> Result<(), Error> {
        let resp = self
            .post_raw(
                &format!("scenes/{scene_id}/execute"),
                &serde_json::json!({}),
            )
            .await?;
        handle_empty(resp).await
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Create an event subscription for a location.
    ///
    /// Failures surface as [`Error::Sink`], except HTTP 429 which means the
    /// location already has its maximum number of open event connections.
    pub async fn create_subscription(
        &self,
        location_id: &str,
        installed_app_id: &str,
    ) -> Result<Subscription, Error> {
        let body = CreateSubscription {
            name: "smartwash",
            version: 1,
            installed_app_id,
            subscription_filters: vec![SubscriptionFilter {
                filter_type: "LOCATIONIDS",
                value: vec![location_id],
                event_type: SUBSCRIBED_EVENTS,
            }],
        };
        let resp = self.post_raw("subscriptions", &body).await?;
        let status = resp.status();
        if status.is_success() {
            return decode_body(resp).await;
        }
        match parse_error(status, resp).await {
            err @ Error::Authentication { .. } => Err(err),
            _ if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Err(Error::MaxConnectionsReached)
            }
            Error::Api { message, .. } => Err(Error::Sink { message }),
            other => Err(other),
        }
    }

    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<(), Error> {
        let url = self.url(&format!("subscriptions/{subscription_id}"))?;
        debug!("DELETE {url}");
        let resp = self
            .http
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;
        handle_empty(resp).await
    }

    /// Open the SSE body for a subscription. The response is not consumed.
    pub(crate) async fn open_event_stream(
        &self,
        registration_url: &str,
    ) -> Result<reqwest::Response, Error> {
        let url = Url::parse(registration_url)?;
        debug!("GET {url} (event stream)");
        let resp = self
            .stream_http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(Error::MaxConnectionsReached)
        } else {
            Err(parse_error(status, resp).await)
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn decode_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        decode_body(resp).await
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&raw)
        .ok()
        .and_then(|e| e.error);
    let message = match detail {
        Some(ErrorDetail {
            code: Some(code),
            message: Some(msg),
        }) => format!("{code}: {msg}"),
        Some(ErrorDetail {
            message: Some(msg), ..
        }) => msg,
        _ if raw.is_empty() => status.to_string(),
        _ => raw,
    };

    if status == reqwest::StatusCode::UNAUTHORIZED {
        Error::Authentication { message }
    } else {
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

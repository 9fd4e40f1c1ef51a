//! Live host-event stream.

use std::time::Duration;

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use smartwash_core::{HostEvent, Integration};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    integration: &Integration,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device_id = match args.device {
        Some(ref d) => Some(util::resolve_device(integration, d)?.device_id().to_owned()),
        None => None,
    };
    let color = output::should_color(&global.color);
    let mut events = integration.events();

    let deadline = tokio::time::sleep(args.duration.map_or(Duration::MAX, Duration::from_secs));
    tokio::pin!(deadline);

    let mut seen = 0usize;
    loop {
        if args.count.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if !matches_device(&event, device_id.as_deref()) {
                        continue;
                    }
                    seen += 1;
                    let line = match global.output {
                        OutputFormat::Table | OutputFormat::Plain => {
                            format_line(integration, &event, color)
                        }
                        _ => output::render_json_compact(event.as_ref()),
                    };
                    output::print_output(&line, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watch fell behind the event stream");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn matches_device(event: &HostEvent, device_id: Option<&str>) -> bool {
    let Some(wanted) = device_id else {
        return true;
    };
    match event {
        HostEvent::StatusUpdated { device_id, .. } | HostEvent::DeviceRemoved { device_id } => {
            device_id == wanted
        }
        HostEvent::ButtonPressed(e) => e.device_id == wanted,
        HostEvent::SubscriptionChanged { .. } | HostEvent::ReloadRequested => false,
    }
}

fn format_line(integration: &Integration, event: &HostEvent, color: bool) -> String {
    let ts = Local::now().format("%H:%M:%S").to_string();
    let name = event.name();
    let (ts, name) = if color {
        (ts.dimmed().to_string(), name.bold().to_string())
    } else {
        (ts, name.to_owned())
    };
    let body = match event {
        HostEvent::StatusUpdated {
            device_id,
            component_id,
            capability,
            attribute,
        } => {
            let value = integration
                .store()
                .device(device_id)
                .and_then(|d| {
                    d.status
                        .get(component_id)?
                        .get(capability)?
                        .get(attribute)?
                        .value()
                        .map(ToString::to_string)
                })
                .unwrap_or_else(|| "-".into());
            format!("{device_id} {component_id}/{capability}.{attribute} = {value}")
        }
        HostEvent::ButtonPressed(e) => format!("{} ({}) {}", e.name, e.device_id, e.value),
        HostEvent::DeviceRemoved { device_id } => device_id.clone(),
        HostEvent::SubscriptionChanged { subscription_id } => {
            subscription_id.clone().unwrap_or_else(|| "none".into())
        }
        HostEvent::ReloadRequested => "event stream stopped, re-run to reconnect".into(),
    };
    format!("{ts} {name:<20} {body}")
}

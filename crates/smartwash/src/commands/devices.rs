//! Device command handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use smartwash_api::DeviceStatus;
use smartwash_core::{DeviceInfo, FullDevice, Integration};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// Structured view of one appliance for JSON/YAML output.
#[derive(Serialize)]
struct DeviceView {
    device_id: String,
    label: String,
    room: Option<String>,
    category: Option<String>,
    components: Vec<String>,
    programs: usize,
    info: Option<DeviceInfo>,
}

impl DeviceView {
    fn new(integration: &Integration, device: &Arc<FullDevice>) -> Self {
        Self {
            device_id: device.device_id().to_owned(),
            label: device.label().to_owned(),
            room: util::room_name(integration, device),
            category: device.device.main_category().map(str::to_owned),
            components: device.status.keys().cloned().collect(),
            programs: device.programs.len(),
            info: integration
                .registry()
                .device(device.device_id())
                .map(|info| info.as_ref().clone()),
        }
    }
}

/// `get` view: the summary plus the normalized status.
#[derive(Serialize)]
struct DeviceDetail {
    #[serde(flatten)]
    summary: DeviceView,
    status: DeviceStatus,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Components")]
    components: usize,
    #[tabled(rename = "Programs")]
    programs: usize,
}

impl From<&DeviceView> for DeviceRow {
    fn from(d: &DeviceView) -> Self {
        Self {
            id: d.device_id.clone(),
            label: d.label.clone(),
            room: d.room.clone().unwrap_or_default(),
            model: d
                .info
                .as_ref()
                .and_then(|i| i.model.clone())
                .unwrap_or_default(),
            components: d.components.len(),
            programs: d.programs,
        }
    }
}

fn detail(d: &DeviceDetail) -> String {
    let info = d.summary.info.as_ref();
    let mut lines = vec![
        format!("ID:           {}", d.summary.device_id),
        format!("Label:        {}", d.summary.label),
        format!("Room:         {}", or_dash(d.summary.room.as_deref())),
        format!("Category:     {}", or_dash(d.summary.category.as_deref())),
        format!("Manufacturer: {}", or_dash(info.and_then(|i| i.manufacturer.as_deref()))),
        format!("Model:        {}", or_dash(info.and_then(|i| i.model.as_deref()))),
        format!("Firmware:     {}", or_dash(info.and_then(|i| i.sw_version.as_deref()))),
        format!("Programs:     {}", d.summary.programs),
    ];
    lines.extend(status_lines(&d.status));
    lines.join("\n")
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn status_lines(status: &DeviceStatus) -> Vec<String> {
    let mut lines = Vec::new();
    for (component, capabilities) in status {
        lines.push(String::new());
        lines.push(format!("[{component}]"));
        let flat: BTreeMap<String, String> = capabilities
            .iter()
            .flat_map(|(capability, attributes)| {
                attributes.iter().map(move |(attribute, s)| {
                    let value = s.value().map_or_else(|| "-".into(), ToString::to_string);
                    let unit = s.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
                    (format!("{capability}.{attribute}"), format!("{value}{unit}"))
                })
            })
            .collect();
        let width = flat.keys().map(String::len).max().unwrap_or(0);
        for (key, value) in flat {
            lines.push(format!("  {key:<width$}  {value}"));
        }
    }
    lines
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    integration: &Integration,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let views: Vec<DeviceView> = integration
                .store()
                .devices_snapshot()
                .iter()
                .map(|d| DeviceView::new(integration, d))
                .collect();
            let out = output::render_list(
                &global.output,
                &views,
                |d| DeviceRow::from(d),
                |d| d.device_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        DevicesCommand::Get { device } => {
            let device = util::resolve_device(integration, &device)?;
            let view = DeviceDetail {
                summary: DeviceView::new(integration, &device),
                status: device.status.clone(),
            };
            let out = output::render_single(&global.output, &view, detail, |d| {
                d.summary.device_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

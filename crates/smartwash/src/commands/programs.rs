//! Program catalog command handler.

use tabled::Tabled;

use smartwash_core::{Integration, Program};

use crate::cli::{GlobalOpts, ProgramsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProgramRow {
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Type")]
    program_type: String,
    #[tabled(rename = "Bubble soak")]
    bubble_soak: String,
    #[tabled(rename = "Options")]
    options: String,
}

impl ProgramRow {
    fn new(p: &Program, with_values: bool) -> Self {
        let options = p
            .supported_options
            .values()
            .map(|o| {
                if !with_values {
                    return o.supported_option.to_string();
                }
                // The default is marked with `*`.
                let values: Vec<String> = o
                    .options
                    .iter()
                    .map(|v| {
                        if o.default.as_deref() == Some(v.as_str()) {
                            format!("{v}*")
                        } else {
                            v.clone()
                        }
                    })
                    .collect();
                format!("{}={}", o.supported_option, values.join("|"))
            })
            .collect::<Vec<_>>()
            .join(if with_values { "\n" } else { ", " });
        Self {
            program: p.program_id.clone(),
            program_type: p.program_type.clone(),
            bubble_soak: if p.bubble_soak { "yes" } else { "no" }.into(),
            options,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    integration: &Integration,
    args: &ProgramsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_device(integration, &args.device)?;
    let programs: Vec<&Program> = device.programs.values().collect();
    if programs.is_empty() && !global.quiet {
        eprintln!("{} has no program catalog", device.label());
    }
    let out = output::render_list(
        &global.output,
        &programs,
        |p| ProgramRow::new(p, args.options),
        |p| p.program_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

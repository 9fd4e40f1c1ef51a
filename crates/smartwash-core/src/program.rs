// ── Program extraction ──
//
// Builds a device's program catalog from the cycle capabilities on its
// `main` component. Missing or malformed vendor data yields an empty or
// partial catalog, never an error.

use indexmap::IndexSet;
use serde_json::Value;
use strum::IntoEnumIterator;

use smartwash_api::{Attribute, Capability, Command, DeviceStatus, MAIN};

use crate::model::{Program, ProgramOptions, Programs, SupportedOption};

const PROGRAM_COURSE: &str = "Course";

/// A capability that carries a program catalog, with its current-cycle
/// attribute and the command that starts a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCapability {
    pub capability: Capability,
    pub attribute: Attribute,
    pub command: Command,
}

/// Cycle capabilities in lookup priority order.
pub static CAPABILITIES_WITH_PROGRAMS: [ProgramCapability; 3] = [
    ProgramCapability {
        capability: Capability::SamsungCeWasherCycle,
        attribute: Attribute::WasherCycle,
        command: Command::SetWasherCycle,
    },
    ProgramCapability {
        capability: Capability::SamsungCeDryerCycle,
        attribute: Attribute::DryerCycle,
        command: Command::SetDryerCycle,
    },
    ProgramCapability {
        capability: Capability::SamsungCeSteamClosetCycle,
        attribute: Attribute::SteamClosetCycle,
        command: Command::SetSteamClosetCycle,
    },
];

/// Look up the program capability entry for a raw capability id.
pub fn program_capability(capability: &str) -> Option<&'static ProgramCapability> {
    CAPABILITIES_WITH_PROGRAMS
        .iter()
        .find(|p| p.capability.as_ref() == capability)
}

// ── Display keys ─────────────────────────────────────────────────────

/// Turn a vendor cycle/course code into a display key.
///
/// The code is upper-cased and its last `_`-separated segment kept:
/// `"Table_02_Course_1C"` becomes `"Course_1C"`, or `"1C"` when
/// `set_course` is false. `None` and `""` map to `""`.
pub fn translate_program_course(program_course: Option<&str>, set_course: bool) -> String {
    let Some(course) = program_course.filter(|c| !c.is_empty()) else {
        return String::new();
    };
    let upper = course.to_uppercase();
    let last = upper.rsplit('_').next().unwrap_or(&upper);
    if set_course {
        format!("{PROGRAM_COURSE}_{last}")
    } else {
        last.to_string()
    }
}

/// [`translate_program_course`] for a raw status value; non-strings map to `""`.
pub fn translate_value(value: Option<&Value>) -> String {
    translate_program_course(value.and_then(Value::as_str), true)
}

// ── Catalog lookups ──────────────────────────────────────────────────

/// Allowed values of `option` under `program_id`, if the program declares it.
pub fn get_program_options<'a>(
    programs: &'a Programs,
    program_id: &str,
    option: SupportedOption,
) -> Option<&'a IndexSet<String>> {
    programs
        .get(program_id)?
        .supported_options
        .get(&option)
        .map(|o| &o.options)
}

/// Lower-cased id of the vendor reference table, or `""`.
pub fn get_program_table_id(status: &DeviceStatus) -> String {
    status
        .get(MAIN)
        .and_then(|main| main.get(Capability::CustomSupportedOptions.as_ref()))
        .and_then(|cap| cap.get(Attribute::ReferenceTable.as_ref()))
        .and_then(|s| s.value())
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default()
}

// ── Extraction ───────────────────────────────────────────────────────

/// Build the program catalog for a normalized status tree.
pub fn process_programs(status: &DeviceStatus) -> Programs {
    let mut programs = Programs::new();
    let Some(main) = status.get(MAIN) else {
        return programs;
    };

    let cycle_capability = CAPABILITIES_WITH_PROGRAMS
        .iter()
        .find_map(|p| main.get(p.capability.as_ref()).filter(|c| !c.is_empty()));

    let Some(cycles) = cycle_capability else {
        let courses = main
            .get(Capability::CustomSupportedOptions.as_ref())
            .and_then(|c| c.get(Attribute::SupportedCourses.as_ref()))
            .and_then(|s| s.value())
            .and_then(Value::as_array);
        for course in courses.into_iter().flatten() {
            let program_id = translate_program_course(course.as_str(), true);
            if !program_id.is_empty() {
                programs.insert(program_id.clone(), Program::course(program_id));
            }
        }
        return programs;
    };

    let entries = cycles
        .get(Attribute::SupportedCycles.as_ref())
        .and_then(|s| s.value())
        .and_then(Value::as_array);
    for entry in entries.into_iter().flatten() {
        if let Some(program) = parse_cycle(entry) {
            programs.insert(program.program_id.clone(), program);
        }
    }
    programs
}

/// Parse one `supportedCycles` entry.
fn parse_cycle(entry: &Value) -> Option<Program> {
    let program_id = translate_program_course(entry.get("cycle").and_then(Value::as_str), true);
    if program_id.is_empty() {
        tracing::debug!(?entry, "skipping cycle without id");
        return None;
    }
    let program_type = entry
        .get("cycleType")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut program = Program {
        program_id,
        program_type,
        bubble_soak: false,
        supported_options: indexmap::IndexMap::new(),
    };

    let Some(supported) = entry.get("supportedOptions").and_then(Value::as_object) else {
        return Some(program);
    };

    for option in SupportedOption::iter() {
        let Some(item) = supported.get(option.as_ref()) else {
            continue;
        };
        let raw = item
            .get("raw")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let default = item.get("default").and_then(option_string);
        let mut options: IndexSet<String> = item
            .get("options")
            .and_then(Value::as_array)
            .map(|opts| opts.iter().filter_map(option_string).collect())
            .unwrap_or_default();
        if let Some(d) = &default {
            options.insert(d.clone());
        }
        if option == SupportedOption::BubbleSoak {
            program.bubble_soak = raw.chars().nth(2) == Some('F');
        }
        program.supported_options.insert(
            option,
            ProgramOptions {
                supported_option: option,
                raw,
                default,
                options,
            },
        );
    }
    Some(program)
}

/// Option values are usually strings; numbers and booleans are stringified.
fn option_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn status(tree: Value) -> DeviceStatus {
        serde_json::from_value(tree).unwrap()
    }

    fn washer() -> DeviceStatus {
        status(json!({
            "main": {
                "custom.supportedOptions": {
                    "referenceTable": {"value": {"id": "Table_02"}},
                    "supportedCourses": {"value": ["1C", "1D"]}
                },
                "samsungce.washerCycle": {
                    "washerCycle": {"value": "Table_02_Course_1C"},
                    "supportedCycles": {"value": [
                        {
                            "cycle": "1C",
                            "cycleType": "washingOnly",
                            "supportedOptions": {
                                "bubbleSoak": {"raw": "00F0", "default": "off", "options": ["off", "on"]},
                                "spinLevel": {"raw": "A20F", "default": "1200", "options": ["400", "800"]},
                                "waterTemperature": {"raw": "831E", "default": "40", "options": ["cold", "20", "40"]}
                            }
                        },
                        {
                            "cycle": "Table_02_Course_1D",
                            "cycleType": "washingOnly",
                            "supportedOptions": {
                                "bubbleSoak": {"raw": "0000", "default": "off", "options": ["off"]}
                            }
                        }
                    ]}
                }
            }
        }))
    }

    #[test]
    fn translate_examples() {
        assert_eq!(
            translate_program_course(Some("AP_SAMSUNG_PROGRAM_COTTON"), true),
            "Course_COTTON"
        );
        assert_eq!(translate_program_course(Some("table_02_course_1c"), false), "1C");
        assert_eq!(translate_program_course(Some("1c"), true), "Course_1C");
        assert_eq!(translate_program_course(None, true), "");
        assert_eq!(translate_program_course(Some(""), true), "");
    }

    #[test]
    fn cycles_become_programs() {
        let programs = process_programs(&washer());
        assert_eq!(
            programs.keys().collect::<Vec<_>>(),
            vec!["Course_1C", "Course_1D"]
        );

        let cotton = &programs["Course_1C"];
        assert_eq!(cotton.program_type, "washingOnly");
        assert!(cotton.bubble_soak);
        assert!(!programs["Course_1D"].bubble_soak);

        let spin = &cotton.supported_options[&SupportedOption::SpinLevel];
        assert_eq!(
            spin.options.iter().collect::<Vec<_>>(),
            vec!["400", "800", "1200"]
        );
    }

    #[test]
    fn every_default_is_an_option() {
        for program in process_programs(&washer()).values() {
            for opts in program.supported_options.values() {
                if let Some(d) = &opts.default {
                    assert!(opts.options.contains(d), "{d} missing from {:?}", opts.options);
                }
            }
        }
    }

    #[test]
    fn courses_are_the_fallback() {
        let programs = process_programs(&status(json!({
            "main": {
                "custom.supportedOptions": {"supportedCourses": {"value": ["02", "Table_00_Course_03"]}}
            }
        })));
        assert_eq!(programs.len(), 2);
        let p = &programs["Course_03"];
        assert_eq!(p.program_type, "Course");
        assert!(p.supported_options.is_empty());
        assert!(!p.bubble_soak);
    }

    #[test]
    fn dryer_is_used_when_no_washer() {
        let programs = process_programs(&status(json!({
            "main": {
                "samsungce.dryerCycle": {
                    "supportedCycles": {"value": [{"cycle": "Table_01_Course_9A", "cycleType": "dryingOnly"}]}
                }
            }
        })));
        assert!(programs.contains_key("Course_9A"));
    }

    #[test]
    fn missing_main_or_lists_yield_nothing() {
        assert!(process_programs(&status(json!({"sub": {}}))).is_empty());
        assert!(
            process_programs(&status(json!({
                "main": {"samsungce.washerCycle": {"washerCycle": {"value": "x"}}}
            })))
            .is_empty()
        );
    }

    #[test]
    fn short_bubble_soak_raw_is_false() {
        let programs = process_programs(&status(json!({
            "main": {"samsungce.washerCycle": {"supportedCycles": {"value": [
                {"cycle": "1A", "cycleType": "x", "supportedOptions": {"bubbleSoak": {"raw": "0F", "options": []}}}
            ]}}}
        })));
        assert!(!programs["Course_1A"].bubble_soak);
    }

    #[test]
    fn table_id_and_option_lookup() {
        let s = washer();
        assert_eq!(get_program_table_id(&s), "table_02");
        assert_eq!(get_program_table_id(&status(json!({"main": {}}))), "");

        let programs = process_programs(&s);
        let temps = get_program_options(&programs, "Course_1C", SupportedOption::WaterTemperature)
            .unwrap();
        assert!(temps.contains("cold"));
        assert!(
            get_program_options(&programs, "Course_1D", SupportedOption::SpinLevel).is_none()
        );
        assert!(
            get_program_options(&programs, "Course_XX", SupportedOption::SpinLevel).is_none()
        );
    }
}

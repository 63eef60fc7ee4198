// The cables file is derived rather than fetched column-by-column: each
// cable end is read off the interface or circuit termination it is plugged
// into, then paired by cable id.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use nbsync_api::{Object, object_id};

use super::table::render_field;
use crate::schema::{CIRCUIT_TERMINATION, INTERFACE_TERMINATION};

pub const FILE_NAME: &str = "9_cables.csv";

pub const HEADERS: &[&str] = &[
    "side_a_type",
    "side_a_device",
    "side_a_name",
    "side_a_circuit",
    "side_a_side",
    "side_b_type",
    "side_b_device",
    "side_b_name",
    "side_b_circuit",
    "side_b_side",
    "label",
    "type",
    "status",
    "color",
    "length",
    "length_unit",
    "description",
];

/// Cable attributes copied from the cable object itself.
const CABLE_FIELDS: &[&str] = &[
    "label",
    "type",
    "status",
    "color",
    "length",
    "length_unit",
    "description",
];

#[derive(Debug)]
enum End {
    Interface { device: String, name: String },
    Circuit { cid: String, side: String },
}

#[derive(Debug)]
struct Termination {
    cable_end: Option<String>,
    /// Label from the nested cable brief, used when the cable list lacks it.
    cable_label: String,
    end: End,
}

/// Rows for every cable with exactly two known ends, ordered by cable id.
pub fn derive_rows(
    interfaces: &[Object],
    circuit_terminations: &[Object],
    cables: &[Object],
) -> Vec<Vec<String>> {
    let mut by_cable: BTreeMap<i64, Vec<Termination>> = BTreeMap::new();

    for interface in interfaces {
        if let Some((cable_id, termination)) = termination(interface, |o| End::Interface {
            device: render_field(o, "device"),
            name: render_field(o, "name"),
        }) {
            by_cable.entry(cable_id).or_default().push(termination);
        }
    }
    for circuit_termination in circuit_terminations {
        if let Some((cable_id, termination)) = termination(circuit_termination, |o| End::Circuit {
            cid: render_field(o, "circuit"),
            side: render_field(o, "term_side"),
        }) {
            by_cable.entry(cable_id).or_default().push(termination);
        }
    }

    let details: HashMap<i64, &Object> = cables
        .iter()
        .filter_map(|cable| object_id(cable).map(|id| (id, cable)))
        .collect();

    by_cable
        .into_iter()
        .filter_map(|(cable_id, mut ends)| {
            if ends.len() != 2 {
                debug!(cable_id, ends = ends.len(), "skipping cable without two known ends");
                return None;
            }
            ends.sort_by_key(|t| (t.cable_end.is_none(), t.cable_end.clone()));
            Some(cable_row(&ends, details.get(&cable_id).copied()))
        })
        .collect()
}

fn termination(object: &Object, end: impl Fn(&Object) -> End) -> Option<(i64, Termination)> {
    let cable = object.get("cable")?;
    let cable_id = match cable {
        Value::Object(brief) => brief.get("id").and_then(Value::as_i64),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }?;
    let cable_label = cable
        .as_object()
        .map(|brief| render_field(brief, "label"))
        .unwrap_or_default();

    Some((
        cable_id,
        Termination {
            cable_end: object
                .get("cable_end")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase),
            cable_label,
            end: end(object),
        },
    ))
}

fn cable_row(ends: &[Termination], cable: Option<&Object>) -> Vec<String> {
    let mut cells: HashMap<String, String> = HashMap::new();

    for (side, termination) in ["a", "b"].into_iter().zip(ends) {
        match &termination.end {
            End::Interface { device, name } => {
                cells.insert(format!("side_{side}_type"), INTERFACE_TERMINATION.to_owned());
                cells.insert(format!("side_{side}_device"), device.clone());
                cells.insert(format!("side_{side}_name"), name.clone());
            }
            End::Circuit { cid, side: term_side } => {
                cells.insert(format!("side_{side}_type"), CIRCUIT_TERMINATION.to_owned());
                cells.insert(format!("side_{side}_circuit"), cid.clone());
                cells.insert(format!("side_{side}_side"), term_side.clone());
            }
        }
    }

    if let Some(cable) = cable {
        for field in CABLE_FIELDS {
            cells.insert((*field).to_owned(), render_field(cable, field));
        }
    }
    if cells.get("label").is_none_or(String::is_empty) {
        let label = ends
            .iter()
            .map(|t| t.cable_label.as_str())
            .find(|l| !l.is_empty())
            .unwrap_or_default();
        cells.insert("label".to_owned(), label.to_owned());
    }

    HEADERS
        .iter()
        .map(|header| cells.remove(*header).unwrap_or_default())
        .collect()
}

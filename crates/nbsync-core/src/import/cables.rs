// Cable rows describe each end by names (`side_a_device`, `side_a_name`)
// or by circuit (`side_a_circuit`, `side_a_side`). NetBox wants
// `a_terminations: [{object_type, object_id}]`.

use indexmap::IndexMap;
use serde_json::json;

use nbsync_api::Object;

use crate::error::{RowError, RowFailure};
use crate::remote::Remote;
use crate::resolve::Resolver;
use crate::schema::{CIRCUIT_TERMINATION, Collection, INTERFACE_TERMINATION};

const SIDES: [&str; 2] = ["a", "b"];

/// Legacy single-termination columns that NetBox no longer accepts.
const LEGACY_COLUMNS: &[&str] = &[
    "termination_a_type",
    "termination_a_id",
    "termination_b_type",
    "termination_b_id",
];

/// Resolve both cable ends into `payload`, consuming the side columns
/// from `fields` so only ordinary cable attributes remain.
pub(super) async fn resolve_terminations<R: Remote>(
    resolver: &mut Resolver<'_, R>,
    fields: &mut IndexMap<String, String>,
    payload: &mut Object,
) -> Result<(), RowFailure> {
    for side in SIDES {
        let (object_type, object_id) = resolve_side(resolver, fields, side).await?;
        payload.insert(
            format!("{side}_terminations"),
            json!([{ "object_type": object_type, "object_id": object_id }]),
        );
    }

    fields.retain(|key, _| {
        !key.starts_with("side_a_")
            && !key.starts_with("side_b_")
            && !LEGACY_COLUMNS.contains(&key.as_str())
    });
    Ok(())
}

async fn resolve_side<R: Remote>(
    resolver: &mut Resolver<'_, R>,
    fields: &mut IndexMap<String, String>,
    side: &str,
) -> Result<(&'static str, i64), RowFailure> {
    let kind = take_first(fields, &[format!("side_{side}_type"), format!("{side}_type")])
        .map_or_else(|| INTERFACE_TERMINATION.to_owned(), |k| k.to_lowercase());

    match kind.as_str() {
        INTERFACE_TERMINATION => {
            let device_field = format!("side_{side}_device");
            let name_field = format!("side_{side}_name");
            let device = take_first(fields, &[device_field.clone(), format!("{side}_device")])
                .ok_or_else(|| missing(&device_field))?;
            let name = take_first(
                fields,
                &[
                    name_field.clone(),
                    format!("{side}_name"),
                    format!("{side}_interface"),
                ],
            )
            .ok_or_else(|| missing(&name_field))?;

            let device_id = resolver
                .resolve_scoped(&device_field, Collection::Devices, &device, None)
                .await?;
            let interface_id = resolver
                .resolve_exact(
                    &name_field,
                    Collection::Interfaces,
                    &name,
                    vec![
                        ("device_id".to_owned(), device_id.to_string()),
                        ("name".to_owned(), name.clone()),
                    ],
                )
                .await?;
            Ok((INTERFACE_TERMINATION, interface_id))
        }
        CIRCUIT_TERMINATION => {
            let circuit_field = format!("side_{side}_circuit");
            let term_field = format!("side_{side}_side");
            let circuit = take_first(fields, &[circuit_field.clone(), format!("{side}_circuit")])
                .ok_or_else(|| missing(&circuit_field))?;
            let term_side = take_first(fields, &[term_field.clone(), format!("{side}_side")])
                .ok_or_else(|| missing(&term_field))?
                .to_uppercase();

            let circuit_id = resolver
                .resolve_scoped(&circuit_field, Collection::Circuits, &circuit, None)
                .await?;
            let termination_id = resolver
                .resolve_exact(
                    &term_field,
                    Collection::CircuitTerminations,
                    &format!("{circuit} side {term_side}"),
                    vec![
                        ("circuit_id".to_owned(), circuit_id.to_string()),
                        ("term_side".to_owned(), term_side),
                    ],
                )
                .await?;
            Ok((CIRCUIT_TERMINATION, termination_id))
        }
        other => Err(RowError::UnsupportedTermination {
            field: format!("side_{side}_type"),
            value: other.to_owned(),
        }
        .into()),
    }
}

/// Remove and return the first present column among `names`.
fn take_first(fields: &mut IndexMap<String, String>, names: &[String]) -> Option<String> {
    names.iter().find_map(|name| fields.shift_remove(name))
}

fn missing(field: &str) -> RowFailure {
    RowError::MissingField {
        field: field.to_owned(),
    }
    .into()
}

// Column tables for the snapshot files. File names carry the priority
// prefix the importer sorts by, so a snapshot re-imports in dependency
// order.

use serde_json::Value;

use nbsync_api::Object;

use crate::schema::Collection;

/// Keys tried, in order, when a nested object is rendered as one cell.
const REFERENCE_KEYS: &[&str] = &["value", "name", "model", "cid", "address", "display", "id"];

#[derive(Debug, Clone, Copy)]
pub enum Source {
    Field(&'static str),
    /// `outer.inner`, e.g. the manufacturer of a device's type.
    Nested(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub source: Source,
}

const fn plain(name: &'static str) -> Column {
    Column {
        header: name,
        source: Source::Field(name),
    }
}

const fn nested(header: &'static str, outer: &'static str, inner: &'static str) -> Column {
    Column {
        header,
        source: Source::Nested(outer, inner),
    }
}

#[derive(Debug)]
pub struct Table {
    pub file_name: &'static str,
    pub collection: Collection,
    pub columns: &'static [Column],
}

impl Table {
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    pub fn render_row(&self, object: &Object) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column.source {
                Source::Field(name) => render_field(object, name),
                Source::Nested(outer, inner) => object
                    .get(outer)
                    .and_then(Value::as_object)
                    .map(|o| render_field(o, inner))
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Render one field of an object as a cell; absent fields are empty.
pub fn render_field(object: &Object, name: &str) -> String {
    object.get(name).map(render).unwrap_or_default()
}

/// Render a JSON value as a single cell.
///
/// Nested objects collapse to their most human key; lists join with
/// commas.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(map) => REFERENCE_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map(render)
            .unwrap_or_default(),
    }
}

// ── Plan ─────────────────────────────────────────────────────────────

pub static PLAN: &[Table] = &[
    Table {
        file_name: "1_manufacturers.csv",
        collection: Collection::Manufacturers,
        columns: &[plain("name"), plain("slug"), plain("description")],
    },
    Table {
        file_name: "1_tags.csv",
        collection: Collection::Tags,
        columns: &[
            plain("name"),
            plain("slug"),
            plain("color"),
            plain("description"),
        ],
    },
    Table {
        file_name: "2_platforms.csv",
        collection: Collection::Platforms,
        columns: &[
            plain("name"),
            plain("slug"),
            plain("manufacturer"),
            plain("description"),
        ],
    },
    Table {
        file_name: "2_regions.csv",
        collection: Collection::Regions,
        columns: &[
            plain("name"),
            plain("slug"),
            plain("parent"),
            plain("description"),
        ],
    },
    Table {
        file_name: "3_device_roles.csv",
        collection: Collection::DeviceRoles,
        columns: &[
            plain("name"),
            plain("slug"),
            plain("color"),
            plain("description"),
        ],
    },
    Table {
        file_name: "3_device_types.csv",
        collection: Collection::DeviceTypes,
        columns: &[
            plain("model"),
            plain("slug"),
            plain("manufacturer"),
            plain("part_number"),
            plain("u_height"),
            plain("is_full_depth"),
            plain("airflow"),
            plain("weight"),
            plain("weight_unit"),
            plain("description"),
        ],
    },
    Table {
        file_name: "3_netbox_tenants.csv",
        collection: Collection::Tenants,
        columns: &[plain("name"), plain("slug"), plain("description")],
    },
    Table {
        file_name: "3_sites.csv",
        collection: Collection::Sites,
        columns: &[
            plain("name"),
            plain("slug"),
            plain("status"),
            plain("region"),
            plain("tenant"),
            plain("facility"),
            plain("time_zone"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "4_devices.csv",
        collection: Collection::Devices,
        columns: &[
            plain("name"),
            plain("site"),
            plain("role"),
            plain("device_type"),
            nested("manufacturer", "device_type", "manufacturer"),
            plain("platform"),
            plain("tenant"),
            plain("serial"),
            plain("asset_tag"),
            plain("status"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "5_interfaces.csv",
        collection: Collection::Interfaces,
        columns: &[
            plain("device"),
            plain("name"),
            plain("type"),
            plain("enabled"),
            plain("mtu"),
            plain("speed"),
            plain("duplex"),
            plain("mgmt_only"),
            plain("mark_connected"),
            plain("label"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "5_vrfs.csv",
        collection: Collection::Vrfs,
        columns: &[
            plain("name"),
            plain("rd"),
            plain("tenant"),
            plain("enforce_unique"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "6_ip_addresses.csv",
        collection: Collection::IpAddresses,
        columns: &[
            plain("address"),
            plain("vrf"),
            plain("tenant"),
            plain("status"),
            plain("role"),
            plain("dns_name"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "6_providers.csv",
        collection: Collection::Providers,
        columns: &[plain("name"), plain("slug"), plain("description")],
    },
    Table {
        file_name: "6_circuit_types.csv",
        collection: Collection::CircuitTypes,
        columns: &[plain("name"), plain("slug"), plain("description")],
    },
    Table {
        file_name: "7_circuits.csv",
        collection: Collection::Circuits,
        columns: &[
            plain("cid"),
            plain("provider"),
            plain("type"),
            plain("status"),
            plain("tenant"),
            plain("commit_rate"),
            plain("description"),
            plain("tags"),
        ],
    },
    Table {
        file_name: "8_circuit_terminations.csv",
        collection: Collection::CircuitTerminations,
        columns: &[
            plain("circuit"),
            plain("term_side"),
            plain("site"),
            plain("port_speed"),
            plain("upstream_speed"),
            plain("xconnect_id"),
            plain("pp_info"),
            plain("description"),
        ],
    },
];

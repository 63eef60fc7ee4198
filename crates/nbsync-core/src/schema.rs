// ── Collection schema table ──
//
// One static entry per NetBox collection: where it lives, how its objects
// are looked up by name, which row fields are references and to what, and
// which header aliases map onto canonical fields. The mapper, resolver,
// coercer, importer and exporter all read this table; none of them carry
// per-collection knowledge of their own.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use strum::{EnumIter, IntoEnumIterator};

use nbsync_api::Object;

// ── Collection ───────────────────────────────────────────────────────

/// A NetBox collection, named by its dotted `namespace.path` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Collection {
    Tags,
    Manufacturers,
    Platforms,
    Regions,
    DeviceRoles,
    DeviceTypes,
    Tenants,
    Sites,
    Locations,
    Racks,
    Devices,
    Interfaces,
    Vrfs,
    IpAddresses,
    Providers,
    CircuitTypes,
    Circuits,
    CircuitTerminations,
    Cables,
}

impl Collection {
    /// Dotted endpoint name, e.g. `dcim.devices`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Tags => "extras.tags",
            Self::Manufacturers => "dcim.manufacturers",
            Self::Platforms => "dcim.platforms",
            Self::Regions => "dcim.regions",
            Self::DeviceRoles => "dcim.device_roles",
            Self::DeviceTypes => "dcim.device_types",
            Self::Tenants => "tenancy.tenants",
            Self::Sites => "dcim.sites",
            Self::Locations => "dcim.locations",
            Self::Racks => "dcim.racks",
            Self::Devices => "dcim.devices",
            Self::Interfaces => "dcim.interfaces",
            Self::Vrfs => "ipam.vrfs",
            Self::IpAddresses => "ipam.ip_addresses",
            Self::Providers => "circuits.providers",
            Self::CircuitTypes => "circuits.circuit_types",
            Self::Circuits => "circuits.circuits",
            Self::CircuitTerminations => "circuits.circuit_terminations",
            Self::Cables => "dcim.cables",
        }
    }

    /// REST path relative to `/api/`, e.g. `dcim/device-roles/`.
    pub fn api_path(self) -> &'static str {
        match self {
            Self::Tags => "extras/tags/",
            Self::Manufacturers => "dcim/manufacturers/",
            Self::Platforms => "dcim/platforms/",
            Self::Regions => "dcim/regions/",
            Self::DeviceRoles => "dcim/device-roles/",
            Self::DeviceTypes => "dcim/device-types/",
            Self::Tenants => "tenancy/tenants/",
            Self::Sites => "dcim/sites/",
            Self::Locations => "dcim/locations/",
            Self::Racks => "dcim/racks/",
            Self::Devices => "dcim/devices/",
            Self::Interfaces => "dcim/interfaces/",
            Self::Vrfs => "ipam/vrfs/",
            Self::IpAddresses => "ipam/ip-addresses/",
            Self::Providers => "circuits/providers/",
            Self::CircuitTypes => "circuits/circuit-types/",
            Self::Circuits => "circuits/circuits/",
            Self::CircuitTerminations => "circuits/circuit-terminations/",
            Self::Cables => "dcim/cables/",
        }
    }

    /// Natural key used to find an object by its human name.
    pub fn lookup_key(self) -> &'static str {
        match self {
            Self::DeviceTypes => "model",
            Self::Circuits => "cid",
            Self::IpAddresses => "address",
            Self::Cables => "label",
            _ => "name",
        }
    }

    /// Whether objects carry a `slug` usable as a lookup fallback.
    pub fn has_slug(self) -> bool {
        matches!(
            self,
            Self::Tags
                | Self::Manufacturers
                | Self::Platforms
                | Self::Regions
                | Self::DeviceRoles
                | Self::DeviceTypes
                | Self::Tenants
                | Self::Sites
                | Self::Locations
                | Self::Providers
                | Self::CircuitTypes
        )
    }

    /// Look a collection up by its dotted endpoint name.
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        Self::iter().find(|c| c.endpoint() == endpoint)
    }

    pub fn schema(self) -> &'static CollectionSchema {
        match self {
            Self::Platforms => &PLATFORMS,
            Self::Regions => &REGIONS,
            Self::DeviceTypes => &DEVICE_TYPES,
            Self::Sites => &SITES,
            Self::Locations => &LOCATIONS,
            Self::Racks => &RACKS,
            Self::Devices => &DEVICES,
            Self::Interfaces => &INTERFACES,
            Self::Vrfs => &VRFS,
            Self::IpAddresses => &IP_ADDRESSES,
            Self::Circuits => &CIRCUITS,
            Self::CircuitTerminations => &CIRCUIT_TERMINATIONS,
            Self::Cables => &CABLES,
            Self::Tags
            | Self::Manufacturers
            | Self::DeviceRoles
            | Self::Tenants
            | Self::Providers
            | Self::CircuitTypes => &PLAIN,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.endpoint())
    }
}

// ── File stems ───────────────────────────────────────────────────────

/// Normalized file stems accepted by the importer.
const STEMS: &[(&str, Collection)] = &[
    ("tags", Collection::Tags),
    ("manufacturers", Collection::Manufacturers),
    ("platforms", Collection::Platforms),
    ("regions", Collection::Regions),
    ("device_roles", Collection::DeviceRoles),
    ("device_types", Collection::DeviceTypes),
    ("netbox_tenants", Collection::Tenants),
    ("tenants", Collection::Tenants),
    ("sites", Collection::Sites),
    ("devices", Collection::Devices),
    ("interfaces", Collection::Interfaces),
    ("vrfs", Collection::Vrfs),
    ("ip_addresses", Collection::IpAddresses),
    ("providers", Collection::Providers),
    ("circuit_types", Collection::CircuitTypes),
    ("circuits", Collection::Circuits),
    ("circuit_terminations", Collection::CircuitTerminations),
    ("cables", Collection::Cables),
];

pub fn collection_for_stem(stem: &str) -> Option<Collection> {
    STEMS
        .iter()
        .find(|(s, _)| *s == stem)
        .map(|(_, collection)| *collection)
}

// ── Cable terminations ───────────────────────────────────────────────

/// `object_type` of a cable end on a device interface.
pub const INTERFACE_TERMINATION: &str = "dcim.interface";
/// `object_type` of a cable end on a circuit termination.
pub const CIRCUIT_TERMINATION: &str = "circuits.circuittermination";

// ── Field kinds ──────────────────────────────────────────────────────

/// Scalar conversions applied by the coercer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    /// Text, upper-cased (`term_side`).
    Upper,
    Integer,
    Decimal,
    Boolean,
}

impl ScalarKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Text | Self::Upper => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
        }
    }
}

/// Narrows a reference lookup by another field of the same row.
///
/// The row's `field` is resolved against `target` first; its id is then
/// passed to the main lookup as `filter=<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub field: &'static str,
    pub target: Collection,
    pub filter: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// A single object in `target`, submitted as its numeric id.
    Reference {
        target: Collection,
        scope: Option<Scope>,
    },
    /// Comma-separated names in `target`, submitted as a list of ids.
    ReferenceList { target: Collection },
    /// Only used to scope another lookup; never submitted.
    ScopeOnly,
}

const fn reference(target: Collection) -> FieldKind {
    FieldKind::Reference {
        target,
        scope: None,
    }
}

const fn scoped(
    target: Collection,
    field: &'static str,
    by: Collection,
    filter: &'static str,
) -> FieldKind {
    FieldKind::Reference {
        target,
        scope: Some(Scope {
            field,
            target: by,
            filter,
        }),
    }
}

const TEXT: FieldKind = FieldKind::Scalar(ScalarKind::Text);
const UPPER: FieldKind = FieldKind::Scalar(ScalarKind::Upper);
const INTEGER: FieldKind = FieldKind::Scalar(ScalarKind::Integer);
const DECIMAL: FieldKind = FieldKind::Scalar(ScalarKind::Decimal);
const BOOLEAN: FieldKind = FieldKind::Scalar(ScalarKind::Boolean);

/// Fields that are integers in every collection.
const NUMERIC_FIELDS: &[&str] = &[
    "mtu",
    "speed",
    "vid",
    "tx_power",
    "commit_rate",
    "port_speed",
    "upstream_speed",
];
const NUMERIC_SUFFIXES: &[&str] = &["_id", "_count"];

// ── Upsert match rules ───────────────────────────────────────────────

/// When a match rule is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchGate {
    Always,
    /// Only with `--ip-upsert`.
    IpUpsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchField {
    /// Payload field holding the value.
    pub field: &'static str,
    /// Query filter used to look existing objects up.
    pub filter: &'static str,
    /// Rows without this field skip matching altogether. Optional fields
    /// that are absent match only objects where the field is unset.
    pub required: bool,
}

/// Identity rule for collections that update instead of duplicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRule {
    pub fields: &'static [MatchField],
    pub gate: MatchGate,
}

impl MatchRule {
    /// Query filters selecting existing objects with the payload's
    /// identity, or `None` when a required match field is missing.
    pub fn filters(&self, payload: &Object) -> Option<Vec<(String, String)>> {
        let mut filters = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            match payload.get(field.field).and_then(filter_value) {
                Some(value) => filters.push((field.filter.to_owned(), value)),
                None if field.required => return None,
                None => filters.push((field.filter.to_owned(), "null".to_owned())),
            }
        }
        Some(filters)
    }

    /// Body of the PATCH sent to a matched object: the payload minus the
    /// match fields, or the whole payload when nothing else is left.
    pub fn merge_body(&self, payload: &Object) -> Object {
        let body: Object = payload
            .iter()
            .filter(|(key, _)| !self.fields.iter().any(|f| f.field == key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if body.is_empty() {
            payload.clone()
        } else {
            body
        }
    }
}

fn filter_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Collection schema ────────────────────────────────────────────────

#[derive(Debug)]
pub struct CollectionSchema {
    /// Fields whose kind differs from the global default.
    pub fields: &'static [(&'static str, FieldKind)],
    /// `(alias, canonical)` header pairs.
    pub aliases: &'static [(&'static str, &'static str)],
    pub match_rule: Option<MatchRule>,
}

impl CollectionSchema {
    /// Declared kind of `field`, falling back to the global numeric rule
    /// and then to text.
    pub fn field_kind(&self, field: &str) -> FieldKind {
        if let Some((_, kind)) = self.fields.iter().find(|(name, _)| *name == field) {
            return *kind;
        }
        if field == "tags" {
            return FieldKind::ReferenceList {
                target: Collection::Tags,
            };
        }
        if NUMERIC_FIELDS.contains(&field) || NUMERIC_SUFFIXES.iter().any(|s| field.ends_with(s)) {
            return INTEGER;
        }
        TEXT
    }

    /// Rename alias headers to their canonical field.
    ///
    /// An alias is dropped when the canonical field is already present.
    pub fn apply_aliases(&self, mut row: IndexMap<String, String>) -> IndexMap<String, String> {
        for (alias, canonical) in self.aliases {
            let Some(index) = row.get_index_of(*alias) else {
                continue;
            };
            if row.contains_key(*canonical) {
                row.shift_remove_index(index);
            } else if let Some((_, value)) = row.shift_remove_index(index) {
                row.shift_insert(index, (*canonical).to_owned(), value);
            }
        }
        row
    }
}

static PLAIN: CollectionSchema = CollectionSchema {
    fields: &[],
    aliases: &[],
    match_rule: None,
};

static PLATFORMS: CollectionSchema = CollectionSchema {
    fields: &[("manufacturer", reference(Collection::Manufacturers))],
    aliases: &[],
    match_rule: None,
};

static REGIONS: CollectionSchema = CollectionSchema {
    fields: &[("parent", reference(Collection::Regions))],
    aliases: &[],
    match_rule: None,
};

static DEVICE_TYPES: CollectionSchema = CollectionSchema {
    fields: &[
        ("manufacturer", reference(Collection::Manufacturers)),
        ("u_height", DECIMAL),
        ("weight", DECIMAL),
        ("is_full_depth", BOOLEAN),
    ],
    aliases: &[],
    match_rule: None,
};

static SITES: CollectionSchema = CollectionSchema {
    fields: &[
        ("region", reference(Collection::Regions)),
        ("tenant", reference(Collection::Tenants)),
        ("latitude", DECIMAL),
        ("longitude", DECIMAL),
    ],
    aliases: &[],
    match_rule: None,
};

static LOCATIONS: CollectionSchema = CollectionSchema {
    fields: &[
        ("site", reference(Collection::Sites)),
        ("parent", reference(Collection::Locations)),
    ],
    aliases: &[],
    match_rule: None,
};

static RACKS: CollectionSchema = CollectionSchema {
    fields: &[
        ("site", reference(Collection::Sites)),
        ("location", reference(Collection::Locations)),
    ],
    aliases: &[],
    match_rule: None,
};

static DEVICES: CollectionSchema = CollectionSchema {
    fields: &[
        ("role", reference(Collection::DeviceRoles)),
        ("platform", reference(Collection::Platforms)),
        ("site", reference(Collection::Sites)),
        ("tenant", reference(Collection::Tenants)),
        (
            "location",
            scoped(Collection::Locations, "site", Collection::Sites, "site_id"),
        ),
        (
            "rack",
            scoped(Collection::Racks, "site", Collection::Sites, "site_id"),
        ),
        (
            "device_type",
            scoped(
                Collection::DeviceTypes,
                "manufacturer",
                Collection::Manufacturers,
                "manufacturer_id",
            ),
        ),
        ("manufacturer", FieldKind::ScopeOnly),
        ("position", DECIMAL),
    ],
    aliases: &[
        ("device_role", "role"),
        ("device_manufacturer", "manufacturer"),
    ],
    match_rule: Some(MatchRule {
        fields: &[
            MatchField {
                field: "name",
                filter: "name",
                required: true,
            },
            MatchField {
                field: "site",
                filter: "site_id",
                required: true,
            },
        ],
        gate: MatchGate::Always,
    }),
};

static INTERFACES: CollectionSchema = CollectionSchema {
    fields: &[
        ("device", reference(Collection::Devices)),
        (
            "parent",
            scoped(Collection::Interfaces, "device", Collection::Devices, "device_id"),
        ),
        (
            "lag",
            scoped(Collection::Interfaces, "device", Collection::Devices, "device_id"),
        ),
        ("vrf", reference(Collection::Vrfs)),
        ("enabled", BOOLEAN),
        ("mgmt_only", BOOLEAN),
        ("mark_connected", BOOLEAN),
    ],
    aliases: &[
        ("device_name", "device"),
        ("device__name", "device"),
        ("host", "device"),
    ],
    match_rule: None,
};

static VRFS: CollectionSchema = CollectionSchema {
    fields: &[
        ("tenant", reference(Collection::Tenants)),
        ("enforce_unique", BOOLEAN),
    ],
    aliases: &[],
    match_rule: None,
};

static IP_ADDRESSES: CollectionSchema = CollectionSchema {
    fields: &[
        (
            "vrf",
            scoped(Collection::Vrfs, "tenant", Collection::Tenants, "tenant_id"),
        ),
        ("tenant", reference(Collection::Tenants)),
    ],
    aliases: &[],
    match_rule: Some(MatchRule {
        fields: &[
            MatchField {
                field: "address",
                filter: "address",
                required: true,
            },
            MatchField {
                field: "vrf",
                filter: "vrf_id",
                required: false,
            },
        ],
        gate: MatchGate::IpUpsert,
    }),
};

static CIRCUITS: CollectionSchema = CollectionSchema {
    fields: &[
        ("provider", reference(Collection::Providers)),
        ("type", reference(Collection::CircuitTypes)),
        ("tenant", reference(Collection::Tenants)),
    ],
    aliases: &[
        ("name", "cid"),
        ("circuit_id", "cid"),
        ("circuitid", "cid"),
        ("circuit", "cid"),
        ("provider_name", "provider"),
        ("provider__name", "provider"),
        ("provider_slug", "provider"),
        ("provider__slug", "provider"),
        ("circuit_type", "type"),
        ("type_name", "type"),
        ("type__name", "type"),
        ("type_slug", "type"),
        ("type__slug", "type"),
    ],
    match_rule: None,
};

static CIRCUIT_TERMINATIONS: CollectionSchema = CollectionSchema {
    fields: &[
        ("circuit", reference(Collection::Circuits)),
        ("site", reference(Collection::Sites)),
        ("term_side", UPPER),
        ("xconnect_id", TEXT),
    ],
    aliases: &[("cid", "circuit"), ("circuit_id", "circuit")],
    match_rule: None,
};

static CABLES: CollectionSchema = CollectionSchema {
    fields: &[("length", DECIMAL)],
    aliases: &[],
    match_rule: None,
};

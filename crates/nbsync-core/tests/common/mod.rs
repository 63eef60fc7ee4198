#![allow(dead_code, clippy::unwrap_used)]
// In-memory stand-in for a NetBox instance.
//
// Stores objects per collection, filters them the way the REST API does
// (`<field>=<value>`, `<field>_id=<id>`, `<field>_id=null`), enforces the
// uniqueness constraints NetBox would, and renders references as nested
// briefs on read.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use futures_util::Stream;
use futures_util::stream;
use serde_json::{Value, json};

use nbsync_api::{Error as ApiError, Object, object_id};
use nbsync_core::Remote;
use nbsync_core::schema::{Collection, FieldKind};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Unauthorized,
    Unreachable,
}

impl Failure {
    fn error(self) -> ApiError {
        match self {
            Self::Unauthorized => ApiError::Authentication {
                message: "Invalid token".into(),
            },
            Self::Unreachable => ApiError::Tls("connection reset by peer".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(Collection, Object),
    Update(Collection, i64, Object),
}

#[derive(Default)]
struct State {
    objects: BTreeMap<Collection, Vec<Object>>,
    next_id: i64,
    calls: Vec<Call>,
    list_calls: usize,
    fail_verify: Option<Failure>,
    fail_mutations: Option<Failure>,
    missing: Vec<Collection>,
}

#[derive(Default)]
pub struct FakeNetbox {
    state: Mutex<State>,
}

impl FakeNetbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Store an object as-is and return its new id.
    pub fn seed(&self, collection: Collection, value: Value) -> i64 {
        let mut object = value.as_object().unwrap().clone();
        self.state().insert(collection, &mut object)
    }

    pub fn objects(&self, collection: Collection) -> Vec<Object> {
        self.state()
            .objects
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.state().objects.get(&collection).map_or(0, Vec::len)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub fn fail_verify(&self, failure: Failure) {
        self.state().fail_verify = Some(failure);
    }

    pub fn fail_mutations(&self, failure: Failure) {
        self.state().fail_mutations = Some(failure);
    }

    /// Make a collection's endpoint answer 404.
    pub fn remove_endpoint(&self, collection: Collection) {
        self.state().missing.push(collection);
    }
}

impl State {
    fn insert(&mut self, collection: Collection, object: &mut Object) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        object.insert("id".into(), json!(id));
        self.objects
            .entry(collection)
            .or_default()
            .push(object.clone());
        id
    }

    fn not_found(collection: Collection) -> ApiError {
        ApiError::NotFound {
            path: format!("/api/{}", collection.api_path()),
        }
    }

    fn conflict(&self, collection: Collection, fields: &Object) -> Option<String> {
        let existing = self.objects.get(&collection)?;
        for set in unique_sets(collection) {
            let wanted: Vec<Option<String>> = set.iter().map(|f| key_of(fields, f)).collect();
            if wanted.iter().all(Option::is_none) {
                continue;
            }
            let clash = existing.iter().any(|obj| {
                set.iter()
                    .zip(&wanted)
                    .all(|(f, want)| key_of(obj, f) == *want)
            });
            if clash {
                return Some(if collection == Collection::IpAddresses {
                    format!(
                        "address: Duplicate IP address found in VRF: {}",
                        wanted[0].clone().unwrap_or_default()
                    )
                } else {
                    format!(
                        "__all__: {collection} with this {} already exists.",
                        set.join(" and ")
                    )
                });
            }
        }
        None
    }

    /// Render an object the way the API returns it: references become
    /// nested briefs.
    fn expand(&self, collection: Collection, object: &Object) -> Object {
        let schema = collection.schema();
        object
            .iter()
            .map(|(key, value)| {
                let rendered = match (schema.field_kind(key), value) {
                    (FieldKind::Reference { target, .. }, Value::Number(n)) => {
                        self.brief(target, n.as_i64().unwrap())
                    }
                    (FieldKind::ReferenceList { target }, Value::Array(items)) => Value::Array(
                        items
                            .iter()
                            .map(|item| match item.as_i64() {
                                Some(id) => self.brief(target, id),
                                None => item.clone(),
                            })
                            .collect(),
                    ),
                    _ => value.clone(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }

    fn brief(&self, collection: Collection, id: i64) -> Value {
        let Some(object) = self
            .objects
            .get(&collection)
            .and_then(|objs| objs.iter().find(|o| object_id(o) == Some(id)))
        else {
            return json!({ "id": id });
        };

        let key = collection.lookup_key();
        let mut brief = Object::new();
        brief.insert("id".into(), json!(id));
        for field in [key, "name", "slug"] {
            if let Some(value) = object.get(field) {
                brief.insert(field.into(), value.clone());
            }
        }
        if let Some(display) = object.get(key) {
            brief.insert("display".into(), display.clone());
        }
        if collection == Collection::DeviceTypes {
            if let Some(Value::Number(m)) = object.get("manufacturer") {
                brief.insert(
                    "manufacturer".into(),
                    self.brief(Collection::Manufacturers, m.as_i64().unwrap()),
                );
            }
        }
        Value::Object(brief)
    }
}

fn unique_sets(collection: Collection) -> &'static [&'static [&'static str]] {
    match collection {
        Collection::Devices => &[&["name", "site"]],
        Collection::Interfaces => &[&["device", "name"]],
        Collection::IpAddresses => &[&["address", "vrf"]],
        Collection::Vrfs => &[&["rd"]],
        Collection::DeviceTypes => &[&["manufacturer", "model"], &["manufacturer", "slug"]],
        Collection::Circuits => &[&["provider", "cid"]],
        Collection::CircuitTerminations => &[&["circuit", "term_side"]],
        Collection::Cables => &[],
        _ => &[&["name"], &["slug"]],
    }
}

/// Comparable form of a field: ids for references, text otherwise.
fn key_of(object: &Object, field: &str) -> Option<String> {
    match object.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(nested) => nested.get("id").map(ToString::to_string),
        _ => None,
    }
}

fn matches_filter(object: &Object, key: &str, want: &str) -> bool {
    let (field, by_id) = match key.strip_suffix("_id") {
        Some(field) => (field, true),
        None => (key, false),
    };
    let value = object.get(field);
    if want == "null" {
        return value.is_none_or(Value::is_null);
    }
    match value {
        Some(Value::String(s)) => !by_id && s == want,
        Some(Value::Number(n)) => n.to_string() == want,
        Some(Value::Object(nested)) => nested.get("id").map(ToString::to_string).as_deref() == Some(want),
        _ => false,
    }
}

impl Remote for FakeNetbox {
    async fn verify(&self) -> Result<(), ApiError> {
        match self.state().fail_verify {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }

    async fn list_by_filter(
        &self,
        collection: Collection,
        filters: &[(String, String)],
    ) -> Result<Vec<Object>, ApiError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.missing.contains(&collection) {
            return Err(State::not_found(collection));
        }
        Ok(state
            .objects
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|obj| filters.iter().all(|(k, v)| matches_filter(obj, k, v)))
            .cloned()
            .collect())
    }

    async fn create(&self, collection: Collection, fields: &Object) -> Result<Object, ApiError> {
        let mut state = self.state();
        if let Some(failure) = state.fail_mutations {
            return Err(failure.error());
        }
        state.calls.push(Call::Create(collection, fields.clone()));
        if let Some(message) = state.conflict(collection, fields) {
            return Err(ApiError::Api {
                status: 400,
                message,
            });
        }
        let mut object = fields.clone();
        state.insert(collection, &mut object);
        Ok(object)
    }

    async fn update(
        &self,
        collection: Collection,
        id: i64,
        fields: &Object,
    ) -> Result<Object, ApiError> {
        let mut state = self.state();
        if let Some(failure) = state.fail_mutations {
            return Err(failure.error());
        }
        state
            .calls
            .push(Call::Update(collection, id, fields.clone()));
        let object = state
            .objects
            .get_mut(&collection)
            .and_then(|objs| objs.iter_mut().find(|o| object_id(o) == Some(id)))
            .ok_or_else(|| State::not_found(collection))?;
        for (key, value) in fields {
            object.insert(key.clone(), value.clone());
        }
        Ok(object.clone())
    }

    fn iterate_all(
        &self,
        collection: Collection,
    ) -> impl Stream<Item = Result<Object, ApiError>> + Send + '_ {
        let state = self.state();
        let items: Vec<Result<Object, ApiError>> = if state.missing.contains(&collection) {
            vec![Err(State::not_found(collection))]
        } else {
            state
                .objects
                .get(&collection)
                .into_iter()
                .flatten()
                .map(|obj| Ok(state.expand(collection, obj)))
                .collect()
        };
        stream::iter(items)
    }
}

// ── Fixture helpers ─────────────────────────────────────────────────

pub fn write(dir: &Path, name: &str, contents: &str) {
    if let Some(parent) = dir.join(name).parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(dir.join(name), contents).unwrap();
}

/// Nested brief as NetBox returns it for a reference.
pub fn brief(id: i64, name: &str) -> Value {
    json!({ "id": id, "name": name, "display": name })
}

pub fn choice(value: &str) -> Value {
    json!({ "value": value, "label": value })
}

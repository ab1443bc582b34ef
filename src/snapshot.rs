//! Snapshot bridge - database to and from JSON text
//!
//! A snapshot is one JSON document holding a whole database:
//!
//! ```text
//! {
//!   "name": "default",
//!   "viewing": "game.BlockCollection",
//!   "searchQuery": "",
//!   "sort": "az",
//!   "collections": {
//!     "game.BlockCollection": [
//!       { "kind": "game.BlockTemplate", "id": 0, "name": "Air", ... }
//!     ]
//!   }
//! }
//! ```
//!
//! Category and kind identity travel as name strings and resolve back
//! through the registry on load. A record whose kind no longer resolves is
//! skipped and reported, not fatal - content evolves between saves. Only an
//! unreadable document or a record without a readable id aborts the load.
//!
//! Record payloads decode kind-directed: the registry's constructor for the
//! stored kind decides whether the record carries a field table or a prefab
//! asset, and schema defaults fill anything the document does not mention.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::database::{Database, DatabaseError};
use crate::record::{FieldValue, PrefabAsset, Template, TemplateBody};
use crate::registry::{CategoryId, KindId, KindRegistry};
use crate::settings;

/// Record keys that are identity, not payload
const RESERVED_KEYS: [&str; 5] = ["kind", "id", "name", "show", "expanded"];

/// Error type for snapshot encoding and decoding
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Malformed(String),
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Parse(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {}", e),
            SnapshotError::Parse(e) => write!(f, "Parse error: {}", e),
            SnapshotError::Malformed(e) => write!(f, "Malformed snapshot: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Why a single record failed to decode
#[derive(Debug)]
enum RecordError {
    /// The stored id is missing or not an integer >= 0; aborts the load
    UnreadableId,
    /// No kind tag on the record
    MissingKind,
    /// The stored kind name does not resolve in the registry
    UnknownKind(KindId),
    /// The stored kind resolves to an abstract kind
    AbstractKind(KindId),
    /// A payload field would not decode
    BadField { name: String, detail: String },
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::UnreadableId => write!(f, "record id is missing or unreadable"),
            RecordError::MissingKind => write!(f, "record has no kind tag"),
            RecordError::UnknownKind(kind) => write!(f, "unknown kind {}", kind),
            RecordError::AbstractKind(kind) => write!(f, "kind {} is abstract", kind),
            RecordError::BadField { name, detail } => {
                write!(f, "field {} would not decode: {}", name, detail)
            }
        }
    }
}

/// One record skipped during load
#[derive(Debug)]
pub struct SkippedRecord {
    pub category: CategoryId,
    /// The stored id, when it was readable
    pub id: Option<i64>,
    /// The stored kind name, when present
    pub kind: Option<String>,
    pub reason: String,
}

/// One collection skipped during load
#[derive(Debug)]
pub struct SkippedCollection {
    /// The stored category name
    pub category: String,
    pub reason: String,
}

/// What the load had to leave behind
#[derive(Debug, Default)]
pub struct LoadReport {
    pub skipped_records: Vec<SkippedRecord>,
    pub skipped_collections: Vec<SkippedCollection>,
}

impl LoadReport {
    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped_records.is_empty() && self.skipped_collections.is_empty()
    }
}

/// A decoded database plus the report of what did not make it
#[derive(Debug)]
pub struct LoadOutcome {
    pub database: Database,
    pub report: LoadReport,
}

/// Serialize a whole database to JSON text
pub fn serialize_database(database: &Database) -> Result<String, SnapshotError> {
    let mut root = Map::new();
    root.insert("name".to_string(), Value::String(database.name.clone()));
    root.insert(
        "viewing".to_string(),
        match &database.viewing {
            Some(category) => Value::String(category.as_str().to_string()),
            None => Value::Null,
        },
    );
    root.insert(
        "searchQuery".to_string(),
        Value::String(database.search_query.clone()),
    );
    root.insert("sort".to_string(), serde_json::to_value(database.sort)?);

    let mut collections = Map::new();
    for collection in database.collections() {
        let mut records = Vec::with_capacity(collection.len());
        for template in collection.iter() {
            records.push(encode_record(template)?);
        }
        collections.insert(
            collection.category().as_str().to_string(),
            Value::Array(records),
        );
    }
    root.insert("collections".to_string(), Value::Object(collections));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

/// Deserialize a database from JSON text
///
/// Replaces nothing in place: the caller gets a freshly built database and
/// swaps it in wholesale. Unresolvable records and collections land in the
/// returned report.
pub fn deserialize_database(
    registry: &KindRegistry,
    text: &str,
) -> Result<LoadOutcome, SnapshotError> {
    let root: Value = serde_json::from_str(text)?;
    let obj = root
        .as_object()
        .ok_or_else(|| SnapshotError::Malformed("snapshot root is not an object".to_string()))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(settings::DEFAULT_NAME);
    let mut database = Database::new(name);
    database.search_query = obj
        .get("searchQuery")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if let Some(sort) = obj.get("sort") {
        if let Ok(sort) = serde_json::from_value(sort.clone()) {
            database.sort = sort;
        }
    }

    let mut report = LoadReport::default();

    if let Some(collections) = obj.get("collections") {
        let collections = collections.as_object().ok_or_else(|| {
            SnapshotError::Malformed("collections is not an object".to_string())
        })?;

        for (category_name, records_value) in collections {
            let category = CategoryId::new(category_name.clone());
            let descriptor = match registry.category(&category) {
                Some(d) => d,
                None => {
                    log::warn!("skipping collection {}: category not registered", category);
                    report.skipped_collections.push(SkippedCollection {
                        category: category_name.clone(),
                        reason: "category not registered".to_string(),
                    });
                    continue;
                }
            };
            let records = match records_value.as_array() {
                Some(a) => a,
                None => {
                    report.skipped_collections.push(SkippedCollection {
                        category: category_name.clone(),
                        reason: "records are not an array".to_string(),
                    });
                    continue;
                }
            };

            let mut collection = match Collection::new(registry, category.clone()) {
                Ok(c) => c,
                Err(e) => {
                    report.skipped_collections.push(SkippedCollection {
                        category: category_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for record_value in records {
                match decode_record(registry, record_value) {
                    Ok(template) => {
                        if !registry.kind_is(&template.kind, &descriptor.base_kind) {
                            report.skipped_records.push(SkippedRecord {
                                category: category.clone(),
                                id: Some(template.id),
                                kind: Some(template.kind.as_str().to_string()),
                                reason: format!(
                                    "kind {} is not assignable to category {}",
                                    template.kind, category
                                ),
                            });
                            continue;
                        }
                        let id = template.id;
                        let kind = template.kind.clone();
                        if !collection.insert_loaded(template) {
                            report.skipped_records.push(SkippedRecord {
                                category: category.clone(),
                                id: Some(id),
                                kind: Some(kind.as_str().to_string()),
                                reason: "duplicate record id".to_string(),
                            });
                        }
                    }
                    Err(RecordError::UnreadableId) => {
                        return Err(SnapshotError::Malformed(format!(
                            "record without readable id in collection {}",
                            category_name
                        )));
                    }
                    Err(e) => {
                        log::warn!("skipping record in {}: {}", category, e);
                        report.skipped_records.push(SkippedRecord {
                            category: category.clone(),
                            id: record_value.get("id").and_then(Value::as_i64),
                            kind: record_value
                                .get("kind")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            database.insert_loaded(collection);
        }
    }

    // Restore the viewing selection only if that collection survived.
    database.viewing = obj
        .get("viewing")
        .and_then(Value::as_str)
        .map(CategoryId::new)
        .filter(|c| database.get(c).is_ok());

    Ok(LoadOutcome { database, report })
}

/// Load a database snapshot from a file
pub fn load_database(
    registry: &KindRegistry,
    path: impl AsRef<Path>,
) -> Result<LoadOutcome, SnapshotError> {
    let text = fs::read_to_string(path)?;
    deserialize_database(registry, &text)
}

/// Save a database snapshot to a file
///
/// Runs every collection's before-save hook, publishes the document
/// atomically (write to a sibling temp file, then rename over the target,
/// so a failed save leaves the previous snapshot untouched), then runs the
/// after-save hooks. After-save does not run when the save failed.
pub fn save_database(
    database: &mut Database,
    registry: &KindRegistry,
    path: impl AsRef<Path>,
) -> Result<(), SnapshotError> {
    let path = path.as_ref();

    for collection in database.collections_mut() {
        collection.before_save(registry);
    }

    let text = serialize_database(database)?;
    publish(path, &text)?;

    for collection in database.collections_mut() {
        collection.after_save(registry);
    }
    Ok(())
}

/// Write `contents` to `path` through a sibling temp file and a rename
fn publish(path: &Path, contents: &str) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot.json");
    let tmp = path.with_file_name(format!("{}.tmp", file_name));

    fs::write(&tmp, contents)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Deep-copy a record by round-tripping it through the bridge
///
/// This is how `Collection::clone_record` copies: a clone is structurally
/// identical to a record that went through a save/load cycle.
pub(crate) fn clone_template(
    registry: &KindRegistry,
    template: &Template,
) -> Result<Template, DatabaseError> {
    let value =
        encode_record(template).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
    decode_record(registry, &value).map_err(|e| match e {
        RecordError::UnknownKind(kind) => DatabaseError::UnknownKind(kind),
        other => DatabaseError::Serialization(other.to_string()),
    })
}

/// Encode one record as a JSON object
fn encode_record(template: &Template) -> Result<Value, SnapshotError> {
    let mut map = Map::new();
    map.insert(
        "kind".to_string(),
        Value::String(template.kind.as_str().to_string()),
    );
    map.insert("id".to_string(), Value::from(template.id));
    map.insert("name".to_string(), Value::String(template.name.clone()));
    map.insert("show".to_string(), Value::Bool(template.show));
    map.insert("expanded".to_string(), Value::Bool(template.expanded));

    match &template.body {
        TemplateBody::Prefab { prefab } => {
            map.insert("prefab".to_string(), serde_json::to_value(prefab)?);
        }
        TemplateBody::Fields(table) => {
            for (name, value) in table.iter() {
                if RESERVED_KEYS.contains(&name) {
                    log::warn!(
                        "field {} of {} collides with a reserved key, not serialized",
                        name,
                        template.kind
                    );
                    continue;
                }
                map.insert(name.to_string(), serde_json::to_value(value)?);
            }
        }
    }

    Ok(Value::Object(map))
}

/// Decode one record from a JSON object, dispatching the payload on the
/// registered kind
fn decode_record(registry: &KindRegistry, value: &Value) -> Result<Template, RecordError> {
    let obj = value.as_object().ok_or(RecordError::UnreadableId)?;

    let id = obj
        .get("id")
        .and_then(Value::as_i64)
        .filter(|&id| id >= 0)
        .ok_or(RecordError::UnreadableId)?;

    let kind = KindId::new(
        obj.get("kind")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingKind)?,
    );
    let descriptor = registry
        .kind(&kind)
        .ok_or_else(|| RecordError::UnknownKind(kind.clone()))?;
    if descriptor.is_abstract {
        return Err(RecordError::AbstractKind(kind));
    }

    let body = match (descriptor.ctor)() {
        TemplateBody::Prefab { .. } => {
            let prefab = match obj.get("prefab") {
                Some(raw) => serde_json::from_value::<PrefabAsset>(raw.clone()).map_err(|e| {
                    RecordError::BadField {
                        name: "prefab".to_string(),
                        detail: e.to_string(),
                    }
                })?,
                None => PrefabAsset::default(),
            };
            TemplateBody::Prefab { prefab }
        }
        TemplateBody::Fields(mut defaults) => {
            for (name, raw) in obj {
                if RESERVED_KEYS.contains(&name.as_str()) {
                    continue;
                }
                let schema = match defaults.get(name) {
                    Some(v) => v.clone(),
                    None => {
                        // Stored field the current schema no longer declares.
                        log::debug!("field {} not in {} schema, ignored", name, kind);
                        continue;
                    }
                };
                let decoded = serde_json::from_value::<FieldValue>(raw.clone()).map_err(|e| {
                    RecordError::BadField {
                        name: name.clone(),
                        detail: e.to_string(),
                    }
                })?;
                defaults.set(name.clone(), decoded.coerced_like(&schema));
            }
            TemplateBody::Fields(defaults)
        }
    };

    let mut template = Template::new(descriptor.id.clone(), body);
    template.id = id;
    template.name = obj
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    template.show = obj.get("show").and_then(Value::as_bool).unwrap_or(true);
    template.expanded = obj
        .get("expanded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(template)
}

//! TOME: an in-editor, file-backed object database for game content
//!
//! Typed records ("templates") grouped into collections, with typed
//! cross-references between records and JSON snapshot persistence:
//! - Kinds and categories declared in an explicit registry, no type scanning
//! - Monotonic id assignment that survives deletions and clones
//! - References as soft links: a missing target is a lookup result, not a crash
//! - Whole-snapshot load/save with per-record tolerance for renamed content
//!
//! The editor GUI, asset pipelines and auto-save timers are collaborators
//! living elsewhere; they drive the store exclusively through the types in
//! this crate.
//!
//! ```
//! use tome::{Database, KindRegistry, RecordRef};
//! use tome::registry::{CategoryId, KindId, PREFAB_CATEGORY, PREFAB_KIND};
//!
//! let registry = KindRegistry::default();
//! let mut db = Database::new("demo");
//!
//! let prefabs = db
//!     .add_collection(&registry, &CategoryId::new(PREFAB_CATEGORY))
//!     .unwrap();
//! let record = prefabs
//!     .add_kind(&registry, &KindId::new(PREFAB_KIND))
//!     .unwrap();
//! assert_eq!(record.name, "PrefabTemplate 0");
//!
//! let reference = RecordRef::new(CategoryId::new(PREFAB_CATEGORY)).pointing_at(0);
//! assert!(db.resolve(&reference).unwrap().is_some());
//! ```

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod collection;
pub mod database;
pub mod record;
pub mod registry;
pub mod settings;
pub mod snapshot;

pub use collection::Collection;
pub use database::{Database, DatabaseError, SortOption};
pub use record::{
    CategoryTag, FieldTable, FieldValue, PrefabAsset, Prefabs, RecordRef, Template, TemplateBody,
    TypedRef, UNSET_ID,
};
pub use registry::{CategoryDescriptor, CategoryId, KindDescriptor, KindId, KindRegistry};
pub use settings::DatabaseSettings;
pub use snapshot::{
    deserialize_database, load_database, save_database, serialize_database, LoadOutcome,
    LoadReport, SnapshotError,
};

//! The database - aggregate root over all collections
//!
//! Owns at most one collection per category, resolves cross-collection
//! references, and carries the editor's viewing metadata (selected
//! collection, search text, sort mode). There is no implicit shared
//! instance: whoever loads a database holds it and passes it on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::record::{RecordRef, Template};
use crate::registry::{CategoryId, KindId, KindRegistry};
use crate::settings;

/// Errors from collection and database operations
///
/// Structural errors (wrong kind, missing category) indicate collaborator
/// bugs and are always surfaced. A reference whose target record is gone
/// is not on this list: resolution reports that as an ordinary `None`.
#[derive(Debug)]
pub enum DatabaseError {
    /// The kind is not the collection category's base kind or derived from it
    KindMismatch { kind: KindId, category: CategoryId },
    /// The database (or registry) already has this category
    DuplicateCategory(CategoryId),
    /// The database has no collection for this category
    CategoryNotFound(CategoryId),
    /// The category is not registered
    UnknownCategory(CategoryId),
    /// The kind is not registered
    UnknownKind(KindId),
    /// The registry already has this kind
    DuplicateKind(KindId),
    /// Abstract kinds anchor hierarchies and cannot be instantiated
    AbstractKind(KindId),
    /// No record with this id; raised only where a record is required
    /// (clone source), never for reference resolution
    RecordNotFound { category: CategoryId, id: i64 },
    /// A record failed to round-trip through the bridge
    Serialization(String),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::KindMismatch { kind, category } => {
                write!(f, "kind {} is not assignable to category {}", kind, category)
            }
            DatabaseError::DuplicateCategory(category) => {
                write!(f, "category {} is already present", category)
            }
            DatabaseError::CategoryNotFound(category) => {
                write!(f, "no collection for category {}", category)
            }
            DatabaseError::UnknownCategory(category) => {
                write!(f, "category {} is not registered", category)
            }
            DatabaseError::UnknownKind(kind) => write!(f, "kind {} is not registered", kind),
            DatabaseError::DuplicateKind(kind) => {
                write!(f, "kind {} is already registered", kind)
            }
            DatabaseError::AbstractKind(kind) => {
                write!(f, "kind {} is abstract and cannot be instantiated", kind)
            }
            DatabaseError::RecordNotFound { category, id } => {
                write!(f, "no record id {} in category {}", id, category)
            }
            DatabaseError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

/// How the editor sorts records for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Name ascending
    AZ,
    /// Name descending
    ZA,
    /// Grouped by kind
    Kinds,
}

impl Default for SortOption {
    fn default() -> Self {
        SortOption::AZ
    }
}

/// One content database: a named set of collections keyed by category
#[derive(Debug, Clone)]
pub struct Database {
    /// The database name, doubling as its snapshot file stem
    pub name: String,
    /// Collections keyed by category; at most one per category
    collections: HashMap<CategoryId, Collection>,
    /// Category insertion order
    order: Vec<CategoryId>,
    /// The collection the editor is currently viewing
    pub viewing: Option<CategoryId>,
    /// Editor record filter text
    pub search_query: String,
    /// Editor record sort mode
    pub sort: SortOption,
}

impl Database {
    /// Create an empty database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: HashMap::new(),
            order: Vec::new(),
            viewing: None,
            search_query: String::new(),
            sort: SortOption::default(),
        }
    }

    /// Add a collection for `category`
    ///
    /// Fails with `DuplicateCategory` if one exists. If the category
    /// descriptor declares seed records they are added through the normal
    /// add path, ids starting at 0.
    pub fn add_collection(
        &mut self,
        registry: &KindRegistry,
        category: &CategoryId,
    ) -> Result<&mut Collection, DatabaseError> {
        if self.collections.contains_key(category) {
            return Err(DatabaseError::DuplicateCategory(category.clone()));
        }

        let mut collection = Collection::new(registry, category.clone())?;
        if let Some(seeds) = registry.category(category).and_then(|d| d.seeds) {
            for seed in seeds() {
                collection.add(registry, seed)?;
            }
        }

        self.order.push(category.clone());
        Ok(self
            .collections
            .entry(category.clone())
            .or_insert(collection))
    }

    /// Remove the collection for `category`, if present
    ///
    /// References pointing into the removed collection are left alone;
    /// they resolve to `CategoryNotFound` from now on.
    pub fn remove_collection(&mut self, category: &CategoryId) -> Option<Collection> {
        let removed = self.collections.remove(category);
        if removed.is_some() {
            self.order.retain(|c| c != category);
            if self.viewing.as_ref() == Some(category) {
                self.viewing = None;
            }
        }
        removed
    }

    /// Get the collection for `category`
    pub fn get(&self, category: &CategoryId) -> Result<&Collection, DatabaseError> {
        self.collections
            .get(category)
            .ok_or_else(|| DatabaseError::CategoryNotFound(category.clone()))
    }

    /// Get the collection for `category`, mutably
    pub fn get_mut(&mut self, category: &CategoryId) -> Result<&mut Collection, DatabaseError> {
        self.collections
            .get_mut(category)
            .ok_or_else(|| DatabaseError::CategoryNotFound(category.clone()))
    }

    /// Categories present, in insertion order
    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.order.iter()
    }

    /// Collections present, in insertion order
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.order.iter().filter_map(|c| self.collections.get(c))
    }

    /// Collections present, mutably; no ordering guarantee
    pub fn collections_mut(&mut self) -> impl Iterator<Item = &mut Collection> {
        self.collections.values_mut()
    }

    /// The first collection, if any
    pub fn first(&self) -> Option<&Collection> {
        self.order.first().and_then(|c| self.collections.get(c))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Adopt a collection decoded from a snapshot, skipping duplicates
    pub(crate) fn insert_loaded(&mut self, collection: Collection) -> bool {
        let category = collection.category().clone();
        if self.collections.contains_key(&category) {
            return false;
        }
        self.order.push(category.clone());
        self.collections.entry(category).or_insert(collection);
        true
    }

    /// Resolve a reference to its target record
    ///
    /// Fails with `CategoryNotFound` if the target collection itself is
    /// gone; a missing target id is the expected dangling-reference case
    /// and comes back as `Ok(None)`.
    pub fn resolve(&self, reference: &RecordRef) -> Result<Option<&Template>, DatabaseError> {
        let collection = self.get(&reference.category)?;
        Ok(collection.get(reference.id))
    }

    /// Resolve a statically typed reference
    pub fn resolve_typed<C: crate::record::CategoryTag>(
        &self,
        reference: &crate::record::TypedRef<C>,
    ) -> Result<Option<&Template>, DatabaseError> {
        self.resolve(&reference.as_record_ref())
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(settings::DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldTable, FieldValue, TemplateBody};
    use crate::registry::{CategoryDescriptor, KindDescriptor, TEMPLATE_KIND};

    fn block_body() -> TemplateBody {
        TemplateBody::Fields(FieldTable::new().with("solid", FieldValue::Bool(true)))
    }

    fn seed_blocks() -> Vec<Template> {
        let mut air = Template::new(KindId::new("game.BlockTemplate"), block_body());
        air.name = "Air".to_string();
        if let Some(table) = air.body.as_fields_mut() {
            table.set("solid", FieldValue::Bool(false));
        }
        vec![air]
    }

    fn test_registry() -> KindRegistry {
        let mut registry = KindRegistry::with_builtins();
        registry
            .register_kind(KindDescriptor {
                id: KindId::new("game.BlockTemplate"),
                parent: Some(KindId::new(TEMPLATE_KIND)),
                is_abstract: false,
                ctor: block_body,
            })
            .unwrap();
        registry
            .register_category(CategoryDescriptor {
                id: CategoryId::new("game.BlockCollection"),
                display_name: "Blocks".to_string(),
                base_kind: KindId::new("game.BlockTemplate"),
                seeds: Some(seed_blocks),
                before_save: None,
                after_save: None,
            })
            .unwrap();
        registry
    }

    fn block_category() -> CategoryId {
        CategoryId::new("game.BlockCollection")
    }

    #[test]
    fn test_add_collection_applies_seeds() {
        let registry = test_registry();
        let mut db = Database::new("test");
        let collection = db.add_collection(&registry, &block_category()).unwrap();

        assert_eq!(collection.len(), 1);
        let seeded = collection.get(0).unwrap();
        assert_eq!(seeded.name, "Air");
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let registry = test_registry();
        let mut db = Database::new("test");
        db.add_collection(&registry, &block_category()).unwrap();

        let result = db.add_collection(&registry, &block_category());
        assert!(matches!(result, Err(DatabaseError::DuplicateCategory(_))));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_unregistered_category_rejected() {
        let registry = test_registry();
        let mut db = Database::new("test");
        let result = db.add_collection(&registry, &CategoryId::new("game.Missing"));
        assert!(matches!(result, Err(DatabaseError::UnknownCategory(_))));
    }

    #[test]
    fn test_get_missing_category() {
        let db = Database::new("test");
        let result = db.get(&block_category());
        assert!(matches!(result, Err(DatabaseError::CategoryNotFound(_))));
    }

    #[test]
    fn test_remove_collection_is_idempotent() {
        let registry = test_registry();
        let mut db = Database::new("test");
        db.add_collection(&registry, &block_category()).unwrap();

        assert!(db.remove_collection(&block_category()).is_some());
        assert!(db.remove_collection(&block_category()).is_none());
        assert!(db.is_empty());
    }

    #[test]
    fn test_remove_clears_viewing() {
        let registry = test_registry();
        let mut db = Database::new("test");
        db.add_collection(&registry, &block_category()).unwrap();
        db.viewing = Some(block_category());

        db.remove_collection(&block_category());
        assert!(db.viewing.is_none());
    }

    #[test]
    fn test_resolve() {
        let registry = test_registry();
        let mut db = Database::new("test");
        db.add_collection(&registry, &block_category()).unwrap();

        // Seeded record has id 0.
        let hit = RecordRef::new(block_category()).pointing_at(0);
        let record = db.resolve(&hit).unwrap();
        assert_eq!(record.map(|t| t.name.as_str()), Some("Air"));

        // Missing id is a dangling reference, not an error.
        let dangling = RecordRef::new(block_category()).pointing_at(999);
        assert!(db.resolve(&dangling).unwrap().is_none());

        // Missing category is an error.
        db.remove_collection(&block_category());
        let result = db.resolve(&hit);
        assert!(matches!(result, Err(DatabaseError::CategoryNotFound(_))));
    }

    #[test]
    fn test_resolve_typed() {
        use crate::record::{Prefabs, TypedRef};
        use crate::registry::{PREFAB_CATEGORY, PREFAB_KIND};

        let registry = test_registry();
        let mut db = Database::new("test");
        let prefabs = db
            .add_collection(&registry, &CategoryId::new(PREFAB_CATEGORY))
            .unwrap();
        prefabs.add_kind(&registry, &KindId::new(PREFAB_KIND)).unwrap();

        let reference: TypedRef<Prefabs> = TypedRef::at(0);
        assert!(db.resolve_typed(&reference).unwrap().is_some());

        let dangling: TypedRef<Prefabs> = TypedRef::at(9);
        assert!(db.resolve_typed(&dangling).unwrap().is_none());
    }

    #[test]
    fn test_categories_in_insertion_order() {
        let mut registry = test_registry();
        registry
            .register_category(CategoryDescriptor {
                id: CategoryId::new("game.ZCollection"),
                display_name: "Z".to_string(),
                base_kind: KindId::new("game.BlockTemplate"),
                seeds: None,
                before_save: None,
                after_save: None,
            })
            .unwrap();

        let mut db = Database::new("test");
        db.add_collection(&registry, &CategoryId::new("game.ZCollection"))
            .unwrap();
        db.add_collection(&registry, &block_category()).unwrap();

        let names: Vec<&str> = db.categories().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["game.ZCollection", "game.BlockCollection"]);
        assert_eq!(db.first().map(|c| c.category().as_str()), Some("game.ZCollection"));
    }
}

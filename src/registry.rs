//! Record kind registry
//!
//! Maps record kinds onto collection categories without runtime type
//! introspection. Every kind and category is declared up front as a
//! descriptor carrying its stable name, its place in the kind hierarchy,
//! and a constructor for default payloads. Collections and the snapshot
//! bridge consult the registry instead of scanning type metadata.
//!
//! Identifiers are dotted names (`"tome.PrefabTemplate"`); the segment
//! after the last dot is the short name used for display and default
//! record names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::database::DatabaseError;
use crate::record::{PrefabAsset, Template, TemplateBody};

/// The abstract root kind every record kind derives from
pub const TEMPLATE_KIND: &str = "tome.Template";

/// The built-in asset-backed record kind
pub const PREFAB_KIND: &str = "tome.PrefabTemplate";

/// The built-in category holding prefab records
pub const PREFAB_CATEGORY: &str = "tome.PrefabCollection";

/// Stable name of a record kind
///
/// Serializes as a plain string so snapshots stay readable and diffable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KindId(String);

impl KindId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The segment after the last dot (`"tome.PrefabTemplate"` -> `"PrefabTemplate"`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for KindId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KindId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable name of a collection category
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The segment after the last dot
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A registered record kind
///
/// The constructor produces the kind's default payload; it is what a
/// collection invokes when a new record of this kind is added.
#[derive(Debug, Clone)]
pub struct KindDescriptor {
    /// Stable dotted name
    pub id: KindId,
    /// Parent kind, if this kind specializes another
    pub parent: Option<KindId>,
    /// Abstract kinds anchor a hierarchy but are never instantiated
    pub is_abstract: bool,
    /// Default payload constructor
    pub ctor: fn() -> TemplateBody,
}

/// A registered collection category
#[derive(Debug, Clone)]
pub struct CategoryDescriptor {
    /// Stable dotted name
    pub id: CategoryId,
    /// Name shown in the editor for collections of this category
    pub display_name: String,
    /// The base kind records in this category must derive from
    pub base_kind: KindId,
    /// Records added to every freshly created collection of this category
    pub seeds: Option<fn() -> Vec<Template>>,
    /// Invoked on each collection of this category before a database save
    pub before_save: Option<fn(&mut Collection)>,
    /// Invoked after the save completed
    pub after_save: Option<fn(&mut Collection)>,
}

/// Registry of every known record kind and collection category
///
/// Registration happens explicitly at startup; there is no global
/// instance. Callers hold a registry and pass it to the collection and
/// database operations that need kind lookups.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    /// Kind descriptors in registration order
    kinds: Vec<KindDescriptor>,
    kind_index: HashMap<KindId, usize>,
    /// Category descriptors in registration order
    categories: Vec<CategoryDescriptor>,
    category_index: HashMap<CategoryId, usize>,
}

fn template_body() -> TemplateBody {
    TemplateBody::fields()
}

fn prefab_body() -> TemplateBody {
    TemplateBody::Prefab {
        prefab: PrefabAsset::default(),
    }
}

impl KindRegistry {
    /// Create an empty registry with nothing registered
    pub fn empty() -> Self {
        Self {
            kinds: Vec::new(),
            kind_index: HashMap::new(),
            categories: Vec::new(),
            category_index: HashMap::new(),
        }
    }

    /// Create a registry seeded with the built-in kinds and categories
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        // Registration of the built-ins cannot collide in an empty registry.
        let _ = registry.register_kind(KindDescriptor {
            id: KindId::new(TEMPLATE_KIND),
            parent: None,
            is_abstract: true,
            ctor: template_body,
        });
        let _ = registry.register_kind(KindDescriptor {
            id: KindId::new(PREFAB_KIND),
            parent: Some(KindId::new(TEMPLATE_KIND)),
            is_abstract: false,
            ctor: prefab_body,
        });
        let _ = registry.register_category(CategoryDescriptor {
            id: CategoryId::new(PREFAB_CATEGORY),
            display_name: "Prefabs".to_string(),
            base_kind: KindId::new(PREFAB_KIND),
            seeds: None,
            before_save: None,
            after_save: None,
        });

        registry
    }

    /// Register a record kind
    ///
    /// The parent kind, when given, must already be registered. Registering
    /// the same kind name twice is an error.
    pub fn register_kind(&mut self, descriptor: KindDescriptor) -> Result<(), DatabaseError> {
        if self.kind_index.contains_key(&descriptor.id) {
            return Err(DatabaseError::DuplicateKind(descriptor.id));
        }
        if let Some(parent) = &descriptor.parent {
            if !self.kind_index.contains_key(parent) {
                return Err(DatabaseError::UnknownKind(parent.clone()));
            }
        }

        self.kind_index
            .insert(descriptor.id.clone(), self.kinds.len());
        self.kinds.push(descriptor);
        Ok(())
    }

    /// Register a collection category
    ///
    /// The base kind must already be registered.
    pub fn register_category(
        &mut self,
        descriptor: CategoryDescriptor,
    ) -> Result<(), DatabaseError> {
        if self.category_index.contains_key(&descriptor.id) {
            return Err(DatabaseError::DuplicateCategory(descriptor.id));
        }
        if !self.kind_index.contains_key(&descriptor.base_kind) {
            return Err(DatabaseError::UnknownKind(descriptor.base_kind.clone()));
        }

        self.category_index
            .insert(descriptor.id.clone(), self.categories.len());
        self.categories.push(descriptor);
        Ok(())
    }

    /// Look up a kind descriptor
    pub fn kind(&self, id: &KindId) -> Option<&KindDescriptor> {
        self.kind_index.get(id).map(|&i| &self.kinds[i])
    }

    /// Look up a category descriptor
    pub fn category(&self, id: &CategoryId) -> Option<&CategoryDescriptor> {
        self.category_index.get(id).map(|&i| &self.categories[i])
    }

    /// Iterate all registered categories in registration order
    pub fn categories(&self) -> impl Iterator<Item = &CategoryDescriptor> {
        self.categories.iter()
    }

    /// Iterate all registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &KindDescriptor> {
        self.kinds.iter()
    }

    /// Every kind assignable to `category`: the base kind plus all kinds
    /// deriving from it, excluding abstract kinds, in registration order.
    ///
    /// Used to populate "add record of kind X" choices in the editor.
    pub fn kinds_for(&self, category: &CategoryId) -> Result<Vec<&KindDescriptor>, DatabaseError> {
        let descriptor = self
            .category(category)
            .ok_or_else(|| DatabaseError::UnknownCategory(category.clone()))?;

        Ok(self
            .kinds
            .iter()
            .filter(|k| !k.is_abstract && self.kind_is(&k.id, &descriptor.base_kind))
            .collect())
    }

    /// Whether `kind` is `ancestor` or derives from it through its parent chain
    pub fn kind_is(&self, kind: &KindId, ancestor: &KindId) -> bool {
        let mut current = Some(kind);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.kind(id).and_then(|d| d.parent.as_ref());
        }
        false
    }

    /// Construct a default-valued template of `kind`
    ///
    /// The record comes back without an id or name; those are assigned by
    /// the collection it is added to.
    pub fn instantiate(&self, kind: &KindId) -> Result<Template, DatabaseError> {
        let descriptor = self
            .kind(kind)
            .ok_or_else(|| DatabaseError::UnknownKind(kind.clone()))?;
        if descriptor.is_abstract {
            return Err(DatabaseError::AbstractKind(kind.clone()));
        }

        Ok(Template::new(descriptor.id.clone(), (descriptor.ctor)()))
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

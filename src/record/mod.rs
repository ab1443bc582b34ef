//! Records ("templates") and their payloads
//!
//! A template is one stored item: a collection-assigned id, a display
//! name, a kind tag, and a kind-specific payload. Payloads come in two
//! shapes:
//! - `Fields`: an ordered table of named values, the shared contract
//!   registered kinds build their schemas on
//! - `Prefab`: the asset-backed specialization used by the built-in
//!   prefab category
//!
//! Templates do not know which collection holds them; lookups always run
//! top-down through the database.

mod fields;
mod prefab;
mod reference;

pub use fields::{FieldTable, FieldValue};
pub use prefab::PrefabAsset;
pub use reference::{CategoryTag, Prefabs, RecordRef, TypedRef};

use crate::registry::KindId;

/// Id of a record that has not been added to a collection yet
pub const UNSET_ID: i64 = -1;

/// Kind-specific record payload
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBody {
    /// General payload: named fields as declared by the kind's constructor
    Fields(FieldTable),
    /// Asset-backed payload for prefab records
    Prefab { prefab: PrefabAsset },
}

impl TemplateBody {
    /// An empty field-table payload
    pub fn fields() -> Self {
        TemplateBody::Fields(FieldTable::new())
    }

    /// Field table access for general payloads
    pub fn as_fields(&self) -> Option<&FieldTable> {
        match self {
            TemplateBody::Fields(table) => Some(table),
            TemplateBody::Prefab { .. } => None,
        }
    }

    /// Mutable field table access for general payloads
    pub fn as_fields_mut(&mut self) -> Option<&mut FieldTable> {
        match self {
            TemplateBody::Fields(table) => Some(table),
            TemplateBody::Prefab { .. } => None,
        }
    }

    /// Prefab asset access for asset-backed payloads
    pub fn as_prefab(&self) -> Option<&PrefabAsset> {
        match self {
            TemplateBody::Prefab { prefab } => Some(prefab),
            TemplateBody::Fields(_) => None,
        }
    }

    /// Mutable prefab asset access
    pub fn as_prefab_mut(&mut self) -> Option<&mut PrefabAsset> {
        match self {
            TemplateBody::Prefab { prefab } => Some(prefab),
            TemplateBody::Fields(_) => None,
        }
    }
}

/// One database record
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Unique within the owning collection, assigned on add
    pub id: i64,
    /// Display name; empty until the collection assigns the default
    pub name: String,
    /// The record's kind tag
    pub kind: KindId,
    /// Editor-only visibility flag, ignored by persistence semantics
    pub show: bool,
    /// Editor-only expansion flag, ignored by persistence semantics
    pub expanded: bool,
    /// Kind-specific payload
    pub body: TemplateBody,
}

impl Template {
    /// Create a record of `kind` awaiting id assignment by a collection
    pub fn new(kind: KindId, body: TemplateBody) -> Self {
        Self {
            id: UNSET_ID,
            name: String::new(),
            kind,
            show: true,
            expanded: false,
            body,
        }
    }

    /// The name a collection assigns when the record has none: `"<kind> <id>"`
    pub fn default_name(&self) -> String {
        format!("{} {}", self.kind.short_name(), self.id)
    }

    /// The name this record presents to lookups and the editor
    ///
    /// A prefab record with an asset reports the asset's file name and
    /// ignores its stored name; every other record reports the stored name.
    pub fn effective_name(&self) -> &str {
        if let TemplateBody::Prefab { prefab } = &self.body {
            if prefab.has_asset() {
                return prefab.file_name();
            }
        }
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_template() {
        let template = Template::new(KindId::new("game.BlockTemplate"), TemplateBody::fields());
        assert_eq!(template.id, UNSET_ID);
        assert!(template.name.is_empty());
        assert!(template.show);
        assert!(!template.expanded);
    }

    #[test]
    fn test_default_name() {
        let mut template =
            Template::new(KindId::new("game.BlockTemplate"), TemplateBody::fields());
        template.id = 7;
        assert_eq!(template.default_name(), "BlockTemplate 7");
    }

    #[test]
    fn test_effective_name_plain() {
        let mut template =
            Template::new(KindId::new("game.BlockTemplate"), TemplateBody::fields());
        template.name = "Dirt".to_string();
        assert_eq!(template.effective_name(), "Dirt");
    }

    #[test]
    fn test_effective_name_prefab_with_asset() {
        let mut template = Template::new(
            KindId::new(crate::registry::PREFAB_KIND),
            TemplateBody::Prefab {
                prefab: PrefabAsset::at_path("models/props/crate.glb"),
            },
        );
        template.name = "ignored".to_string();
        assert_eq!(template.effective_name(), "crate.glb");
    }

    #[test]
    fn test_effective_name_prefab_without_asset() {
        let mut template = Template::new(
            KindId::new(crate::registry::PREFAB_KIND),
            TemplateBody::Prefab {
                prefab: PrefabAsset::default(),
            },
        );
        template.name = "Empty Prefab".to_string();
        assert_eq!(template.effective_name(), "Empty Prefab");
    }
}

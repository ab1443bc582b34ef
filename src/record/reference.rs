//! Typed cross-collection references
//!
//! A reference is a soft link: target category, optional kind filter, and
//! a record id. Resolution goes through the database and tolerates missing
//! targets - content evolves between saves and a dangling reference is an
//! expected steady state, not an error.
//!
//! Two variants exist. `RecordRef` carries its target category as data and
//! trusts the serialized strings. `TypedRef<C>` fixes the category at the
//! type level through a marker; on deserialize the declared category wins
//! over whatever the document claims, so a stale or hand-edited snapshot
//! cannot retarget a statically typed field.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::registry::{CategoryId, KindId, PREFAB_CATEGORY};

use super::UNSET_ID;

/// Reference to a record in another collection
///
/// `id == UNSET_ID` means the reference points at nothing yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRef {
    /// Target collection category
    pub category: CategoryId,
    /// Optional restriction to one kind (and its specializations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_filter: Option<KindId>,
    /// Target record id
    #[serde(default = "unset_id")]
    pub id: i64,
}

fn unset_id() -> i64 {
    UNSET_ID
}

impl RecordRef {
    /// An unset reference into `category`
    pub fn new(category: CategoryId) -> Self {
        Self {
            category,
            kind_filter: None,
            id: UNSET_ID,
        }
    }

    /// Restrict the reference to records of `kind` or its specializations
    pub fn with_filter(mut self, kind: KindId) -> Self {
        self.kind_filter = Some(kind);
        self
    }

    /// Point the reference at a record id
    pub fn pointing_at(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Whether the reference points at anything
    pub fn is_set(&self) -> bool {
        self.id != UNSET_ID
    }

    /// Reset to the unset state
    pub fn clear(&mut self) {
        self.id = UNSET_ID;
    }
}

/// Marker fixing a reference's target category at the type level
///
/// Implement on a zero-sized type per category a statically typed field
/// should target:
///
/// ```
/// use tome::{CategoryTag, CategoryId, TypedRef};
///
/// struct Blocks;
/// impl CategoryTag for Blocks {
///     fn category() -> CategoryId {
///         CategoryId::new("game.BlockCollection")
///     }
/// }
///
/// let spawned: TypedRef<Blocks> = TypedRef::at(3);
/// assert_eq!(spawned.as_record_ref().category.as_str(), "game.BlockCollection");
/// ```
pub trait CategoryTag {
    /// The target category
    fn category() -> CategoryId;

    /// Optional kind restriction within the category
    fn kind_filter() -> Option<KindId> {
        None
    }
}

/// Marker for the built-in prefab category
pub struct Prefabs;

impl CategoryTag for Prefabs {
    fn category() -> CategoryId {
        CategoryId::new(PREFAB_CATEGORY)
    }
}

/// Statically typed reference
///
/// Serializes to the same `{category, kindFilter, id}` layout as
/// `RecordRef` so both forms read identically in a snapshot; only the id
/// is trusted when reading back.
pub struct TypedRef<C: CategoryTag> {
    /// Target record id
    pub id: i64,
    _tag: PhantomData<C>,
}

impl<C: CategoryTag> TypedRef<C> {
    /// An unset reference
    pub fn new() -> Self {
        Self {
            id: UNSET_ID,
            _tag: PhantomData,
        }
    }

    /// A reference pointing at `id`
    pub fn at(id: i64) -> Self {
        Self {
            id,
            _tag: PhantomData,
        }
    }

    /// Whether the reference points at anything
    pub fn is_set(&self) -> bool {
        self.id != UNSET_ID
    }

    /// The dynamic form, for resolution through the database
    pub fn as_record_ref(&self) -> RecordRef {
        RecordRef {
            category: C::category(),
            kind_filter: C::kind_filter(),
            id: self.id,
        }
    }
}

impl<C: CategoryTag> Default for TypedRef<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CategoryTag> Clone for TypedRef<C> {
    fn clone(&self) -> Self {
        Self::at(self.id)
    }
}

impl<C: CategoryTag> Copy for TypedRef<C> {}

impl<C: CategoryTag> PartialEq for TypedRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: CategoryTag> std::fmt::Debug for TypedRef<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRef")
            .field("category", &C::category().as_str())
            .field("id", &self.id)
            .finish()
    }
}

impl<C: CategoryTag> Serialize for TypedRef<C> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_record_ref().serialize(serializer)
    }
}

impl<'de, C: CategoryTag> Deserialize<'de> for TypedRef<C> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RecordRef::deserialize(deserializer)?;
        // The declared category wins; the stored string is only authoritative
        // for the untyped variant.
        if raw.category != C::category() {
            log::debug!(
                "typed reference stored category {} overridden by declared {}",
                raw.category,
                C::category()
            );
        }
        Ok(Self::at(raw.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blocks;
    impl CategoryTag for Blocks {
        fn category() -> CategoryId {
            CategoryId::new("game.BlockCollection")
        }
        fn kind_filter() -> Option<KindId> {
            Some(KindId::new("game.OreBlockTemplate"))
        }
    }

    #[test]
    fn test_record_ref_serde_shape() {
        let reference = RecordRef::new(CategoryId::new("game.BlockCollection"))
            .with_filter(KindId::new("game.OreBlockTemplate"))
            .pointing_at(5);
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["category"], "game.BlockCollection");
        assert_eq!(json["kindFilter"], "game.OreBlockTemplate");
        assert_eq!(json["id"], 5);

        let back: RecordRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn test_record_ref_omits_empty_filter() {
        let reference = RecordRef::new(CategoryId::new("game.BlockCollection"));
        let json = serde_json::to_string(&reference).unwrap();
        assert!(!json.contains("kindFilter"));
        assert!(!reference.is_set());
    }

    #[test]
    fn test_record_ref_missing_id_is_unset() {
        let back: RecordRef =
            serde_json::from_str(r#"{"category":"game.BlockCollection"}"#).unwrap();
        assert_eq!(back.id, UNSET_ID);
    }

    #[test]
    fn test_typed_ref_serializes_declared_names() {
        let reference: TypedRef<Blocks> = TypedRef::at(9);
        let json = serde_json::to_value(reference).unwrap();
        assert_eq!(json["category"], "game.BlockCollection");
        assert_eq!(json["kindFilter"], "game.OreBlockTemplate");
        assert_eq!(json["id"], 9);
    }

    #[test]
    fn test_typed_ref_ignores_tampered_category() {
        // A hand-edited snapshot claims a different category; the declared
        // type parameter must win.
        let back: TypedRef<Blocks> =
            serde_json::from_str(r#"{"category":"game.Elsewhere","id":4}"#).unwrap();
        assert_eq!(back.id, 4);
        assert_eq!(back.as_record_ref().category.as_str(), "game.BlockCollection");
    }

    #[test]
    fn test_typed_ref_defaults_unset() {
        let reference: TypedRef<Prefabs> = TypedRef::default();
        assert!(!reference.is_set());
        assert_eq!(reference.as_record_ref().category.as_str(), PREFAB_CATEGORY);
    }

    #[test]
    fn test_clear() {
        let mut reference = RecordRef::new(CategoryId::new("game.BlockCollection")).pointing_at(2);
        assert!(reference.is_set());
        reference.clear();
        assert!(!reference.is_set());
    }
}

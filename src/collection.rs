//! Collections - identity-indexed containers of records
//!
//! A collection owns every record of one category: id assignment, lookup
//! by id or name, add/remove/clone, and the bulk sweep over asset-backed
//! fields. Records live in a map keyed by id with a separate insertion
//! order; display order is the consumer's problem (sort by id via `list`).
//!
//! Id assignment is monotonic for the lifetime of the collection: the
//! counter never moves backwards, so removing the highest record does not
//! hand its id to the next add and references captured before a deletion
//! stay unambiguous.

use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::record::{Template, TemplateBody, UNSET_ID};
use crate::registry::{CategoryId, KindId, KindRegistry};
use crate::snapshot;

/// An ordered, identity-indexed container of records of one category
#[derive(Debug, Clone)]
pub struct Collection {
    category: CategoryId,
    /// Name shown in the editor, seeded from the category descriptor
    pub display_name: String,
    /// Records keyed by id; exclusively owned, mutate through the methods below
    items: HashMap<i64, Template>,
    /// Insertion order of record ids
    order: Vec<i64>,
    /// Next id to assign; never decreases
    next_id: i64,
}

impl Collection {
    /// Create an empty collection of `category`
    ///
    /// Fails if the category is not registered. Default seed records are
    /// the database's job (`Database::add_collection`), not this one.
    pub fn new(registry: &KindRegistry, category: CategoryId) -> Result<Self, DatabaseError> {
        let descriptor = registry
            .category(&category)
            .ok_or_else(|| DatabaseError::UnknownCategory(category.clone()))?;

        Ok(Self {
            display_name: descriptor.display_name.clone(),
            category,
            items: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
        })
    }

    /// The category this collection stores
    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validate that `kind` may live in this collection
    fn check_kind(&self, registry: &KindRegistry, kind: &KindId) -> Result<(), DatabaseError> {
        let descriptor = registry
            .category(&self.category)
            .ok_or_else(|| DatabaseError::UnknownCategory(self.category.clone()))?;
        if registry.kind(kind).is_none() {
            return Err(DatabaseError::UnknownKind(kind.clone()));
        }
        if !registry.kind_is(kind, &descriptor.base_kind) {
            return Err(DatabaseError::KindMismatch {
                kind: kind.clone(),
                category: self.category.clone(),
            });
        }
        Ok(())
    }

    /// Add a default-valued record of `kind`
    ///
    /// Fails with `KindMismatch` if `kind` is not the category's base kind
    /// or a specialization of it. The new record gets the next id and the
    /// kind-derived default name.
    pub fn add_kind(
        &mut self,
        registry: &KindRegistry,
        kind: &KindId,
    ) -> Result<&mut Template, DatabaseError> {
        self.check_kind(registry, kind)?;
        let template = registry.instantiate(kind)?;
        self.add(registry, template)
    }

    /// Add a concrete record instance
    ///
    /// Same validation and id assignment as `add_kind`; used for seed
    /// records and clones. A record arriving without a name gets the
    /// default one.
    pub fn add(
        &mut self,
        registry: &KindRegistry,
        mut template: Template,
    ) -> Result<&mut Template, DatabaseError> {
        self.check_kind(registry, &template.kind)?;

        template.id = self.next_id;
        self.next_id += 1;
        if template.name.is_empty() {
            template.name = template.default_name();
        }

        let id = template.id;
        self.order.push(id);
        Ok(self.items.entry(id).or_insert(template))
    }

    /// Deep-copy the record with `id` into a fresh record
    ///
    /// The copy is produced by round-tripping the source through the JSON
    /// bridge, so a clone is structurally identical to a record that was
    /// saved and loaded. The name is cleared first and the default-name
    /// rule reapplies under the new id.
    pub fn clone_record(
        &mut self,
        registry: &KindRegistry,
        id: i64,
    ) -> Result<&mut Template, DatabaseError> {
        let source = self.items.get(&id).ok_or(DatabaseError::RecordNotFound {
            category: self.category.clone(),
            id,
        })?;

        let mut copy = snapshot::clone_template(registry, source)?;
        copy.id = UNSET_ID;
        copy.name.clear();
        self.add(registry, copy)
    }

    /// Remove the record with `id`
    ///
    /// Idempotent: removing an id that is not present logs and returns
    /// `None`. Ids of removed records are never reassigned.
    pub fn remove(&mut self, id: i64) -> Option<Template> {
        match self.items.remove(&id) {
            Some(template) => {
                self.order.retain(|&other| other != id);
                Some(template)
            }
            None => {
                log::warn!("record id {} not found in {}", id, self.category);
                None
            }
        }
    }

    /// Get a record by id
    pub fn get(&self, id: i64) -> Option<&Template> {
        self.items.get(&id)
    }

    /// Get a record by id, mutably
    pub fn get_mut(&mut self, id: i64) -> Option<&mut Template> {
        self.items.get_mut(&id)
    }

    /// Get a record by name
    ///
    /// Names are not unique; the first match in insertion order wins.
    /// Matches the effective name, so prefab records answer to their asset
    /// file name.
    pub fn get_by_name(&self, name: &str) -> Option<&Template> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id))
            .find(|t| t.effective_name() == name)
    }

    /// Records in ascending id order, optionally restricted to one kind
    /// (and its specializations)
    pub fn list(&self, registry: &KindRegistry, filter: Option<&KindId>) -> Vec<&Template> {
        let mut records: Vec<&Template> = self
            .items
            .values()
            .filter(|t| filter.map_or(true, |f| registry.kind_is(&t.kind, f)))
            .collect();
        records.sort_by_key(|t| t.id);
        records
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Run this category's before-save hook, if one is registered
    pub fn before_save(&mut self, registry: &KindRegistry) {
        if let Some(hook) = registry.category(&self.category).and_then(|d| d.before_save) {
            hook(self);
        }
    }

    /// Run this category's after-save hook, if one is registered
    pub fn after_save(&mut self, registry: &KindRegistry) {
        if let Some(hook) = registry.category(&self.category).and_then(|d| d.after_save) {
            hook(self);
        }
    }

    /// Paths of every asset-backed field with an asset selected, in record
    /// id order
    ///
    /// Used by packaging collaborators; not needed for correctness of the
    /// store itself.
    pub fn collect_asset_references(&self) -> Vec<String> {
        let mut ids: Vec<i64> = self.items.keys().copied().collect();
        ids.sort_unstable();

        let mut paths = Vec::new();
        for id in ids {
            if let Some(template) = self.items.get(&id) {
                match &template.body {
                    TemplateBody::Prefab { prefab } if prefab.has_asset() => {
                        paths.push(prefab.asset_path.clone());
                    }
                    TemplateBody::Fields(table) => {
                        paths.extend(
                            table
                                .assets()
                                .filter(|a| a.has_asset())
                                .map(|a| a.asset_path.clone()),
                        );
                    }
                    _ => {}
                }
            }
        }
        paths
    }

    /// Insert a record decoded from a snapshot, keeping its stored id
    ///
    /// Returns false on a duplicate id. The id counter advances past the
    /// highest loaded id.
    pub(crate) fn insert_loaded(&mut self, template: Template) -> bool {
        if self.items.contains_key(&template.id) {
            return false;
        }
        self.next_id = self.next_id.max(template.id + 1);
        self.order.push(template.id);
        self.items.entry(template.id).or_insert(template);
        true
    }
}

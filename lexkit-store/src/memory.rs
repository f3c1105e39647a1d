use lexkit_model::{
    FieldDescriptor, FieldKind, FieldValue, ObjectStore, Ownership, SchemaCatalog, StoreError,
    StoreResult, TypeDescriptor,
};
use lexkit_types::{GlobalId, Locale, ObjectId};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Record {
    type_tag: String,
    global_id: GlobalId,
    owner: Option<Ownership>,
    /// Fields never written hold their kind's empty value and are absent here.
    fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    records: BTreeMap<ObjectId, Record>,
    free: Vec<ObjectId>,
    next: u32,
}

/// An object store held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    catalog: SchemaCatalog,
    /// Flattened descriptors keyed by type tag.
    types: HashMap<String, TypeDescriptor>,
    locales: Vec<Locale>,
    records: BTreeMap<ObjectId, Record>,
    /// Handles released by deletes, reused most-recent first.
    free: Vec<ObjectId>,
    next: u32,
    uow_depth: usize,
}

impl MemoryStore {
    /// Creates an empty store for `catalog`, with English as the only locale.
    pub fn new(catalog: SchemaCatalog) -> StoreResult<Self> {
        catalog.validate()?;
        Ok(Self::from_valid(catalog))
    }

    /// An empty store over the built-in lexicon catalog.
    #[must_use]
    pub fn lexicon() -> Self {
        Self::from_valid(SchemaCatalog::lexicon())
    }

    fn from_valid(catalog: SchemaCatalog) -> Self {
        let types = catalog
            .type_tags()
            .filter_map(|tag| catalog.flattened(tag))
            .map(|t| (t.type_tag.clone(), t))
            .collect();
        let locales = Locale::parse("en").into_iter().collect();
        Self {
            catalog,
            types,
            locales,
            records: BTreeMap::new(),
            free: Vec::new(),
            next: 1,
            uow_depth: 0,
        }
    }

    /// Replaces the registered locales. Invalid tags are skipped with a warning.
    #[must_use]
    pub fn with_locales<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        self.locales.clear();
        for tag in tags {
            match Locale::parse(tag) {
                Ok(locale) => self.add_locale(locale),
                Err(e) => warn!("Ignoring locale {:?}: {}", tag, e),
            }
        }
        self
    }

    /// Registers a locale if it is not known yet.
    pub fn add_locale(&mut self, locale: Locale) {
        if !self.locales.contains(&locale) {
            self.locales.push(locale);
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Objects without an owner.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.records
            .iter()
            .filter(|(_, r)| r.owner.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// True while a [`MemoryStore::unit_of_work`] closure is running.
    #[must_use]
    pub fn in_unit_of_work(&self) -> bool {
        self.uow_depth > 0
    }

    /// Runs `work` as one unit: if it returns `Err`, every change it made is
    /// rolled back before the error is returned. Units may nest; an inner
    /// failure only rolls back the inner unit.
    pub fn unit_of_work<T, E>(
        &mut self,
        work: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let snapshot = Snapshot {
            records: self.records.clone(),
            free: self.free.clone(),
            next: self.next,
        };
        self.uow_depth += 1;
        let result = work(self);
        self.uow_depth -= 1;

        if result.is_err() {
            debug!(
                "Unit of work failed, restoring {} objects",
                snapshot.records.len()
            );
            self.records = snapshot.records;
            self.free = snapshot.free;
            self.next = snapshot.next;
        }
        result
    }

    fn record(&self, id: ObjectId) -> StoreResult<&Record> {
        self.records.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn descriptor_of(&self, type_tag: &str) -> StoreResult<&TypeDescriptor> {
        self.types
            .get(type_tag)
            .ok_or_else(|| StoreError::UnknownType(type_tag.to_string()))
    }

    fn field_of(&self, id: ObjectId, field: &str) -> StoreResult<FieldDescriptor> {
        let record = self.record(id)?;
        self.descriptor_of(&record.type_tag)?
            .field(field)
            .cloned()
            .ok_or_else(|| StoreError::UnknownField {
                type_tag: record.type_tag.clone(),
                field: field.to_string(),
            })
    }

    fn check_target(&self, descriptor: &FieldDescriptor, target_id: ObjectId) -> StoreResult<()> {
        let actual = &self.record(target_id)?.type_tag;
        match &descriptor.target {
            Some(expected) if !self.catalog.is_subtype(actual, expected) => {
                Err(StoreError::TargetMismatch {
                    field: descriptor.name.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn allocate(&mut self) -> ObjectId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                let id = ObjectId::new(self.next);
                self.next += 1;
                id
            }
        }
    }

    fn stored(&self, id: ObjectId, descriptor: &FieldDescriptor) -> StoreResult<FieldValue> {
        Ok(self
            .record(id)?
            .fields
            .get(&descriptor.name)
            .cloned()
            .unwrap_or_else(|| FieldValue::empty(descriptor.kind)))
    }

    fn write(&mut self, id: ObjectId, field: &str, value: FieldValue) -> StoreResult<()> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.fields.insert(field.to_string(), value);
        Ok(())
    }

    fn set_owned(
        &mut self,
        id: ObjectId,
        descriptor: &FieldDescriptor,
        value: FieldValue,
    ) -> StoreResult<()> {
        let current = self.stored(id, descriptor)?.object_ids();
        let wanted = value.object_ids();

        if let Some(stranger) = wanted.iter().find(|w| !current.contains(w)) {
            return Err(StoreError::InvalidOwnership(format!(
                "{stranger} is not owned by {id}.{}; use create to add owned objects",
                descriptor.name
            )));
        }
        let unique: HashSet<_> = wanted.iter().collect();
        if unique.len() != wanted.len() {
            return Err(StoreError::InvalidOwnership(format!(
                "{id}.{} would own the same object twice",
                descriptor.name
            )));
        }

        for dropped in current.iter().filter(|c| !wanted.contains(c)) {
            self.delete(*dropped)?;
        }
        self.write(id, &descriptor.name, value)
    }

    fn set_reference(
        &mut self,
        id: ObjectId,
        descriptor: &FieldDescriptor,
        value: FieldValue,
    ) -> StoreResult<()> {
        for target in value.object_ids() {
            self.check_target(descriptor, target)?;
        }
        // Reference collections are sets.
        let value = match (descriptor.kind, value) {
            (FieldKind::ReferenceCollection, FieldValue::Objects(ids)) => {
                let mut seen = HashSet::new();
                FieldValue::Objects(ids.into_iter().filter(|i| seen.insert(*i)).collect())
            }
            (_, value) => value,
        };
        self.write(id, &descriptor.name, value)
    }

    fn detach_from_owner(&mut self, id: ObjectId) -> StoreResult<()> {
        let Some(ownership) = self.record(id)?.owner.clone() else {
            return Ok(());
        };
        let Some(owner) = self.records.get_mut(&ownership.owner) else {
            return Ok(());
        };
        match owner.fields.get_mut(&ownership.field) {
            Some(FieldValue::Objects(ids)) => ids.retain(|c| *c != id),
            Some(slot @ FieldValue::Object(Some(_))) => *slot = FieldValue::Object(None),
            _ => {}
        }
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    fn locales(&self) -> Vec<Locale> {
        self.locales.clone()
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.records.keys().copied().collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.records.contains_key(&id)
    }

    fn type_tag(&self, id: ObjectId) -> StoreResult<String> {
        Ok(self.record(id)?.type_tag.clone())
    }

    fn global_id(&self, id: ObjectId) -> StoreResult<GlobalId> {
        Ok(self.record(id)?.global_id)
    }

    fn owner(&self, id: ObjectId) -> StoreResult<Option<Ownership>> {
        Ok(self.record(id)?.owner.clone())
    }

    fn find_by_global_id(&self, global_id: GlobalId) -> Option<ObjectId> {
        self.records
            .iter()
            .find(|(_, r)| r.global_id == global_id)
            .map(|(id, _)| *id)
    }

    fn get(&self, id: ObjectId, field: &str) -> StoreResult<FieldValue> {
        let record = self.record(id)?;
        let value = match field {
            "Id" => FieldValue::Integer(i64::from(id.get())),
            "Guid" => FieldValue::String(record.global_id.to_string()),
            "ClassName" => FieldValue::String(record.type_tag.clone()),
            "Owner" => FieldValue::Object(record.owner.as_ref().map(|o| o.owner)),
            "OwningField" => FieldValue::String(
                record
                    .owner
                    .as_ref()
                    .map(|o| o.field.clone())
                    .unwrap_or_default(),
            ),
            _ => {
                let descriptor = self.field_of(id, field)?;
                self.stored(id, &descriptor)?
            }
        };
        Ok(value)
    }

    fn set(&mut self, id: ObjectId, field: &str, value: FieldValue) -> StoreResult<()> {
        let descriptor = self.field_of(id, field)?;
        if descriptor.is_system {
            return Err(StoreError::SystemField(field.to_string()));
        }
        if !value.fits(descriptor.kind) {
            return Err(StoreError::KindMismatch {
                type_tag: self.record(id)?.type_tag.clone(),
                field: field.to_string(),
                expected: descriptor.kind,
            });
        }

        if descriptor.kind.is_owned() {
            self.set_owned(id, &descriptor, value)
        } else if descriptor.kind.is_reference() {
            self.set_reference(id, &descriptor, value)
        } else {
            self.write(id, field, value)
        }
    }

    fn create(&mut self, type_tag: &str, owner: Option<(ObjectId, &str)>) -> StoreResult<ObjectId> {
        let descriptor = self.descriptor_of(type_tag)?;
        if descriptor.is_abstract {
            return Err(StoreError::AbstractType(type_tag.to_string()));
        }

        let ownership = match owner {
            Some((owner_id, field)) => {
                let slot = self.field_of(owner_id, field)?;
                if !slot.kind.is_owned() || slot.is_system {
                    return Err(StoreError::InvalidOwnership(format!(
                        "{owner_id}.{field} is a {} field",
                        slot.kind
                    )));
                }
                if let Some(expected) = &slot.target
                    && !self.catalog.is_subtype(type_tag, expected)
                {
                    return Err(StoreError::TargetMismatch {
                        field: field.to_string(),
                        expected: expected.clone(),
                        actual: type_tag.to_string(),
                    });
                }
                // An owned-atomic slot holds one object; the old one goes.
                if slot.kind == FieldKind::OwnedAtomic
                    && let Some(previous) = self.stored(owner_id, &slot)?.as_object()
                {
                    self.delete(previous)?;
                }
                Some((owner_id, slot))
            }
            None => None,
        };

        let id = self.allocate();
        self.records.insert(
            id,
            Record {
                type_tag: type_tag.to_string(),
                global_id: GlobalId::new(),
                owner: ownership.as_ref().map(|(owner_id, slot)| Ownership {
                    owner: *owner_id,
                    field: slot.name.clone(),
                }),
                fields: BTreeMap::new(),
            },
        );

        if let Some((owner_id, slot)) = ownership {
            let value = match self.stored(owner_id, &slot)? {
                FieldValue::Objects(mut ids) => {
                    ids.push(id);
                    FieldValue::Objects(ids)
                }
                _ => FieldValue::Object(Some(id)),
            };
            self.write(owner_id, &slot.name, value)?;
        }

        debug!("Created {} {}", type_tag, id);
        Ok(id)
    }

    fn delete(&mut self, id: ObjectId) -> StoreResult<()> {
        let mut doomed = vec![id];
        doomed.extend(self.owned_subtree(id)?);
        self.detach_from_owner(id)?;

        let doomed_set: HashSet<ObjectId> = doomed.iter().copied().collect();
        for removed in &doomed {
            self.records.remove(removed);
        }

        // Remaining references to the deleted objects are dropped.
        let types = &self.types;
        for record in self.records.values_mut() {
            let Some(descriptor) = types.get(&record.type_tag) else {
                continue;
            };
            for field in descriptor.reference_fields() {
                match record.fields.get_mut(&field.name) {
                    Some(FieldValue::Objects(ids)) => ids.retain(|r| !doomed_set.contains(r)),
                    Some(slot @ FieldValue::Object(Some(_))) => {
                        if slot.as_object().is_some_and(|r| doomed_set.contains(&r)) {
                            *slot = FieldValue::Object(None);
                        }
                    }
                    _ => {}
                }
            }
        }

        self.free.extend(doomed.iter().rev());
        debug!("Deleted {} ({} objects)", id, doomed.len());
        Ok(())
    }

    fn children(&self, id: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let record = self.record(id)?;
        let descriptor = self.descriptor_of(&record.type_tag)?;
        let mut out = Vec::new();
        for field in descriptor.owned_fields() {
            if let Some(value) = record.fields.get(&field.name) {
                out.extend(value.object_ids());
            }
        }
        Ok(out)
    }
}

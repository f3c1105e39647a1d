//! Content signatures and duplicate detection.
//!
//! A [`Signature`] is built from ordered maps and sorted sets only, so two
//! objects with the same content produce equal signatures no matter in
//! which order their alternatives or references were written.

use lexkit_model::{FieldDescriptor, FieldKind, FieldValue, ObjectStore, StoreError};
use lexkit_types::{GlobalId, Locale, ObjectId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::registry::FieldTypeRegistry;
use crate::{Error, Result};

/// Which fields feed a signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldSet {
    /// String, multilingual-string and reference fields.
    #[default]
    Default,
    /// [`FieldSet::Default`] plus the deep signatures of owned children.
    Deep,
    /// Exactly these fields. Owned fields contribute deep child signatures.
    Fields(Vec<String>),
}

impl FieldSet {
    fn selects(&self, field: &FieldDescriptor) -> bool {
        if field.is_system {
            return false;
        }
        match self {
            FieldSet::Default => {
                matches!(field.kind, FieldKind::String | FieldKind::MultiString)
                    || field.kind.is_reference()
            }
            FieldSet::Deep => FieldSet::Default.selects(field) || field.kind.is_owned(),
            FieldSet::Fields(names) => names.iter().any(|n| *n == field.name),
        }
    }
}

/// One field's contribution to a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignatureValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    /// Non-empty alternatives by locale.
    Alternatives(BTreeMap<Locale, String>),
    /// Global ids of referenced objects, as a set.
    References(BTreeSet<GlobalId>),
    /// Deep signatures of owned children; sequence order is kept, other
    /// owned kinds are sorted.
    Owned(Vec<Signature>),
}

/// Order-independent content key of one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    type_tag: String,
    values: BTreeMap<String, SignatureValue>,
}

impl Signature {
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn value(&self, field: &str) -> Option<&SignatureValue> {
        self.values.get(field)
    }

    /// Fields that contributed to this signature.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// A set of content duplicates: the first one encountered is kept as the
/// representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub representative: ObjectId,
    pub duplicates: Vec<ObjectId>,
}

/// Computes signatures and groups objects that share one.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector<'r> {
    registry: &'r FieldTypeRegistry,
}

impl<'r> DuplicateDetector<'r> {
    pub fn new(registry: &'r FieldTypeRegistry) -> Self {
        Self { registry }
    }

    /// Signature of `id` over `fields`.
    ///
    /// Fails when the type is unknown, a named field does not exist, or a
    /// value cannot be read.
    pub fn signature(
        &self,
        store: &dyn ObjectStore,
        id: ObjectId,
        fields: &FieldSet,
    ) -> Result<Signature> {
        let type_tag = store.type_tag(id)?;
        let descriptor = self
            .registry
            .describe(&type_tag)
            .ok_or_else(|| Error::UnknownType(type_tag.clone()))?;

        if let FieldSet::Fields(names) = fields
            && let Some(missing) = names.iter().find(|n| descriptor.field(n).is_none())
        {
            return Err(StoreError::UnknownField {
                type_tag,
                field: missing.clone(),
            }
            .into());
        }

        let mut values = BTreeMap::new();
        for field in descriptor.fields.iter().filter(|f| fields.selects(f)) {
            let value = self.field_value(store, id, field)?;
            values.insert(field.name.clone(), value);
        }
        Ok(Signature { type_tag, values })
    }

    fn field_value(
        &self,
        store: &dyn ObjectStore,
        id: ObjectId,
        field: &FieldDescriptor,
    ) -> Result<SignatureValue> {
        let value = store.get(id, &field.name)?;
        let signature_value = match value {
            FieldValue::Bool(b) => SignatureValue::Bool(b),
            FieldValue::Integer(i) => SignatureValue::Integer(i),
            FieldValue::String(s) => SignatureValue::Text(s),
            FieldValue::MultiString(ms) => SignatureValue::Alternatives(
                ms.iter().map(|(l, s)| (l.clone(), s.to_string())).collect(),
            ),
            value if field.kind.is_reference() => SignatureValue::References(
                value
                    .object_ids()
                    .into_iter()
                    .map(|r| store.global_id(r))
                    .collect::<std::result::Result<_, _>>()?,
            ),
            value => {
                let mut children = value
                    .object_ids()
                    .into_iter()
                    .map(|child| self.signature(store, child, &FieldSet::Deep))
                    .collect::<Result<Vec<_>>>()?;
                if !field.kind.is_ordered() {
                    children.sort();
                }
                SignatureValue::Owned(children)
            }
        };
        Ok(signature_value)
    }

    /// Groups `ids` by signature. Only groups with at least one duplicate are
    /// returned, ordered by where their representative appears in `ids`.
    /// Objects whose signature cannot be computed are left out.
    pub fn find_groups(
        &self,
        store: &dyn ObjectStore,
        ids: &[ObjectId],
        fields: &FieldSet,
    ) -> Vec<DuplicateGroup> {
        let mut seen = HashSet::new();
        let mut bucket_of: HashMap<Signature, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let signature = match self.signature(store, id, fields) {
                Ok(signature) => signature,
                Err(e) => {
                    debug!("Leaving {} out of duplicate detection: {}", id, e);
                    continue;
                }
            };
            match bucket_of.get(&signature) {
                Some(&index) => groups[index].duplicates.push(id),
                None => {
                    bucket_of.insert(signature, groups.len());
                    groups.push(DuplicateGroup {
                        representative: id,
                        duplicates: Vec::new(),
                    });
                }
            }
        }

        groups.retain(|g| !g.duplicates.is_empty());
        groups
    }
}

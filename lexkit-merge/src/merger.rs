//! Field-by-field merging of two objects of the same type.
//!
//! Each field kind has one copy rule:
//!
//! | Kind                         | Rule                                              |
//! |------------------------------|---------------------------------------------------|
//! | Boolean                      | `false` becomes `true`, never the reverse          |
//! | Integer                      | copied when the destination is `0`                |
//! | String, MultiString          | filled when empty, joined when [`MergePolicy`] says so |
//! | ReferenceAtomic              | copied when the destination is empty              |
//! | ReferenceCollection/Sequence | missing links appended                            |
//! | Owned*                       | source children deep-cloned into the destination  |
//!
//! The source object is never written.

use lexkit_model::{FieldDescriptor, FieldKind, FieldValue, ObjectStore, StoreError};
use lexkit_types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::registry::FieldTypeRegistry;
use crate::{Error, Result};

/// How conflicting text values are reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MergePolicy {
    /// Join differing non-empty texts instead of keeping the destination's.
    pub preserve_both_values: bool,
    pub separator: String,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            preserve_both_values: false,
            separator: "; ".to_string(),
        }
    }
}

impl MergePolicy {
    /// Policy that keeps both sides of a text conflict.
    pub fn preserving() -> Self {
        Self {
            preserve_both_values: true,
            ..Self::default()
        }
    }

    /// The text `dest` should hold after merging `src` into it, or `None`
    /// when it stays as it is.
    fn combine(&self, dest: &str, src: &str) -> Option<String> {
        if src.is_empty() || dest == src {
            None
        } else if dest.is_empty() {
            Some(src.to_string())
        } else if self.preserve_both_values {
            Some(format!("{dest}{}{src}", self.separator))
        } else {
            None
        }
    }
}

/// A field that could not be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    pub object: ObjectId,
    pub field: String,
    pub reason: String,
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Fields processed without error, cloned children included.
    pub fields_merged: usize,
    /// Objects created by deep-cloning owned children.
    pub objects_created: usize,
    pub skipped: Vec<SkippedField>,
    /// Each deep-cloned source object and the copy made from it.
    pub clones: BTreeMap<ObjectId, ObjectId>,
}

impl MergeReport {
    /// True when no field was skipped.
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Adds the counts and skipped fields of `other`.
    pub fn absorb(&mut self, other: MergeReport) {
        self.fields_merged += other.fields_merged;
        self.objects_created += other.objects_created;
        self.skipped.extend(other.skipped);
        self.clones.extend(other.clones);
    }
}

/// Copies field values from one object into another of the same type.
#[derive(Debug, Clone)]
pub struct PropertyMerger<'r> {
    registry: &'r FieldTypeRegistry,
    policy: MergePolicy,
}

impl<'r> PropertyMerger<'r> {
    pub fn new(registry: &'r FieldTypeRegistry, policy: MergePolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Merges every non-system field of `src` into `dest`.
    ///
    /// A field that fails is recorded in [`MergeReport::skipped`] and the
    /// remaining fields are still merged. Fails outright when the two types
    /// differ, when `dest` lies inside `src`, or when the type is not
    /// registered. Merging an object into itself changes nothing.
    pub fn merge_all(
        &self,
        store: &mut dyn ObjectStore,
        dest: ObjectId,
        src: ObjectId,
    ) -> Result<MergeReport> {
        let mut report = MergeReport::default();
        self.merge_into(store, dest, src, &mut report)?;
        Ok(report)
    }

    fn merge_into(
        &self,
        store: &mut dyn ObjectStore,
        dest: ObjectId,
        src: ObjectId,
        report: &mut MergeReport,
    ) -> Result<()> {
        if dest == src {
            debug!("Skipping merge of {} into itself", dest);
            return Ok(());
        }
        let dest_tag = store.type_tag(dest)?;
        let src_tag = store.type_tag(src)?;
        if dest_tag != src_tag {
            return Err(Error::IncompatibleMerge(format!(
                "cannot merge {src_tag} {src} into {dest_tag} {dest}"
            )));
        }
        // Cloning src's children into one of its own descendants never ends.
        if store.is_owned_by(dest, src)? {
            return Err(Error::IncompatibleMerge(format!("{dest} is owned by {src}")));
        }
        let descriptor = self
            .registry
            .describe(&dest_tag)
            .ok_or_else(|| Error::UnknownType(dest_tag.clone()))?;

        for field in descriptor.mergeable_fields() {
            match self.merge_field(store, dest, src, field, report) {
                Ok(()) => report.fields_merged += 1,
                Err(e) => {
                    warn!(
                        "Skipping {}.{} while merging {} into it: {}",
                        dest, field.name, src, e
                    );
                    report.skipped.push(SkippedField {
                        object: dest,
                        field: field.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Merges one field of `src` into `dest` by its kind.
    pub fn merge_field(
        &self,
        store: &mut dyn ObjectStore,
        dest: ObjectId,
        src: ObjectId,
        field: &FieldDescriptor,
        report: &mut MergeReport,
    ) -> Result<()> {
        if field.is_system {
            return Err(StoreError::SystemField(field.name.clone()).into());
        }
        let name = field.name.as_str();
        let current = store.get(dest, name)?;
        let incoming = store.get(src, name)?;
        let dest_tag = store.type_tag(dest)?;
        let shape_error = || -> Error {
            StoreError::KindMismatch {
                type_tag: dest_tag.clone(),
                field: field.name.clone(),
                expected: field.kind,
            }
            .into()
        };

        match field.kind {
            FieldKind::Boolean => {
                let (d, s) = current
                    .as_bool()
                    .zip(incoming.as_bool())
                    .ok_or_else(shape_error)?;
                if !d && s {
                    store.set(dest, name, FieldValue::Bool(true))?;
                }
            }
            FieldKind::Integer => {
                let (d, s) = current
                    .as_integer()
                    .zip(incoming.as_integer())
                    .ok_or_else(shape_error)?;
                if d == 0 && s > 0 {
                    store.set(dest, name, FieldValue::Integer(s))?;
                }
            }
            FieldKind::String => {
                let (d, s) = current
                    .as_str()
                    .zip(incoming.as_str())
                    .ok_or_else(shape_error)?;
                if let Some(merged) = self.policy.combine(d, s) {
                    store.set(dest, name, FieldValue::String(merged))?;
                }
            }
            FieldKind::MultiString => {
                let (d, s) = current
                    .as_multi_string()
                    .zip(incoming.as_multi_string())
                    .ok_or_else(shape_error)?;
                let mut merged = d.clone();
                let mut changed = false;
                for locale in store.locales() {
                    if let Some(text) = self.policy.combine(d.get(&locale), s.get(&locale)) {
                        merged.set(locale, text);
                        changed = true;
                    }
                }
                if changed {
                    store.set(dest, name, FieldValue::MultiString(merged))?;
                }
            }
            FieldKind::ReferenceAtomic => {
                if current.is_empty()
                    && let Some(target) = incoming.as_object()
                {
                    store.set(dest, name, FieldValue::Object(Some(target)))?;
                }
            }
            FieldKind::ReferenceCollection | FieldKind::ReferenceSequence => {
                let mut links = current.as_objects().ok_or_else(shape_error)?.to_vec();
                let before = links.len();
                for target in incoming.object_ids() {
                    if !links.contains(&target) {
                        links.push(target);
                    }
                }
                if links.len() != before {
                    store.set(dest, name, FieldValue::Objects(links))?;
                }
            }
            FieldKind::OwnedAtomic => {
                if current.is_empty()
                    && let Some(child) = incoming.as_object()
                {
                    self.clone_child(store, dest, field, child, report)?;
                }
            }
            FieldKind::OwnedCollection | FieldKind::OwnedSequence => {
                let existing = current.object_ids();
                for child in incoming.object_ids() {
                    if !existing.contains(&child) {
                        self.clone_child(store, dest, field, child, report)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Creates a copy of `child` owned by `owner.field` and merges `child`
    /// into it.
    fn clone_child(
        &self,
        store: &mut dyn ObjectStore,
        owner: ObjectId,
        field: &FieldDescriptor,
        child: ObjectId,
        report: &mut MergeReport,
    ) -> Result<()> {
        let type_tag = store.type_tag(child)?;
        let copy = store.create(&type_tag, Some((owner, field.name.as_str())))?;
        report.objects_created += 1;
        report.clones.insert(child, copy);
        debug!("Cloned {} {} into {}.{} as {}", type_tag, child, owner, field.name, copy);
        self.merge_into(store, copy, child, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_fills_empty_destination() {
        let policy = MergePolicy::default();
        assert_eq!(policy.combine("", "bar"), Some("bar".to_string()));
        assert_eq!(policy.combine("foo", ""), None);
        assert_eq!(policy.combine("", ""), None);
    }

    #[test]
    fn combine_keeps_destination_without_preserve() {
        assert_eq!(MergePolicy::default().combine("foo", "bar"), None);
    }

    #[test]
    fn combine_joins_with_separator() {
        let policy = MergePolicy {
            preserve_both_values: true,
            separator: " | ".to_string(),
        };
        assert_eq!(policy.combine("foo", "bar"), Some("foo | bar".to_string()));
        assert_eq!(policy.combine("foo", "foo"), None);
    }

    #[test]
    fn report_absorb_sums_counts() {
        let mut report = MergeReport {
            fields_merged: 2,
            objects_created: 1,
            clones: BTreeMap::from([(ObjectId::new(7), ObjectId::new(9))]),
            ..MergeReport::default()
        };
        report.absorb(MergeReport {
            fields_merged: 3,
            skipped: vec![SkippedField {
                object: ObjectId::new(4),
                field: "Gloss".to_string(),
                reason: "boom".to_string(),
            }],
            ..MergeReport::default()
        });
        assert_eq!(report.fields_merged, 5);
        assert_eq!(report.objects_created, 1);
        assert_eq!(report.clones.get(&ObjectId::new(7)), Some(&ObjectId::new(9)));
        assert!(!report.is_lossless());
    }
}

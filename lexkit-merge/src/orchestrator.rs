//! Merging one object into another and deleting it.
//!
//! [`MergeOrchestrator::merge`] runs the stages of [`MergeStage`] in order.
//! It does not open a unit of work: a failing stage leaves the earlier
//! stages applied, so callers wrap the call in the store's own unit of
//! work (`MemoryStore::unit_of_work` for the in-memory store).
//!
//! Owned children of the victim survive as the deep copies the property
//! merge makes of them, and links to the originals follow those copies. A
//! link that still points into the victim's subtree when it is deleted is
//! recorded in [`MergeReport::skipped`].

use lexkit_model::{FieldKind, FieldValue, ObjectStore};
use lexkit_types::ObjectId;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::merger::{MergePolicy, MergeReport, PropertyMerger, SkippedField};
use crate::registry::FieldTypeRegistry;
use crate::settings::MergeSettings;
use crate::signature::{DuplicateDetector, FieldSet};
use crate::{Error, Result};

/// Merge progress, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeStage {
    Validated,
    ReferencesRewired,
    CircularityRemoved,
    PropertiesMerged,
    IncomingReferencesRepointed,
    VictimDeleted,
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStage::Validated => "validated",
            MergeStage::ReferencesRewired => "references rewired",
            MergeStage::CircularityRemoved => "circularity removed",
            MergeStage::PropertiesMerged => "properties merged",
            MergeStage::IncomingReferencesRepointed => "incoming references repointed",
            MergeStage::VictimDeleted => "victim deleted",
        };
        f.write_str(name)
    }
}

/// Result of a completed merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub survivor: ObjectId,
    pub victim: ObjectId,
    /// Last stage completed; [`MergeStage::VictimDeleted`] on success.
    pub stage: MergeStage,
    pub report: MergeReport,
    /// Reference fields whose victim entry was swapped for the survivor.
    pub rewired: usize,
    /// References to the survivor dropped from inside the victim.
    pub dropped_circular: usize,
    /// Reference fields redirected after the property merge, to the
    /// survivor or to copies of the victim's children.
    pub repointed: usize,
    /// Duplicate owned objects deleted after the merge.
    pub removed_duplicates: usize,
}

impl MergeOutcome {
    fn new(survivor: ObjectId, victim: ObjectId) -> Self {
        Self {
            survivor,
            victim,
            stage: MergeStage::Validated,
            report: MergeReport::default(),
            rewired: 0,
            dropped_circular: 0,
            repointed: 0,
            removed_duplicates: 0,
        }
    }
}

/// Which reference kinds a redirect touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkScope {
    Multi,
    All,
}

impl LinkScope {
    fn covers(self, kind: FieldKind) -> bool {
        match self {
            LinkScope::Multi => {
                matches!(kind, FieldKind::ReferenceCollection | FieldKind::ReferenceSequence)
            }
            LinkScope::All => kind.is_reference(),
        }
    }
}

/// Runs "merge the victim into the survivor, then delete the victim".
#[derive(Debug, Clone)]
pub struct MergeOrchestrator<'r> {
    registry: &'r FieldTypeRegistry,
    policy: MergePolicy,
    dedup_fields: FieldSet,
    deduplicate: bool,
}

impl<'r> MergeOrchestrator<'r> {
    pub fn new(registry: &'r FieldTypeRegistry, policy: MergePolicy) -> Self {
        Self {
            registry,
            policy,
            dedup_fields: FieldSet::Deep,
            deduplicate: true,
        }
    }

    pub fn from_settings(registry: &'r FieldTypeRegistry, settings: &MergeSettings) -> Self {
        Self {
            registry,
            policy: settings.policy(),
            dedup_fields: settings.field_set(),
            deduplicate: settings.merge.deduplicate,
        }
    }

    /// Fields compared when deduplicating owned children.
    #[must_use]
    pub fn with_dedup_fields(mut self, fields: FieldSet) -> Self {
        self.dedup_fields = fields;
        self
    }

    /// Leaves duplicate owned children in place after [`merge`](Self::merge).
    #[must_use]
    pub fn without_deduplication(mut self) -> Self {
        self.deduplicate = false;
        self
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    pub fn deduplicates(&self) -> bool {
        self.deduplicate
    }

    /// Merges `victim` into `survivor` and deletes `victim`, then removes
    /// duplicates among the survivor's owned objects unless deduplication
    /// was turned off.
    pub fn merge(
        &self,
        store: &mut dyn ObjectStore,
        survivor: ObjectId,
        victim: ObjectId,
    ) -> Result<MergeOutcome> {
        self.merge_objects(store, survivor, victim, self.deduplicate)
    }

    /// Like [`merge`](Self::merge), but deduplicates even when
    /// [`without_deduplication`](Self::without_deduplication) turned it off.
    pub fn merge_with_deduplication(
        &self,
        store: &mut dyn ObjectStore,
        survivor: ObjectId,
        victim: ObjectId,
    ) -> Result<MergeOutcome> {
        self.merge_objects(store, survivor, victim, true)
    }

    fn merge_objects(
        &self,
        store: &mut dyn ObjectStore,
        survivor: ObjectId,
        victim: ObjectId,
        deduplicate: bool,
    ) -> Result<MergeOutcome> {
        let mut reached = None;
        match self.run_stages(store, survivor, victim, deduplicate, &mut reached) {
            Ok(outcome) => {
                info!(
                    "Merged {} into {}: {} fields, {} objects cloned, {} skipped, {} duplicates removed",
                    victim,
                    survivor,
                    outcome.report.fields_merged,
                    outcome.report.objects_created,
                    outcome.report.skipped.len(),
                    outcome.removed_duplicates
                );
                Ok(outcome)
            }
            Err(e) => {
                match reached {
                    Some(stage) => warn!(
                        "Merge of {} into {} aborted after stage '{}': {}",
                        victim, survivor, stage, e
                    ),
                    None => warn!("Merge of {} into {} rejected: {}", victim, survivor, e),
                }
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        store: &mut dyn ObjectStore,
        survivor: ObjectId,
        victim: ObjectId,
        deduplicate: bool,
        reached: &mut Option<MergeStage>,
    ) -> Result<MergeOutcome> {
        let mut outcome = MergeOutcome::new(survivor, victim);
        let mut advance = |outcome: &mut MergeOutcome, stage: MergeStage| {
            debug!("Merge {} -> {}: {}", victim, survivor, stage);
            outcome.stage = stage;
            *reached = Some(stage);
        };

        self.validate(store, survivor, victim)?;
        advance(&mut outcome, MergeStage::Validated);

        let mut victim_tree: HashSet<ObjectId> = store.owned_subtree(victim)?.into_iter().collect();
        victim_tree.insert(victim);

        outcome.rewired =
            self.redirect(store, victim, survivor, &victim_tree, LinkScope::Multi, true)?;
        advance(&mut outcome, MergeStage::ReferencesRewired);

        outcome.dropped_circular = self.drop_links_to(store, survivor, &victim_tree)?;
        advance(&mut outcome, MergeStage::CircularityRemoved);

        let merger = PropertyMerger::new(self.registry, self.policy.clone());
        outcome.report = merger.merge_all(store, survivor, victim)?;
        advance(&mut outcome, MergeStage::PropertiesMerged);

        outcome.repointed =
            self.redirect(store, victim, survivor, &victim_tree, LinkScope::All, true)?;
        let clones: Vec<(ObjectId, ObjectId)> =
            outcome.report.clones.iter().map(|(&from, &to)| (from, to)).collect();
        for (original, copy) in clones {
            outcome.repointed +=
                self.redirect(store, original, copy, &victim_tree, LinkScope::All, false)?;
        }
        advance(&mut outcome, MergeStage::IncomingReferencesRepointed);

        self.record_stranded_links(&*store, victim, &victim_tree, &mut outcome.report)?;
        store.delete(victim)?;
        advance(&mut outcome, MergeStage::VictimDeleted);

        if deduplicate {
            outcome.removed_duplicates =
                self.remove_duplicates(store, survivor, &mut outcome.report)?;
        }
        Ok(outcome)
    }

    fn validate(
        &self,
        store: &dyn ObjectStore,
        survivor: ObjectId,
        victim: ObjectId,
    ) -> Result<()> {
        let incompatible = |reason: String| Err(Error::IncompatibleMerge(reason));

        for id in [survivor, victim] {
            if !store.contains(id) {
                return incompatible(format!("{id} does not exist"));
            }
        }
        if survivor == victim {
            return incompatible(format!("{survivor} cannot be merged into itself"));
        }
        let survivor_tag = store.type_tag(survivor)?;
        let victim_tag = store.type_tag(victim)?;
        if survivor_tag != victim_tag {
            return incompatible(format!(
                "{victim} is a {victim_tag} but {survivor} is a {survivor_tag}"
            ));
        }
        if self.registry.describe(&survivor_tag).is_none() {
            return Err(Error::UnknownType(survivor_tag));
        }
        if store.is_owned_by(survivor, victim)? {
            return incompatible(format!(
                "{survivor} is owned by {victim} and would be deleted with it"
            ));
        }
        Ok(())
    }

    /// Replaces `from` with `to` in the reference fields of every object
    /// outside `skip`. A holder that already links to `to` loses the `from`
    /// entry instead, as does `to` itself when `drop_self` is set. Returns
    /// the number of fields changed.
    fn redirect(
        &self,
        store: &mut dyn ObjectStore,
        from: ObjectId,
        to: ObjectId,
        skip: &HashSet<ObjectId>,
        scope: LinkScope,
        drop_self: bool,
    ) -> Result<usize> {
        let self_link = |holder: ObjectId| drop_self && holder == to;
        let mut changed = 0;
        for holder in store.object_ids() {
            if skip.contains(&holder) {
                continue;
            }
            let type_tag = store.type_tag(holder)?;
            let Some(descriptor) = self.registry.describe(&type_tag) else {
                debug!("Not redirecting links held by unregistered {} {}", type_tag, holder);
                continue;
            };
            for field in descriptor.reference_fields().filter(|f| scope.covers(f.kind)) {
                let value = store.get(holder, &field.name)?;
                let replacement = match &value {
                    FieldValue::Object(Some(target)) if *target == from => {
                        FieldValue::Object((!self_link(holder)).then_some(to))
                    }
                    FieldValue::Objects(ids) if ids.contains(&from) => {
                        FieldValue::Objects(replace_link(ids, from, to, self_link(holder)))
                    }
                    _ => continue,
                };
                store.set(holder, &field.name, replacement)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Removes every link to `target` held inside `holders`. Returns the
    /// number of links dropped.
    fn drop_links_to(
        &self,
        store: &mut dyn ObjectStore,
        target: ObjectId,
        holders: &HashSet<ObjectId>,
    ) -> Result<usize> {
        let mut dropped = 0;
        let mut holders: Vec<ObjectId> = holders.iter().copied().collect();
        holders.sort();
        for holder in holders {
            let type_tag = store.type_tag(holder)?;
            let Some(descriptor) = self.registry.describe(&type_tag) else {
                continue;
            };
            for field in descriptor.reference_fields() {
                let value = store.get(holder, &field.name)?;
                let (replacement, count) = match value {
                    FieldValue::Object(Some(t)) if t == target => (FieldValue::Object(None), 1),
                    FieldValue::Objects(ids) if ids.contains(&target) => {
                        let kept: Vec<ObjectId> =
                            ids.iter().copied().filter(|i| *i != target).collect();
                        let count = ids.len() - kept.len();
                        (FieldValue::Objects(kept), count)
                    }
                    _ => continue,
                };
                store.set(holder, &field.name, replacement)?;
                dropped += count;
            }
        }
        Ok(dropped)
    }

    /// Records every link from outside `tree` into it, other than links to
    /// `removed` itself, as a skipped field. These are the links the store
    /// drops when it deletes `removed`.
    fn record_stranded_links(
        &self,
        store: &dyn ObjectStore,
        removed: ObjectId,
        tree: &HashSet<ObjectId>,
        report: &mut MergeReport,
    ) -> Result<()> {
        for holder in store.object_ids() {
            if tree.contains(&holder) {
                continue;
            }
            let type_tag = store.type_tag(holder)?;
            let Some(descriptor) = self.registry.describe(&type_tag) else {
                continue;
            };
            for field in descriptor.reference_fields() {
                for target in store.get(holder, &field.name)?.object_ids() {
                    if target == removed || !tree.contains(&target) {
                        continue;
                    }
                    warn!(
                        "Link {}.{} -> {} is lost with {}",
                        holder, field.name, target, removed
                    );
                    report.skipped.push(SkippedField {
                        object: holder,
                        field: field.name.clone(),
                        reason: format!("link to {target} is removed with {removed}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Deletes duplicates among the objects owned (transitively) by `root`,
    /// innermost owners first. Within each owned collection or sequence the
    /// first of each duplicate group is kept and links to the others are
    /// redirected to it. Returns the number of objects deleted.
    pub fn deduplicate_owned(&self, store: &mut dyn ObjectStore, root: ObjectId) -> Result<usize> {
        self.remove_duplicates(store, root, &mut MergeReport::default())
    }

    fn remove_duplicates(
        &self,
        store: &mut dyn ObjectStore,
        root: ObjectId,
        report: &mut MergeReport,
    ) -> Result<usize> {
        let detector = DuplicateDetector::new(self.registry);
        let mut owners = store.owned_subtree(root)?;
        owners.reverse();
        owners.push(root);

        let mut removed = 0;
        for owner in owners {
            if !store.contains(owner) {
                continue;
            }
            let type_tag = store.type_tag(owner)?;
            let Some(descriptor) = self.registry.describe(&type_tag) else {
                continue;
            };
            let fields = descriptor.owned_fields().filter(|f| {
                matches!(f.kind, FieldKind::OwnedCollection | FieldKind::OwnedSequence)
            });
            for field in fields {
                let children = store.get(owner, &field.name)?.object_ids();
                for group in detector.find_groups(store, &children, &self.dedup_fields) {
                    for duplicate in group.duplicates {
                        let mut tree: HashSet<ObjectId> =
                            store.owned_subtree(duplicate)?.into_iter().collect();
                        tree.insert(duplicate);
                        self.redirect(
                            store,
                            duplicate,
                            group.representative,
                            &tree,
                            LinkScope::All,
                            true,
                        )?;
                        self.record_stranded_links(&*store, duplicate, &tree, report)?;
                        store.delete(duplicate)?;
                        removed += 1;
                    }
                }
            }
        }

        if removed > 0 {
            info!("Removed {} duplicate objects under {}", removed, root);
        }
        Ok(removed)
    }
}

/// `ids` with `from` replaced by `to` at its first position. Later
/// occurrences of `from` are removed, as is the first one when `to` is
/// already present or `drop` is set.
fn replace_link(ids: &[ObjectId], from: ObjectId, to: ObjectId, drop: bool) -> Vec<ObjectId> {
    let mut place = !drop && !ids.contains(&to);
    ids.iter()
        .filter_map(|&id| {
            if id != from {
                Some(id)
            } else if place {
                place = false;
                Some(to)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<ObjectId> {
        raw.iter().map(|n| ObjectId::new(*n)).collect()
    }

    #[test]
    fn replace_link_keeps_position() {
        let out = replace_link(&ids(&[3, 7, 9]), ObjectId::new(7), ObjectId::new(2), false);
        assert_eq!(out, ids(&[3, 2, 9]));
    }

    #[test]
    fn replace_link_drops_when_target_present() {
        let out = replace_link(&ids(&[2, 7, 9]), ObjectId::new(7), ObjectId::new(2), false);
        assert_eq!(out, ids(&[2, 9]));
    }

    #[test]
    fn replace_link_drops_repeats() {
        let out = replace_link(&ids(&[7, 1, 7]), ObjectId::new(7), ObjectId::new(2), false);
        assert_eq!(out, ids(&[2, 1]));
    }

    #[test]
    fn replace_link_drop_flag() {
        let out = replace_link(&ids(&[1, 7]), ObjectId::new(7), ObjectId::new(2), true);
        assert_eq!(out, ids(&[1]));
    }

    #[test]
    fn stages_are_ordered() {
        assert!(MergeStage::Validated < MergeStage::ReferencesRewired);
        assert!(MergeStage::IncomingReferencesRepointed < MergeStage::VictimDeleted);
        assert_eq!(MergeStage::PropertiesMerged.to_string(), "properties merged");
    }
}

use lexkit_types::{GlobalId, Locale, ObjectId};

use crate::{FieldValue, StoreResult};

/// Where an object lives: its owner and the owned field holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: ObjectId,
    pub field: String,
}

/// The contract an external linguistic-data object store fulfils.
///
/// Mutating calls are expected to run inside whatever unit of work the
/// store requires; opening and closing that scope is the caller's job.
/// Implementations validate values against their field metadata and keep
/// ownership consistent (an object has at most one owner, deleting an
/// owner deletes what it owns).
pub trait ObjectStore {
    /// Every writing system registered with the store.
    fn locales(&self) -> Vec<Locale>;

    /// Handles of all live objects, in ascending order.
    fn object_ids(&self) -> Vec<ObjectId>;

    fn contains(&self, id: ObjectId) -> bool;

    /// The runtime type tag of `id`.
    fn type_tag(&self, id: ObjectId) -> StoreResult<String>;

    fn global_id(&self, id: ObjectId) -> StoreResult<GlobalId>;

    /// The owner of `id`, or `None` for roots.
    fn owner(&self, id: ObjectId) -> StoreResult<Option<Ownership>>;

    fn find_by_global_id(&self, global_id: GlobalId) -> Option<ObjectId>;

    /// Reads a field. System fields are readable too.
    fn get(&self, id: ObjectId, field: &str) -> StoreResult<FieldValue>;

    /// Writes a field. For owned fields only removal and reordering of the
    /// current children are accepted; removed children are deleted.
    fn set(&mut self, id: ObjectId, field: &str, value: FieldValue) -> StoreResult<()>;

    /// Creates an empty object of `type_tag`. With an owner, the new object
    /// is placed in (or appended to) the owner's owned field.
    fn create(&mut self, type_tag: &str, owner: Option<(ObjectId, &str)>) -> StoreResult<ObjectId>;

    /// Deletes `id` together with everything it owns, detaches it from its
    /// owner and removes every reference to the deleted objects.
    fn delete(&mut self, id: ObjectId) -> StoreResult<()>;

    /// Objects directly owned by `id`, in field declaration order.
    fn children(&self, id: ObjectId) -> StoreResult<Vec<ObjectId>>;

    /// Every object transitively owned by `id` (excluding `id`), parents
    /// before their children.
    fn owned_subtree(&self, id: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let mut out = Vec::new();
        let mut stack = self.children(id)?;
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut kids = self.children(next)?;
            kids.reverse();
            stack.extend(kids);
        }
        Ok(out)
    }

    /// True when `ancestor` transitively owns `id`.
    fn is_owned_by(&self, id: ObjectId, ancestor: ObjectId) -> StoreResult<bool> {
        let mut current = self.owner(id)?;
        while let Some(ownership) = current {
            if ownership.owner == ancestor {
                return Ok(true);
            }
            current = self.owner(ownership.owner)?;
        }
        Ok(false)
    }
}

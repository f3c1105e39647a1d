//! Uniform access to objects of any runtime type.

use lexkit_model::{FieldValue, ObjectStore};
use lexkit_types::{GlobalId, ObjectId};

use crate::resolve::{Concrete, ConcreteResolver, HasCommonFields, ObjectRef};
use crate::{Error, Result};

/// Holds an object's supertype handle next to its resolved view and answers
/// member lookups from the most specific one that has the member.
///
/// Both halves are snapshots taken at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectWrapper {
    original: ObjectRef,
    concrete: Concrete,
}

impl ObjectWrapper {
    /// Wraps `id` using the process-wide registry.
    pub fn new(store: &dyn ObjectStore, id: ObjectId) -> Result<Self> {
        Self::with_resolver(store, id, &ConcreteResolver::global())
    }

    pub fn with_resolver(
        store: &dyn ObjectStore,
        id: ObjectId,
        resolver: &ConcreteResolver<'_>,
    ) -> Result<Self> {
        let original = ObjectRef::load(store, id)?;
        Ok(Self::from_ref(store, original, resolver))
    }

    /// Wraps an already loaded supertype handle.
    pub fn from_ref(
        store: &dyn ObjectStore,
        original: ObjectRef,
        resolver: &ConcreteResolver<'_>,
    ) -> Self {
        let concrete = resolver.resolve(store, &original);
        Self { original, concrete }
    }

    /// Looks `name` up on the resolved view first, then on the supertype.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        self.concrete
            .resolved()
            .and_then(|r| r.view().specific_field(name))
            .or_else(|| self.original.common_field(name))
            .ok_or_else(|| Error::MissingMember {
                type_tag: self.original.type_tag().to_string(),
                member: name.to_string(),
            })
    }

    /// Like [`ObjectWrapper::get`], returning `default` for a missing member.
    pub fn get_or_default(&self, name: &str, default: FieldValue) -> FieldValue {
        self.get(name).unwrap_or(default)
    }

    /// True when `get(name)` would succeed.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Runtime type tag of the wrapped object.
    pub fn type_tag(&self) -> &str {
        self.original.type_tag()
    }

    pub fn id(&self) -> ObjectId {
        self.original.id()
    }

    pub fn global_id(&self) -> GlobalId {
        self.original.global_id()
    }

    pub fn original(&self) -> &ObjectRef {
        &self.original
    }

    pub fn concrete(&self) -> &Concrete {
        &self.concrete
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.concrete.is_resolved()
    }

    /// The resolved view's label, or the type tag for unresolved objects.
    pub fn short_name(&self) -> &str {
        match self.concrete.resolved() {
            Some(r) => r.view().short_name(),
            None => self.original.type_tag(),
        }
    }
}

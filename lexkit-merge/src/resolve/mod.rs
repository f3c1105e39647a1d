//! Concrete type resolution.
//!
//! Collections in a store hand out members as the common supertype
//! ([`ObjectRef`]). [`ConcreteResolver`] turns such a handle into a
//! [`Concrete`] value: one of the typed [`Resolved`] views when the runtime
//! type tag (or its nearest registered base) has one, or
//! [`Concrete::Unknown`] carrying the raw handle otherwise.
//!
//! [`ConcreteResolver::try_resolve`] reports why resolution failed;
//! [`ConcreteResolver::resolve`] never fails and degrades to `Unknown`.

mod views;

pub use views::{
    Allomorph, ExampleSentence, LexEntry, LexSense, NotebookRecord, PartOfSpeech, Phoneme,
    Possibility,
};

use lexkit_model::{FieldValue, ObjectStore, Ownership, StoreResult};
use lexkit_types::{GlobalId, ObjectId};
use std::fmt;
use tracing::debug;

use crate::registry::FieldTypeRegistry;

/// The declared-supertype view of an object: identity and ownership only.
///
/// A snapshot; it does not follow later changes in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    id: ObjectId,
    global_id: GlobalId,
    type_tag: String,
    owner: Option<Ownership>,
}

impl ObjectRef {
    /// Reads the common fields of `id`.
    pub fn load(store: &dyn ObjectStore, id: ObjectId) -> StoreResult<Self> {
        Ok(Self {
            id,
            global_id: store.global_id(id)?,
            type_tag: store.type_tag(id)?,
            owner: store.owner(id)?,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn global_id(&self) -> GlobalId {
        self.global_id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn owner(&self) -> Option<&Ownership> {
        self.owner.as_ref()
    }
}

/// Members every object exposes through its supertype.
pub trait HasCommonFields {
    fn object_ref(&self) -> &ObjectRef;

    /// `Id`, `Guid`, `ClassName`, `Owner`, `OwningField` and a generic
    /// `ShortName` (the type tag).
    fn common_field(&self, name: &str) -> Option<FieldValue> {
        let r = self.object_ref();
        let value = match name {
            "Id" => FieldValue::Integer(i64::from(r.id.get())),
            "Guid" => FieldValue::String(r.global_id.to_string()),
            "ClassName" => FieldValue::String(r.type_tag.clone()),
            "Owner" => FieldValue::Object(r.owner.as_ref().map(|o| o.owner)),
            "OwningField" => FieldValue::String(
                r.owner.as_ref().map(|o| o.field.clone()).unwrap_or_default(),
            ),
            "ShortName" => FieldValue::String(r.type_tag.clone()),
            _ => return None,
        };
        Some(value)
    }
}

impl HasCommonFields for ObjectRef {
    fn object_ref(&self) -> &ObjectRef {
        self
    }
}

/// Members only a resolved, type-specific view exposes.
pub trait HasSpecificFields: HasCommonFields {
    /// The member named `name`, if this view has it.
    fn specific_field(&self, name: &str) -> Option<FieldValue>;

    /// Names [`HasSpecificFields::specific_field`] answers for.
    fn specific_field_names(&self) -> &'static [&'static str];

    /// Human-readable label (headword, gloss, name, ...).
    fn short_name(&self) -> &str;
}

/// A typed view of an object whose runtime type has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    LexEntry(LexEntry),
    LexSense(LexSense),
    ExampleSentence(ExampleSentence),
    Allomorph(Allomorph),
    PartOfSpeech(PartOfSpeech),
    Possibility(Possibility),
    Phoneme(Phoneme),
    NotebookRecord(NotebookRecord),
}

impl Resolved {
    /// The view as its capability interface.
    pub fn view(&self) -> &dyn HasSpecificFields {
        match self {
            Resolved::LexEntry(v) => v,
            Resolved::LexSense(v) => v,
            Resolved::ExampleSentence(v) => v,
            Resolved::Allomorph(v) => v,
            Resolved::PartOfSpeech(v) => v,
            Resolved::Possibility(v) => v,
            Resolved::Phoneme(v) => v,
            Resolved::NotebookRecord(v) => v,
        }
    }

    pub fn handle(&self) -> &ObjectRef {
        self.view().object_ref()
    }
}

/// Either a typed view or the raw supertype handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Concrete {
    Resolved(Resolved),
    Unknown(ObjectRef),
}

impl Concrete {
    /// The supertype handle, whichever variant this is.
    pub fn handle(&self) -> &ObjectRef {
        match self {
            Concrete::Resolved(r) => r.handle(),
            Concrete::Unknown(h) => h,
        }
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        match self {
            Concrete::Resolved(r) => Some(r),
            Concrete::Unknown(_) => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Concrete::Resolved(_))
    }
}

/// Why a handle could not be given a typed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The registry has no descriptor for the type tag (or no metadata at all).
    UnknownType,
    /// The type is registered but neither it nor a base has a typed view.
    NoTypedView,
    /// Reading the type-specific fields failed.
    Load(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::UnknownType => f.write_str("unknown type"),
            UnresolvedReason::NoTypedView => f.write_str("no typed view"),
            UnresolvedReason::Load(e) => write!(f, "load failed: {e}"),
        }
    }
}

/// A failed resolution, carrying the original handle back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub handle: ObjectRef,
    pub reason: UnresolvedReason,
}

/// Resolves supertype handles against a [`FieldTypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ConcreteResolver<'r> {
    registry: &'r FieldTypeRegistry,
}

impl ConcreteResolver<'static> {
    /// Resolver over the process-wide registry.
    pub fn global() -> Self {
        Self::new(FieldTypeRegistry::global())
    }
}

impl<'r> ConcreteResolver<'r> {
    pub fn new(registry: &'r FieldTypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r FieldTypeRegistry {
        self.registry
    }

    /// Resolves `handle`, reporting why when no typed view applies.
    pub fn try_resolve(
        &self,
        store: &dyn ObjectStore,
        handle: &ObjectRef,
    ) -> Result<Resolved, Unresolved> {
        let unresolved = |reason| Unresolved {
            handle: handle.clone(),
            reason,
        };

        let mut descriptor = self
            .registry
            .describe(handle.type_tag())
            .ok_or_else(|| unresolved(UnresolvedReason::UnknownType))?;

        // Walk towards the root until some type in the chain has a view.
        loop {
            if let Some(result) = views::load_view(&descriptor.type_tag, store, handle) {
                return result.map_err(|e| unresolved(UnresolvedReason::Load(e.to_string())));
            }
            descriptor = descriptor
                .base
                .as_deref()
                .and_then(|base| self.registry.describe(base))
                .ok_or_else(|| unresolved(UnresolvedReason::NoTypedView))?;
        }
    }

    /// Resolves `handle`, falling back to [`Concrete::Unknown`].
    pub fn resolve(&self, store: &dyn ObjectStore, handle: &ObjectRef) -> Concrete {
        match self.try_resolve(store, handle) {
            Ok(resolved) => Concrete::Resolved(resolved),
            Err(Unresolved { handle, reason }) => {
                debug!(
                    "Passing {} {} through unresolved: {}",
                    handle.type_tag(),
                    handle.id(),
                    reason
                );
                Concrete::Unknown(handle)
            }
        }
    }

    /// Loads the supertype handle of `id` and resolves it.
    pub fn resolve_id(&self, store: &dyn ObjectStore, id: ObjectId) -> StoreResult<Concrete> {
        let handle = ObjectRef::load(store, id)?;
        Ok(self.resolve(store, &handle))
    }
}

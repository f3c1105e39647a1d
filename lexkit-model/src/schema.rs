use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the fields every object carries. They are maintained by the
/// store and never copied during a merge.
pub const SYSTEM_FIELDS: [&str; 5] = ["Id", "Guid", "ClassName", "Owner", "OwningField"];

/// The category of a field. The kind alone decides how a value is copied
/// when one object is merged into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Boolean,
    Integer,
    String,
    MultiString,
    OwnedAtomic,
    ReferenceAtomic,
    OwnedCollection,
    ReferenceCollection,
    OwnedSequence,
    ReferenceSequence,
}

impl FieldKind {
    /// All ten kinds, in declaration order.
    pub const ALL: [FieldKind; 10] = [
        FieldKind::Boolean,
        FieldKind::Integer,
        FieldKind::String,
        FieldKind::MultiString,
        FieldKind::OwnedAtomic,
        FieldKind::ReferenceAtomic,
        FieldKind::OwnedCollection,
        FieldKind::ReferenceCollection,
        FieldKind::OwnedSequence,
        FieldKind::ReferenceSequence,
    ];

    /// True for the kinds whose referents are owned by the holder.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(
            self,
            FieldKind::OwnedAtomic | FieldKind::OwnedCollection | FieldKind::OwnedSequence
        )
    }

    /// True for the non-owning link kinds.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            FieldKind::ReferenceAtomic
                | FieldKind::ReferenceCollection
                | FieldKind::ReferenceSequence
        )
    }

    /// True for the kinds that hold object handles rather than plain data.
    #[must_use]
    pub const fn is_object(self) -> bool {
        self.is_owned() || self.is_reference()
    }

    /// True for kinds that hold a list of handles (collections and sequences).
    #[must_use]
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            FieldKind::OwnedCollection
                | FieldKind::ReferenceCollection
                | FieldKind::OwnedSequence
                | FieldKind::ReferenceSequence
        )
    }

    /// True for sequences, whose element order is significant.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(self, FieldKind::OwnedSequence | FieldKind::ReferenceSequence)
    }

    /// True for kinds holding plain data (booleans, integers, strings).
    #[must_use]
    pub const fn is_basic(self) -> bool {
        !self.is_object()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::String => "string",
            FieldKind::MultiString => "multilingual string",
            FieldKind::OwnedAtomic => "owned atomic",
            FieldKind::ReferenceAtomic => "reference atomic",
            FieldKind::OwnedCollection => "owned collection",
            FieldKind::ReferenceCollection => "reference collection",
            FieldKind::OwnedSequence => "owned sequence",
            FieldKind::ReferenceSequence => "reference sequence",
        };
        f.write_str(name)
    }
}

/// Describes one named field of a runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Store-maintained field (id, type tag, global id, owner).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_system: bool,
    /// Expected referent type for object-valued fields. Subtypes of the
    /// target are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl FieldDescriptor {
    fn simple(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_system: false,
            target: None,
        }
    }

    fn linked(name: &str, kind: FieldKind, target: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            is_system: false,
            target: Some(target.into()),
        }
    }

    /// A store-maintained field.
    pub fn system(name: &str, kind: FieldKind) -> Self {
        Self {
            is_system: true,
            ..Self::simple(name, kind)
        }
    }

    pub fn boolean(name: &str) -> Self {
        Self::simple(name, FieldKind::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::simple(name, FieldKind::Integer)
    }

    pub fn string(name: &str) -> Self {
        Self::simple(name, FieldKind::String)
    }

    pub fn multi_string(name: &str) -> Self {
        Self::simple(name, FieldKind::MultiString)
    }

    pub fn owned_atomic(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::OwnedAtomic, target)
    }

    pub fn reference_atomic(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::ReferenceAtomic, target)
    }

    pub fn owned_collection(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::OwnedCollection, target)
    }

    pub fn reference_collection(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::ReferenceCollection, target)
    }

    pub fn owned_sequence(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::OwnedSequence, target)
    }

    pub fn reference_sequence(name: &str, target: &str) -> Self {
        Self::linked(name, FieldKind::ReferenceSequence, target)
    }
}

/// Field metadata for one runtime type.
///
/// `fields` holds only the fields the type declares itself; inherited
/// fields are folded in by [`crate::SchemaCatalog::flattened`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// A concrete type deriving from `base`.
    pub fn new(type_tag: &str, base: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_tag: type_tag.into(),
            base: Some(base.into()),
            is_abstract: false,
            fields,
        }
    }

    /// An abstract type deriving from `base`.
    pub fn abstract_type(type_tag: &str, base: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(type_tag, base, fields)
        }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that take part in merging, in declaration order.
    pub fn mergeable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_system)
    }

    /// Owned fields, in declaration order.
    pub fn owned_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.kind.is_owned() && !f.is_system)
    }

    /// Reference fields, in declaration order. Excludes the system `Owner`
    /// back-link.
    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.kind.is_reference() && !f.is_system)
    }
}

//! Error types for object store and metadata access.

use lexkit_types::ObjectId;
use thiserror::Error;

use crate::FieldKind;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to an object store or loading
/// field metadata.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live object has this handle.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The type tag is not registered in the store's metadata.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The type has no field with this name.
    #[error("type {type_tag} has no field {field:?}")]
    UnknownField { type_tag: String, field: String },

    /// A value of the wrong shape was written to a field.
    #[error("field {field:?} on {type_tag} expects a {expected} value")]
    KindMismatch {
        type_tag: String,
        field: String,
        expected: FieldKind,
    },

    /// System fields (id, type tag, global id, owner) are read-only.
    #[error("field {0:?} is maintained by the store and cannot be written")]
    SystemField(String),

    /// A referenced or owned object is not of the field's target type.
    #[error("field {field:?} expects {expected}, got {actual}")]
    TargetMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Abstract types cannot be instantiated.
    #[error("type {0} is abstract")]
    AbstractType(String),

    /// An ownership rule was violated (not an owned field, or an owned
    /// field written with objects it does not already own).
    #[error("invalid ownership: {0}")]
    InvalidOwnership(String),

    /// Field metadata could not be loaded or is inconsistent.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A transient failure reading or writing a single value.
    #[error("access error: {0}")]
    Access(String),

    /// IO error (metadata files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

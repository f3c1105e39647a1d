//! Error types for resolution and merging.

use lexkit_model::StoreError;
use thiserror::Error;

/// Result type for merge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the merge core.
///
/// Recoverable conditions (an unresolvable type, one field that cannot be
/// copied) are absorbed where they happen and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither the resolved view nor the supertype exposes the member.
    #[error("{type_tag} has no member {member:?}")]
    MissingMember { type_tag: String, member: String },

    /// The merge would corrupt data (type mismatch, self-merge, or the
    /// survivor lives inside the victim).
    #[error("incompatible merge: {0}")]
    IncompatibleMerge(String),

    /// The field registry has no descriptor for this type tag.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The object store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Merge settings could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

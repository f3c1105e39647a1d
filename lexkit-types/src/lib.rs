//! Identifier types for lexkit.
//!
//! This crate defines the small, store-agnostic types every other lexkit
//! crate depends on:
//! - [`ObjectId`]: store-local integer handle (may be reused after deletion)
//! - [`GlobalId`]: process-wide unique identifier (UUID v7), stable across stores
//! - [`Locale`]: writing-system tag used to key multilingual strings

mod ids;

pub use ids::{GlobalId, Locale, ObjectId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid locale tag: {0:?}")]
    InvalidLocale(String),
}

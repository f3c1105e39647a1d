//! Object model for lexkit.
//!
//! Defines the types that the resolution and merge core depends on:
//! - [`FieldKind`]: the ten field categories that decide copy semantics
//! - [`FieldDescriptor`] / [`TypeDescriptor`]: per-type field metadata
//! - [`SchemaCatalog`]: a set of type descriptors, including the built-in
//!   lexicon catalog, loadable from JSON
//! - [`FieldValue`] / [`MultiString`]: values read from and written to a store
//! - [`ObjectStore`] / [`MetadataSource`]: the contract an external object
//!   store fulfils
//!
//! Nothing here owns data; stores live in `lexkit-store` or outside the
//! workspace entirely.

mod catalog;
mod error;
mod schema;
mod store;
mod value;

pub use catalog::{CatalogFile, MetadataSource, SchemaCatalog, ROOT_TYPE};
pub use error::{StoreError, StoreResult};
pub use schema::{FieldDescriptor, FieldKind, TypeDescriptor, SYSTEM_FIELDS};
pub use store::{ObjectStore, Ownership};
pub use value::{FieldValue, MultiString};

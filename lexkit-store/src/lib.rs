//! In-memory object store for lexkit.
//!
//! [`MemoryStore`] implements [`lexkit_model::ObjectStore`] on top of a
//! [`lexkit_model::SchemaCatalog`]. It is the reference collaborator the
//! merge core is exercised against:
//!
//! - values are validated against flattened field metadata
//! - ownership is exclusive; deleting an object deletes what it owns and
//!   scrubs every reference to the deleted objects
//! - handles of deleted objects are reused by later creates
//! - [`MemoryStore::unit_of_work`] snapshots the store and restores it when
//!   the scoped closure fails
//!
//! It is not a persistence layer.

mod memory;

pub use memory::MemoryStore;

//! Polymorphic access and merging for lexkit object stores.
//!
//! Reading:
//! - [`FieldTypeRegistry`] maps runtime type tags to field metadata.
//! - [`ConcreteResolver`] turns supertype handles into typed [`Resolved`]
//!   views, or [`Concrete::Unknown`] when no view applies.
//! - [`ObjectWrapper`] answers member lookups from the typed view first and
//!   the supertype second.
//! - [`SmartCollection`] and its typed siblings filter, slice and summarize
//!   sequences of wrappers.
//!
//! Writing:
//! - [`DuplicateDetector`] groups objects by content [`Signature`].
//! - [`PropertyMerger`] copies fields from one object into another by kind.
//! - [`MergeOrchestrator`] merges one object into another, fixes up every
//!   link to it and deletes it.
//!
//! All writes go through [`lexkit_model::ObjectStore`]; the caller owns the
//! unit of work around them.

mod collection;
mod error;
mod merger;
mod orchestrator;
mod registry;
pub mod resolve;
mod settings;
mod signature;
mod wrapper;

pub use collection::{EntryCollection, SenseCollection, SmartCollection, WrapperSequence};
pub use error::{Error, Result};
pub use merger::{MergePolicy, MergeReport, PropertyMerger, SkippedField};
pub use orchestrator::{MergeOrchestrator, MergeOutcome, MergeStage};
pub use registry::FieldTypeRegistry;
pub use resolve::{
    Concrete, ConcreteResolver, HasCommonFields, HasSpecificFields, ObjectRef, Resolved,
    Unresolved, UnresolvedReason,
};
pub use settings::{MergeSection, MergeSettings, SignatureSection};
pub use signature::{DuplicateDetector, DuplicateGroup, FieldSet, Signature, SignatureValue};
pub use wrapper::ObjectWrapper;

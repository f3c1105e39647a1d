//! Field metadata catalogs.
//!
//! A [`SchemaCatalog`] holds the declared [`TypeDescriptor`]s of a store and
//! folds inherited fields into flattened descriptors. The built-in
//! [`SchemaCatalog::lexicon`] describes the lexicon, notebook, phonology and
//! possibility-list types; [`CatalogFile`] loads a catalog from JSON on disk.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::{FieldDescriptor, FieldKind, StoreError, StoreResult, TypeDescriptor};

/// Tag of the root type every other type derives from.
pub const ROOT_TYPE: &str = "CmObject";

/// A source of flattened field metadata.
///
/// Loading may fail (a file is missing, a remote catalog is unreachable);
/// consumers decide how to degrade.
pub trait MetadataSource: Send + Sync {
    /// Returns one flattened descriptor per registered type.
    fn load_types(&self) -> StoreResult<Vec<TypeDescriptor>>;
}

/// A set of declared type descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    types: Vec<TypeDescriptor>,
}

impl SchemaCatalog {
    /// A catalog containing only the root type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: vec![root_type()],
        }
    }

    /// Adds (or replaces) a type.
    #[must_use]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Adds (or replaces) a type.
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        match self
            .types
            .iter_mut()
            .find(|t| t.type_tag == descriptor.type_tag)
        {
            Some(existing) => *existing = descriptor,
            None => self.types.push(descriptor),
        }
    }

    /// The declared descriptor of `type_tag` (own fields only).
    pub fn get(&self, type_tag: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.type_tag == type_tag)
    }

    /// All registered type tags, in insertion order.
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.type_tag.as_str())
    }

    /// The descriptor of `type_tag` with all inherited fields folded in,
    /// base-most fields first. `None` when the type or one of its bases is
    /// missing, or the base chain loops.
    pub fn flattened(&self, type_tag: &str) -> Option<TypeDescriptor> {
        let chain = self.base_chain(type_tag)?;
        let own = chain.first()?;
        let mut fields = Vec::new();
        for descriptor in chain.iter().rev() {
            fields.extend(descriptor.fields.iter().cloned());
        }
        Some(TypeDescriptor {
            type_tag: own.type_tag.clone(),
            base: own.base.clone(),
            is_abstract: own.is_abstract,
            fields,
        })
    }

    /// True when `type_tag` is `ancestor` or derives from it.
    pub fn is_subtype(&self, type_tag: &str, ancestor: &str) -> bool {
        self.base_chain(type_tag)
            .map(|chain| chain.iter().any(|t| t.type_tag == ancestor))
            .unwrap_or(false)
    }

    /// `type_tag` followed by its bases, most-derived first.
    fn base_chain(&self, type_tag: &str) -> Option<Vec<&TypeDescriptor>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_tag);
        while let Some(tag) = current {
            if !seen.insert(tag) {
                return None;
            }
            let descriptor = self.get(tag)?;
            chain.push(descriptor);
            current = descriptor.base.as_deref();
        }
        Some(chain)
    }

    /// Checks the catalog for dangling bases, inheritance loops, duplicate
    /// field names and malformed object fields.
    pub fn validate(&self) -> StoreResult<()> {
        let mut tags = HashSet::new();
        for descriptor in &self.types {
            if !tags.insert(descriptor.type_tag.as_str()) {
                return Err(StoreError::Metadata(format!(
                    "type {} declared twice",
                    descriptor.type_tag
                )));
            }
        }

        for descriptor in &self.types {
            let flat = self.flattened(&descriptor.type_tag).ok_or_else(|| {
                StoreError::Metadata(format!(
                    "type {} has a missing or cyclic base",
                    descriptor.type_tag
                ))
            })?;

            let mut names = HashSet::new();
            for field in &flat.fields {
                if !names.insert(field.name.as_str()) {
                    return Err(StoreError::Metadata(format!(
                        "field {} declared twice on {}",
                        field.name, flat.type_tag
                    )));
                }
                match (&field.target, field.kind.is_object()) {
                    (Some(target), true) if self.get(target).is_none() => {
                        return Err(StoreError::Metadata(format!(
                            "field {}.{} targets unknown type {}",
                            flat.type_tag, field.name, target
                        )));
                    }
                    (Some(_), false) => {
                        return Err(StoreError::Metadata(format!(
                            "{} field {}.{} cannot have a target",
                            field.kind, flat.type_tag, field.name
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Parses a catalog from JSON (`{"types": [...]}`). The root type is
    /// added when the document omits it.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let mut catalog: SchemaCatalog = serde_json::from_str(json)?;
        if catalog.get(ROOT_TYPE).is_none() {
            catalog.types.insert(0, root_type());
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serializes the catalog to pretty JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The built-in lexicon catalog.
    #[must_use]
    pub fn lexicon() -> Self {
        use FieldDescriptor as F;

        Self::new()
            .with_type(TypeDescriptor::new(
                "LexDb",
                ROOT_TYPE,
                vec![F::owned_collection("Entries", "LexEntry")],
            ))
            .with_type(TypeDescriptor::new(
                "LexEntry",
                ROOT_TYPE,
                vec![
                    F::multi_string("CitationForm"),
                    F::multi_string("Comment"),
                    F::integer("HomographNumber"),
                    F::boolean("ExcludeAsHeadword"),
                    F::string("ImportResidue"),
                    F::owned_atomic("LexemeForm", "MoForm"),
                    F::owned_sequence("AlternateForms", "MoForm"),
                    F::owned_sequence("Senses", "LexSense"),
                    F::reference_sequence("MainEntries", "LexEntry"),
                    F::reference_collection("DoNotPublishIn", "CmPossibility"),
                ],
            ))
            .with_type(TypeDescriptor::abstract_type(
                "MoForm",
                ROOT_TYPE,
                vec![
                    F::multi_string("Form"),
                    F::boolean("IsAbstract"),
                    F::reference_atomic("MorphType", "CmPossibility"),
                ],
            ))
            .with_type(TypeDescriptor::new("MoStemAllomorph", "MoForm", vec![]))
            .with_type(TypeDescriptor::new(
                "MoAffixAllomorph",
                "MoForm",
                vec![F::reference_collection("Position", "CmPossibility")],
            ))
            .with_type(TypeDescriptor::new(
                "LexSense",
                ROOT_TYPE,
                vec![
                    F::multi_string("Gloss"),
                    F::multi_string("Definition"),
                    F::string("ScientificName"),
                    F::owned_sequence("Examples", "LexExampleSentence"),
                    F::owned_sequence("Senses", "LexSense"),
                    F::reference_atomic("PartOfSpeech", "PartOfSpeech"),
                    F::reference_collection("SemanticDomains", "CmPossibility"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "LexExampleSentence",
                ROOT_TYPE,
                vec![
                    F::multi_string("Example"),
                    F::multi_string("Translation"),
                    F::string("Reference"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "CmPossibilityList",
                ROOT_TYPE,
                vec![
                    F::multi_string("Name"),
                    F::owned_sequence("Possibilities", "CmPossibility"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "CmPossibility",
                ROOT_TYPE,
                vec![
                    F::multi_string("Name"),
                    F::multi_string("Abbreviation"),
                    F::multi_string("Description"),
                    F::owned_sequence("SubPossibilities", "CmPossibility"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "PartOfSpeech",
                "CmPossibility",
                vec![F::string("CatalogSourceId")],
            ))
            .with_type(TypeDescriptor::new(
                "CmPerson",
                "CmPossibility",
                vec![F::string("Email"), F::boolean("IsResearcher")],
            ))
            .with_type(TypeDescriptor::new(
                "PhPhonemeSet",
                ROOT_TYPE,
                vec![
                    F::multi_string("Name"),
                    F::owned_collection("Phonemes", "PhPhoneme"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "PhPhoneme",
                ROOT_TYPE,
                vec![
                    F::multi_string("Name"),
                    F::multi_string("Description"),
                    F::string("BasicIPASymbol"),
                ],
            ))
            .with_type(TypeDescriptor::new(
                "RnResearchNbk",
                ROOT_TYPE,
                vec![F::owned_collection("Records", "RnGenericRec")],
            ))
            .with_type(TypeDescriptor::new(
                "RnGenericRec",
                ROOT_TYPE,
                vec![
                    F::multi_string("Title"),
                    F::multi_string("Conclusions"),
                    F::integer("DateOfEvent"),
                    F::owned_sequence("SubRecords", "RnGenericRec"),
                    F::reference_collection("Researchers", "CmPerson"),
                    F::reference_atomic("Confidence", "CmPossibility"),
                    F::reference_sequence("SeeAlso", "RnGenericRec"),
                ],
            ))
    }
}

impl MetadataSource for SchemaCatalog {
    fn load_types(&self) -> StoreResult<Vec<TypeDescriptor>> {
        self.validate()?;
        self.types
            .iter()
            .map(|t| {
                self.flattened(&t.type_tag).ok_or_else(|| {
                    StoreError::Metadata(format!("cannot flatten {}", t.type_tag))
                })
            })
            .collect()
    }
}

/// A catalog stored as JSON on disk, read on every load.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    path: PathBuf,
}

impl CatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and validates the catalog.
    pub fn read(&self) -> StoreResult<SchemaCatalog> {
        let contents = std::fs::read_to_string(&self.path)?;
        SchemaCatalog::from_json(&contents)
    }
}

impl MetadataSource for CatalogFile {
    fn load_types(&self) -> StoreResult<Vec<TypeDescriptor>> {
        self.read()?.load_types()
    }
}

fn root_type() -> TypeDescriptor {
    TypeDescriptor {
        type_tag: ROOT_TYPE.to_string(),
        base: None,
        is_abstract: true,
        fields: vec![
            FieldDescriptor::system("Id", FieldKind::Integer),
            FieldDescriptor::system("Guid", FieldKind::String),
            FieldDescriptor::system("ClassName", FieldKind::String),
            FieldDescriptor {
                target: Some(ROOT_TYPE.to_string()),
                ..FieldDescriptor::system("Owner", FieldKind::ReferenceAtomic)
            },
            FieldDescriptor::system("OwningField", FieldKind::String),
        ],
    }
}

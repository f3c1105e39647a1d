//! Typed views of the lexicon types.
//!
//! Each view is a snapshot of one object's type-specific fields, taken when
//! the handle was resolved.

use lexkit_model::{FieldKind, FieldValue, MultiString, ObjectStore, StoreError, StoreResult};
use lexkit_types::{Locale, ObjectId};

use super::{HasCommonFields, HasSpecificFields, ObjectRef, Resolved};

/// Placeholder label for objects with no text to show.
const NO_LABEL: &str = "???";

/// Loads the view registered for `type_tag`, or `None` when the tag has none.
pub(super) fn load_view(
    type_tag: &str,
    store: &dyn ObjectStore,
    handle: &ObjectRef,
) -> Option<StoreResult<Resolved>> {
    let reader = Reader::new(store, handle);
    let loaded = match type_tag {
        "LexEntry" => LexEntry::load(&reader).map(Resolved::LexEntry),
        "LexSense" => LexSense::load(&reader).map(Resolved::LexSense),
        "LexExampleSentence" => ExampleSentence::load(&reader).map(Resolved::ExampleSentence),
        "MoForm" => Allomorph::load(&reader).map(Resolved::Allomorph),
        "PartOfSpeech" => PartOfSpeech::load(&reader).map(Resolved::PartOfSpeech),
        "CmPossibility" => Possibility::load(&reader).map(Resolved::Possibility),
        "PhPhoneme" => Phoneme::load(&reader).map(Resolved::Phoneme),
        "RnGenericRec" => NotebookRecord::load(&reader).map(Resolved::NotebookRecord),
        _ => return None,
    };
    Some(loaded)
}

struct Reader<'s> {
    store: &'s dyn ObjectStore,
    handle: &'s ObjectRef,
    locales: Vec<Locale>,
}

impl<'s> Reader<'s> {
    fn new(store: &'s dyn ObjectStore, handle: &'s ObjectRef) -> Self {
        Self {
            store,
            handle,
            locales: store.locales(),
        }
    }

    fn mismatch(&self, field: &str, expected: FieldKind) -> StoreError {
        StoreError::KindMismatch {
            type_tag: self.handle.type_tag().to_string(),
            field: field.to_string(),
            expected,
        }
    }

    fn read(&self, field: &str) -> StoreResult<FieldValue> {
        self.store.get(self.handle.id(), field)
    }

    fn multi(&self, field: &str) -> StoreResult<MultiString> {
        match self.read(field)? {
            FieldValue::MultiString(ms) => Ok(ms),
            _ => Err(self.mismatch(field, FieldKind::MultiString)),
        }
    }

    fn string(&self, field: &str) -> StoreResult<String> {
        match self.read(field)? {
            FieldValue::String(s) => Ok(s),
            _ => Err(self.mismatch(field, FieldKind::String)),
        }
    }

    fn integer(&self, field: &str) -> StoreResult<i64> {
        self.read(field)?
            .as_integer()
            .ok_or_else(|| self.mismatch(field, FieldKind::Integer))
    }

    fn boolean(&self, field: &str) -> StoreResult<bool> {
        self.read(field)?
            .as_bool()
            .ok_or_else(|| self.mismatch(field, FieldKind::Boolean))
    }

    fn object(&self, field: &str) -> StoreResult<Option<ObjectId>> {
        match self.read(field)? {
            FieldValue::Object(o) => Ok(o),
            _ => Err(self.mismatch(field, FieldKind::ReferenceAtomic)),
        }
    }

    fn objects(&self, field: &str) -> StoreResult<Vec<ObjectId>> {
        match self.read(field)? {
            FieldValue::Objects(ids) => Ok(ids),
            _ => Err(self.mismatch(field, FieldKind::ReferenceSequence)),
        }
    }

    /// Best alternative of `ms` in store locale order.
    fn best(&self, ms: &MultiString) -> Option<String> {
        ms.best(&self.locales).map(str::to_string)
    }
}

macro_rules! common_fields {
    ($($view:ty),+ $(,)?) => {
        $(
            impl HasCommonFields for $view {
                fn object_ref(&self) -> &ObjectRef {
                    &self.base
                }
            }
        )+
    };
}

common_fields!(
    LexEntry,
    LexSense,
    ExampleSentence,
    Allomorph,
    PartOfSpeech,
    Possibility,
    Phoneme,
    NotebookRecord,
);

fn ms(value: &MultiString) -> Option<FieldValue> {
    Some(FieldValue::MultiString(value.clone()))
}

fn text(value: &str) -> Option<FieldValue> {
    Some(FieldValue::String(value.to_string()))
}

fn objects(ids: &[ObjectId]) -> Option<FieldValue> {
    Some(FieldValue::Objects(ids.to_vec()))
}

// ── Lexicon ──────────────────────────────────────────────────────

/// A lexical entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexEntry {
    base: ObjectRef,
    pub citation_form: MultiString,
    pub comment: MultiString,
    pub homograph_number: i64,
    pub exclude_as_headword: bool,
    pub import_residue: String,
    pub lexeme_form: Option<ObjectId>,
    pub alternate_forms: Vec<ObjectId>,
    pub senses: Vec<ObjectId>,
    pub main_entries: Vec<ObjectId>,
    pub do_not_publish_in: Vec<ObjectId>,
    /// Citation form (or lexeme form) plus homograph number.
    pub headword: String,
}

impl LexEntry {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let citation_form = r.multi("CitationForm")?;
        let homograph_number = r.integer("HomographNumber")?;
        let lexeme_form = r.object("LexemeForm")?;

        let form = match r.best(&citation_form) {
            Some(form) => Some(form),
            None => match lexeme_form {
                Some(id) => match r.store.get(id, "Form")? {
                    FieldValue::MultiString(form) => r.best(&form),
                    _ => None,
                },
                None => None,
            },
        };
        let mut headword = form.unwrap_or_else(|| NO_LABEL.to_string());
        if homograph_number > 0 {
            headword.push_str(&homograph_number.to_string());
        }

        Ok(Self {
            base: r.handle.clone(),
            citation_form,
            comment: r.multi("Comment")?,
            homograph_number,
            exclude_as_headword: r.boolean("ExcludeAsHeadword")?,
            import_residue: r.string("ImportResidue")?,
            lexeme_form,
            alternate_forms: r.objects("AlternateForms")?,
            senses: r.objects("Senses")?,
            main_entries: r.objects("MainEntries")?,
            do_not_publish_in: r.objects("DoNotPublishIn")?,
            headword,
        })
    }
}

impl HasSpecificFields for LexEntry {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "CitationForm" => ms(&self.citation_form),
            "Comment" => ms(&self.comment),
            "HomographNumber" => Some(FieldValue::Integer(self.homograph_number)),
            "ExcludeAsHeadword" => Some(FieldValue::Bool(self.exclude_as_headword)),
            "ImportResidue" => text(&self.import_residue),
            "LexemeForm" => Some(FieldValue::Object(self.lexeme_form)),
            "AlternateForms" => objects(&self.alternate_forms),
            "Senses" => objects(&self.senses),
            "MainEntries" => objects(&self.main_entries),
            "DoNotPublishIn" => objects(&self.do_not_publish_in),
            "HeadWord" | "ShortName" => text(&self.headword),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &[
            "CitationForm",
            "Comment",
            "HomographNumber",
            "ExcludeAsHeadword",
            "ImportResidue",
            "LexemeForm",
            "AlternateForms",
            "Senses",
            "MainEntries",
            "DoNotPublishIn",
            "HeadWord",
            "ShortName",
        ]
    }

    fn short_name(&self) -> &str {
        &self.headword
    }
}

/// A sense of a lexical entry (or a subsense of another sense).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexSense {
    base: ObjectRef,
    pub gloss: MultiString,
    pub definition: MultiString,
    pub scientific_name: String,
    pub examples: Vec<ObjectId>,
    pub senses: Vec<ObjectId>,
    pub part_of_speech: Option<ObjectId>,
    pub semantic_domains: Vec<ObjectId>,
    label: String,
}

impl LexSense {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let gloss = r.multi("Gloss")?;
        let definition = r.multi("Definition")?;
        let label = r
            .best(&gloss)
            .or_else(|| r.best(&definition))
            .unwrap_or_else(|| NO_LABEL.to_string());

        Ok(Self {
            base: r.handle.clone(),
            gloss,
            definition,
            scientific_name: r.string("ScientificName")?,
            examples: r.objects("Examples")?,
            senses: r.objects("Senses")?,
            part_of_speech: r.object("PartOfSpeech")?,
            semantic_domains: r.objects("SemanticDomains")?,
            label,
        })
    }
}

impl HasSpecificFields for LexSense {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Gloss" => ms(&self.gloss),
            "Definition" => ms(&self.definition),
            "ScientificName" => text(&self.scientific_name),
            "Examples" => objects(&self.examples),
            "Senses" => objects(&self.senses),
            "PartOfSpeech" => Some(FieldValue::Object(self.part_of_speech)),
            "SemanticDomains" => objects(&self.semantic_domains),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &[
            "Gloss",
            "Definition",
            "ScientificName",
            "Examples",
            "Senses",
            "PartOfSpeech",
            "SemanticDomains",
            "ShortName",
        ]
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

/// An example sentence illustrating a sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSentence {
    base: ObjectRef,
    pub example: MultiString,
    pub translation: MultiString,
    pub reference: String,
    label: String,
}

impl ExampleSentence {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let example = r.multi("Example")?;
        let label = r.best(&example).unwrap_or_else(|| NO_LABEL.to_string());
        Ok(Self {
            base: r.handle.clone(),
            example,
            translation: r.multi("Translation")?,
            reference: r.string("Reference")?,
            label,
        })
    }
}

impl HasSpecificFields for ExampleSentence {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Example" => ms(&self.example),
            "Translation" => ms(&self.translation),
            "Reference" => text(&self.reference),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &["Example", "Translation", "Reference", "ShortName"]
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

/// A stem or affix allomorph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allomorph {
    base: ObjectRef,
    pub form: MultiString,
    pub is_abstract: bool,
    pub morph_type: Option<ObjectId>,
    /// Affix positions; always empty for stems.
    pub position: Vec<ObjectId>,
    label: String,
}

impl Allomorph {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let form = r.multi("Form")?;
        let position = if r.handle.type_tag() == "MoAffixAllomorph" {
            r.objects("Position")?
        } else {
            Vec::new()
        };
        let label = r.best(&form).unwrap_or_else(|| NO_LABEL.to_string());
        Ok(Self {
            base: r.handle.clone(),
            form,
            is_abstract: r.boolean("IsAbstract")?,
            morph_type: r.object("MorphType")?,
            position,
            label,
        })
    }

    #[must_use]
    pub fn is_affix(&self) -> bool {
        self.base.type_tag() == "MoAffixAllomorph"
    }
}

impl HasSpecificFields for Allomorph {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Form" => ms(&self.form),
            "IsAbstract" => Some(FieldValue::Bool(self.is_abstract)),
            "MorphType" => Some(FieldValue::Object(self.morph_type)),
            "Position" if self.is_affix() => objects(&self.position),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        if self.is_affix() {
            &["Form", "IsAbstract", "MorphType", "Position", "ShortName"]
        } else {
            &["Form", "IsAbstract", "MorphType", "ShortName"]
        }
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

// ── Possibility lists ────────────────────────────────────────────

/// An item of a possibility list (semantic domain, morph type, person, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Possibility {
    base: ObjectRef,
    pub name: MultiString,
    pub abbreviation: MultiString,
    pub description: MultiString,
    pub sub_possibilities: Vec<ObjectId>,
    label: String,
}

impl Possibility {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let name = r.multi("Name")?;
        let abbreviation = r.multi("Abbreviation")?;
        let label = r
            .best(&name)
            .or_else(|| r.best(&abbreviation))
            .unwrap_or_else(|| NO_LABEL.to_string());
        Ok(Self {
            base: r.handle.clone(),
            name,
            abbreviation,
            description: r.multi("Description")?,
            sub_possibilities: r.objects("SubPossibilities")?,
            label,
        })
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Name" => ms(&self.name),
            "Abbreviation" => ms(&self.abbreviation),
            "Description" => ms(&self.description),
            "SubPossibilities" => objects(&self.sub_possibilities),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }
}

const POSSIBILITY_FIELDS: [&str; 5] = [
    "Name",
    "Abbreviation",
    "Description",
    "SubPossibilities",
    "ShortName",
];

impl HasSpecificFields for Possibility {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        self.field(name)
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &POSSIBILITY_FIELDS
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

/// A grammatical category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOfSpeech {
    base: ObjectRef,
    pub possibility: Possibility,
    pub catalog_source_id: String,
}

impl PartOfSpeech {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        Ok(Self {
            base: r.handle.clone(),
            possibility: Possibility::load(r)?,
            catalog_source_id: r.string("CatalogSourceId")?,
        })
    }
}

impl HasSpecificFields for PartOfSpeech {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "CatalogSourceId" => text(&self.catalog_source_id),
            _ => self.possibility.field(name),
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &[
            "Name",
            "Abbreviation",
            "Description",
            "SubPossibilities",
            "CatalogSourceId",
            "ShortName",
        ]
    }

    fn short_name(&self) -> &str {
        &self.possibility.label
    }
}

// ── Phonology and notebook ───────────────────────────────────────

/// A phoneme of the phonological inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phoneme {
    base: ObjectRef,
    pub name: MultiString,
    pub description: MultiString,
    pub basic_ipa_symbol: String,
    label: String,
}

impl Phoneme {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let name = r.multi("Name")?;
        let basic_ipa_symbol = r.string("BasicIPASymbol")?;
        let label = r
            .best(&name)
            .or_else(|| (!basic_ipa_symbol.is_empty()).then(|| basic_ipa_symbol.clone()))
            .unwrap_or_else(|| NO_LABEL.to_string());
        Ok(Self {
            base: r.handle.clone(),
            name,
            description: r.multi("Description")?,
            basic_ipa_symbol,
            label,
        })
    }
}

impl HasSpecificFields for Phoneme {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Name" => ms(&self.name),
            "Description" => ms(&self.description),
            "BasicIPASymbol" => text(&self.basic_ipa_symbol),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &["Name", "Description", "BasicIPASymbol", "ShortName"]
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

/// A data notebook record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookRecord {
    base: ObjectRef,
    pub title: MultiString,
    pub conclusions: MultiString,
    pub date_of_event: i64,
    pub sub_records: Vec<ObjectId>,
    pub researchers: Vec<ObjectId>,
    pub confidence: Option<ObjectId>,
    pub see_also: Vec<ObjectId>,
    label: String,
}

impl NotebookRecord {
    fn load(r: &Reader<'_>) -> StoreResult<Self> {
        let title = r.multi("Title")?;
        let label = r.best(&title).unwrap_or_else(|| NO_LABEL.to_string());
        Ok(Self {
            base: r.handle.clone(),
            title,
            conclusions: r.multi("Conclusions")?,
            date_of_event: r.integer("DateOfEvent")?,
            sub_records: r.objects("SubRecords")?,
            researchers: r.objects("Researchers")?,
            confidence: r.object("Confidence")?,
            see_also: r.objects("SeeAlso")?,
            label,
        })
    }
}

impl HasSpecificFields for NotebookRecord {
    fn specific_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Title" => ms(&self.title),
            "Conclusions" => ms(&self.conclusions),
            "DateOfEvent" => Some(FieldValue::Integer(self.date_of_event)),
            "SubRecords" => objects(&self.sub_records),
            "Researchers" => objects(&self.researchers),
            "Confidence" => Some(FieldValue::Object(self.confidence)),
            "SeeAlso" => objects(&self.see_also),
            "ShortName" => text(&self.label),
            _ => None,
        }
    }

    fn specific_field_names(&self) -> &'static [&'static str] {
        &[
            "Title",
            "Conclusions",
            "DateOfEvent",
            "SubRecords",
            "Researchers",
            "Confidence",
            "SeeAlso",
            "ShortName",
        ]
    }

    fn short_name(&self) -> &str {
        &self.label
    }
}

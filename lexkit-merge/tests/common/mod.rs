//! Shared fixtures for merge-core tests.

#![allow(dead_code)]

use lexkit_merge::FieldTypeRegistry;
use lexkit_model::{
    FieldDescriptor, FieldValue, MultiString, ObjectStore, SchemaCatalog, TypeDescriptor,
};
use lexkit_store::MemoryStore;
use lexkit_types::ObjectId;

/// Installs a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry over the built-in lexicon catalog.
pub fn lexicon_registry() -> FieldTypeRegistry {
    FieldTypeRegistry::from_catalog(SchemaCatalog::lexicon())
}

/// Lexicon store with English and French, plus one `LexDb` root.
pub fn lexicon() -> (MemoryStore, ObjectId) {
    init_tracing();
    let mut store = MemoryStore::lexicon().with_locales(["en", "fr"]);
    let db = store.create("LexDb", None).unwrap();
    (store, db)
}

pub fn ms(pairs: &[(&str, &str)]) -> FieldValue {
    FieldValue::MultiString(MultiString::from_pairs(pairs.iter().copied()))
}

/// Creates an entry with an English citation form.
pub fn entry(store: &mut MemoryStore, db: ObjectId, citation: &str) -> ObjectId {
    let id = store.create("LexEntry", Some((db, "Entries"))).unwrap();
    store.set(id, "CitationForm", ms(&[("en", citation)])).unwrap();
    id
}

/// Creates a sense with an English gloss.
pub fn sense(store: &mut MemoryStore, owner: ObjectId, gloss: &str) -> ObjectId {
    let id = store.create("LexSense", Some((owner, "Senses"))).unwrap();
    store.set(id, "Gloss", ms(&[("en", gloss)])).unwrap();
    id
}

/// Creates an example sentence with English text.
pub fn example(store: &mut MemoryStore, sense: ObjectId, text: &str) -> ObjectId {
    let id = store
        .create("LexExampleSentence", Some((sense, "Examples")))
        .unwrap();
    store.set(id, "Example", ms(&[("en", text)])).unwrap();
    id
}

/// A part of speech in a fresh possibility list.
pub fn part_of_speech(store: &mut MemoryStore, name: &str) -> ObjectId {
    let list = store.create("CmPossibilityList", None).unwrap();
    let pos = store
        .create("PartOfSpeech", Some((list, "Possibilities")))
        .unwrap();
    store.set(pos, "Name", ms(&[("en", name)])).unwrap();
    pos
}

pub fn objects(store: &MemoryStore, id: ObjectId, field: &str) -> Vec<ObjectId> {
    store.get(id, field).unwrap().object_ids()
}

pub fn text(store: &MemoryStore, id: ObjectId, field: &str, locale: &str) -> String {
    let locale = lexkit_types::Locale::parse(locale).unwrap();
    match store.get(id, field).unwrap() {
        FieldValue::MultiString(ms) => ms.get(&locale).to_string(),
        other => panic!("{field} is not a multilingual string: {other:?}"),
    }
}

/// A small catalog of `Foo`, `Bar` and `Baz` items under a `Bin` root.
pub fn bin_catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_type(TypeDescriptor::new(
            "Bin",
            "CmObject",
            vec![FieldDescriptor::owned_sequence("Items", "Item")],
        ))
        .with_type(TypeDescriptor::abstract_type(
            "Item",
            "CmObject",
            vec![
                FieldDescriptor::string("Label"),
                FieldDescriptor::boolean("Flag"),
                FieldDescriptor::integer("Count"),
            ],
        ))
        .with_type(TypeDescriptor::new("Foo", "Item", vec![]))
        .with_type(TypeDescriptor::new("Bar", "Item", vec![]))
        .with_type(TypeDescriptor::new("Baz", "Item", vec![]))
}

/// Store over [`bin_catalog`] with one `Bin` holding items of the given tags.
pub fn bin_with(tags: &[&str]) -> (MemoryStore, ObjectId, Vec<ObjectId>) {
    init_tracing();
    let mut store = MemoryStore::new(bin_catalog()).unwrap();
    let bin = store.create("Bin", None).unwrap();
    let items = tags
        .iter()
        .map(|tag| store.create(tag, Some((bin, "Items"))).unwrap())
        .collect();
    (store, bin, items)
}

use lexkit_model::{
    CatalogFile, FieldDescriptor, FieldKind, MetadataSource, SchemaCatalog, StoreError,
    TypeDescriptor, ROOT_TYPE,
};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn lexicon_catalog_is_valid() {
    SchemaCatalog::lexicon().validate().unwrap();
}

#[test]
fn flattened_includes_inherited_fields_base_first() {
    let catalog = SchemaCatalog::lexicon();
    let pos = catalog.flattened("PartOfSpeech").unwrap();
    let names: Vec<_> = pos.fields.iter().map(|f| f.name.as_str()).collect();

    assert_eq!(&names[..5], &["Id", "Guid", "ClassName", "Owner", "OwningField"]);
    assert!(names.contains(&"Name"));
    assert_eq!(names.last(), Some(&"CatalogSourceId"));
    assert_eq!(pos.base.as_deref(), Some("CmPossibility"));
}

#[test]
fn flattened_unknown_type_is_none() {
    assert!(SchemaCatalog::lexicon().flattened("NoSuchType").is_none());
}

#[test]
fn is_subtype_walks_the_base_chain() {
    let catalog = SchemaCatalog::lexicon();
    assert!(catalog.is_subtype("MoStemAllomorph", "MoForm"));
    assert!(catalog.is_subtype("MoStemAllomorph", ROOT_TYPE));
    assert!(catalog.is_subtype("LexEntry", "LexEntry"));
    assert!(!catalog.is_subtype("LexEntry", "LexSense"));
}

#[test]
fn abstract_types_are_flagged() {
    let catalog = SchemaCatalog::lexicon();
    assert!(catalog.get("MoForm").unwrap().is_abstract);
    assert!(!catalog.get("MoStemAllomorph").unwrap().is_abstract);
}

#[test]
fn validate_rejects_dangling_base() {
    let catalog = SchemaCatalog::new().with_type(TypeDescriptor::new("Orphan", "Missing", vec![]));
    assert!(matches!(catalog.validate(), Err(StoreError::Metadata(_))));
}

#[test]
fn validate_rejects_base_cycle() {
    let catalog = SchemaCatalog::new()
        .with_type(TypeDescriptor::new("A", "B", vec![]))
        .with_type(TypeDescriptor::new("B", "A", vec![]));
    assert!(catalog.validate().is_err());
    assert!(catalog.flattened("A").is_none());
}

#[test]
fn validate_rejects_shadowed_field() {
    let catalog = SchemaCatalog::new().with_type(TypeDescriptor::new(
        "Thing",
        ROOT_TYPE,
        vec![FieldDescriptor::string("Guid")],
    ));
    assert!(catalog.validate().is_err());
}

#[test]
fn validate_rejects_unknown_target() {
    let catalog = SchemaCatalog::new().with_type(TypeDescriptor::new(
        "Thing",
        ROOT_TYPE,
        vec![FieldDescriptor::owned_atomic("Part", "Nowhere")],
    ));
    assert!(catalog.validate().is_err());
}

#[test]
fn insert_replaces_existing_type() {
    let mut catalog = SchemaCatalog::new().with_type(TypeDescriptor::new("T", ROOT_TYPE, vec![]));
    catalog.insert(TypeDescriptor::new(
        "T",
        ROOT_TYPE,
        vec![FieldDescriptor::integer("Count")],
    ));
    assert_eq!(catalog.type_tags().filter(|t| *t == "T").count(), 1);
    assert!(catalog.get("T").unwrap().field("Count").is_some());
}

#[test]
fn json_roundtrip_preserves_catalog() {
    let catalog = SchemaCatalog::lexicon();
    let json = catalog.to_json().unwrap();
    let parsed = SchemaCatalog::from_json(&json).unwrap();
    assert_eq!(parsed, catalog);
}

#[test]
fn from_json_adds_missing_root() {
    let json = r#"{"types": [
        {"type_tag": "Note", "base": "CmObject",
         "fields": [{"name": "Text", "kind": "string"}]}
    ]}"#;
    let catalog = SchemaCatalog::from_json(json).unwrap();
    let note = catalog.flattened("Note").unwrap();
    assert!(note.field("Guid").unwrap().is_system);
    assert_eq!(note.field("Text").unwrap().kind, FieldKind::String);
}

#[test]
fn load_types_returns_flattened_descriptors() {
    let types = SchemaCatalog::lexicon().load_types().unwrap();
    let entry = types.iter().find(|t| t.type_tag == "LexEntry").unwrap();
    assert!(entry.field("Owner").is_some());
    assert!(entry.field("Senses").is_some());
}

#[test]
fn catalog_file_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", SchemaCatalog::lexicon().to_json().unwrap()).unwrap();

    let source = CatalogFile::new(file.path());
    let types = source.load_types().unwrap();
    assert!(types.iter().any(|t| t.type_tag == "PhPhoneme"));
}

#[test]
fn catalog_file_missing_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = CatalogFile::new(dir.path().join("absent.json"));
    assert!(matches!(source.load_types(), Err(StoreError::Io(_))));
}

#[test]
fn catalog_file_malformed_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let source = CatalogFile::new(file.path());
    assert!(matches!(source.load_types(), Err(StoreError::Serialization(_))));
}

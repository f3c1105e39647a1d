mod common;

use common::{entry, example, lexicon, lexicon_registry, ms, sense};
use lexkit_merge::{ConcreteResolver, Error, FieldTypeRegistry, ObjectWrapper};
use lexkit_model::{FieldValue, MetadataSource, StoreError, StoreResult, TypeDescriptor};
use std::sync::Arc;

struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn load_types(&self) -> StoreResult<Vec<TypeDescriptor>> {
        Err(StoreError::Metadata("none".to_string()))
    }
}

#[test]
fn specific_members_come_from_the_resolved_view() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let s = sense(&mut store, e, "edge");
    let registry = lexicon_registry();

    let wrapper =
        ObjectWrapper::with_resolver(&store, e, &ConcreteResolver::new(&registry)).unwrap();

    assert!(wrapper.is_resolved());
    assert_eq!(wrapper.get("Senses").unwrap(), FieldValue::Objects(vec![s]));
    assert_eq!(wrapper.get("CitationForm").unwrap(), ms(&[("en", "bank")]));
    assert_eq!(wrapper.type_tag(), "LexEntry");
}

#[test]
fn common_members_fall_back_to_the_supertype() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let registry = lexicon_registry();

    let wrapper =
        ObjectWrapper::with_resolver(&store, e, &ConcreteResolver::new(&registry)).unwrap();

    assert_eq!(
        wrapper.get("ClassName").unwrap(),
        FieldValue::String("LexEntry".to_string())
    );
    assert_eq!(wrapper.get("Owner").unwrap(), FieldValue::Object(Some(db)));
    assert_eq!(
        wrapper.get("Id").unwrap(),
        FieldValue::Integer(i64::from(e.get()))
    );
}

#[test]
fn resolved_member_shadows_supertype_member() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let s = sense(&mut store, e, "edge");
    let x = example(&mut store, s, "the bank was muddy");
    let registry = lexicon_registry();
    let resolver = ConcreteResolver::new(&registry);

    for (id, label) in [(e, "bank"), (s, "edge"), (x, "the bank was muddy")] {
        let wrapper = ObjectWrapper::with_resolver(&store, id, &resolver).unwrap();
        assert_eq!(
            wrapper.get("ShortName").unwrap(),
            FieldValue::String(label.to_string())
        );
        assert_eq!(wrapper.short_name(), label);
    }

    // No typed view: the supertype answers with the type tag.
    let wrapper = ObjectWrapper::with_resolver(&store, db, &resolver).unwrap();
    assert!(!wrapper.is_resolved());
    assert_eq!(
        wrapper.get("ShortName").unwrap(),
        FieldValue::String("LexDb".to_string())
    );
    assert_eq!(wrapper.short_name(), "LexDb");
}

#[test]
fn missing_member_is_an_error() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let s = sense(&mut store, e, "edge");
    let registry = lexicon_registry();
    let wrapper =
        ObjectWrapper::with_resolver(&store, s, &ConcreteResolver::new(&registry)).unwrap();

    match wrapper.get("CitationForm") {
        Err(Error::MissingMember { type_tag, member }) => {
            assert_eq!(type_tag, "LexSense");
            assert_eq!(member, "CitationForm");
        }
        other => panic!("expected MissingMember, got {other:?}"),
    }
    assert!(!wrapper.has_member("CitationForm"));
    assert!(wrapper.has_member("Gloss"));
}

#[test]
fn get_or_default_never_fails() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let registry = lexicon_registry();
    let wrapper =
        ObjectWrapper::with_resolver(&store, e, &ConcreteResolver::new(&registry)).unwrap();

    assert_eq!(
        wrapper.get_or_default("Nope", FieldValue::Integer(7)),
        FieldValue::Integer(7)
    );
    assert_eq!(
        wrapper.get_or_default("HomographNumber", FieldValue::Integer(7)),
        FieldValue::Integer(0)
    );
}

#[test]
fn unresolved_wrapper_only_exposes_common_members() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let registry = FieldTypeRegistry::new(Arc::new(NoMetadata));
    let wrapper =
        ObjectWrapper::with_resolver(&store, e, &ConcreteResolver::new(&registry)).unwrap();

    assert!(!wrapper.is_resolved());
    assert!(wrapper.get("CitationForm").is_err());
    assert_eq!(
        wrapper.get("Guid").unwrap(),
        FieldValue::String(wrapper.global_id().to_string())
    );
}

#[test]
fn global_wrapper_uses_builtin_catalog() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let wrapper = ObjectWrapper::new(&store, e).unwrap();
    assert!(wrapper.is_resolved());
    assert_eq!(wrapper.id(), e);
    assert_eq!(wrapper.original().type_tag(), "LexEntry");
}

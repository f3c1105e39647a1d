mod common;

use common::{entry, lexicon, lexicon_registry, ms, part_of_speech, sense};
use lexkit_merge::resolve::{Allomorph, LexEntry};
use lexkit_merge::{
    Concrete, ConcreteResolver, FieldTypeRegistry, HasCommonFields, HasSpecificFields,
    ObjectRef, Resolved, UnresolvedReason,
};
use lexkit_model::{
    FieldValue, MetadataSource, ObjectStore, StoreError, StoreResult, TypeDescriptor,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn load_types(&self) -> StoreResult<Vec<TypeDescriptor>> {
        Err(StoreError::Metadata("none".to_string()))
    }
}

fn resolved_entry(concrete: &Concrete) -> &LexEntry {
    match concrete.resolved() {
        Some(Resolved::LexEntry(e)) => e,
        other => panic!("expected a LexEntry view, got {other:?}"),
    }
}

#[test]
fn resolves_entry_with_its_fields() {
    let (mut store, db) = lexicon();
    let id = entry(&mut store, db, "bank");
    let s = sense(&mut store, id, "edge of a river");
    store.set(id, "HomographNumber", FieldValue::Integer(2)).unwrap();

    let registry = lexicon_registry();
    let resolver = ConcreteResolver::new(&registry);
    let concrete = resolver.resolve_id(&store, id).unwrap();

    let view = resolved_entry(&concrete);
    assert_eq!(view.senses, vec![s]);
    assert_eq!(view.homograph_number, 2);
    assert_eq!(view.headword, "bank2");
    assert_eq!(view.short_name(), "bank2");
    assert_eq!(concrete.handle().id(), id);
    assert_eq!(concrete.handle().owner().unwrap().owner, db);
}

#[test]
fn headword_falls_back_to_lexeme_form() {
    let (mut store, db) = lexicon();
    let id = store.create("LexEntry", Some((db, "Entries"))).unwrap();
    let form = store.create("MoStemAllomorph", Some((id, "LexemeForm"))).unwrap();
    store.set(form, "Form", ms(&[("fr", "rive")])).unwrap();

    let registry = lexicon_registry();
    let concrete = ConcreteResolver::new(&registry)
        .resolve_id(&store, id)
        .unwrap();
    assert_eq!(resolved_entry(&concrete).headword, "rive");
}

#[test]
fn headword_placeholder_without_forms() {
    let (mut store, db) = lexicon();
    let id = store.create("LexEntry", Some((db, "Entries"))).unwrap();

    let registry = lexicon_registry();
    let concrete = ConcreteResolver::new(&registry)
        .resolve_id(&store, id)
        .unwrap();
    assert_eq!(resolved_entry(&concrete).headword, "???");
}

#[test]
fn subtypes_resolve_to_nearest_base_view() {
    let (mut store, db) = lexicon();
    let id = store.create("LexEntry", Some((db, "Entries"))).unwrap();
    let stem = store.create("MoStemAllomorph", Some((id, "LexemeForm"))).unwrap();
    let affix = store
        .create("MoAffixAllomorph", Some((id, "AlternateForms")))
        .unwrap();
    let list = store.create("CmPossibilityList", None).unwrap();
    let person = store.create("CmPerson", Some((list, "Possibilities"))).unwrap();

    let registry = lexicon_registry();
    let resolver = ConcreteResolver::new(&registry);

    let is_affix = |id| match resolver.resolve_id(&store, id).unwrap() {
        Concrete::Resolved(Resolved::Allomorph(a)) => Allomorph::is_affix(&a),
        other => panic!("expected an allomorph, got {other:?}"),
    };
    assert!(!is_affix(stem));
    assert!(is_affix(affix));

    let concrete = resolver.resolve_id(&store, person).unwrap();
    assert!(matches!(
        concrete.resolved(),
        Some(Resolved::Possibility(_))
    ));
    assert_eq!(concrete.handle().type_tag(), "CmPerson");
}

#[test]
fn part_of_speech_has_its_own_view() {
    let (mut store, _) = lexicon();
    let pos = part_of_speech(&mut store, "noun");

    let registry = lexicon_registry();
    let concrete = ConcreteResolver::new(&registry)
        .resolve_id(&store, pos)
        .unwrap();
    match concrete.resolved() {
        Some(Resolved::PartOfSpeech(p)) => {
            assert_eq!(p.short_name(), "noun");
            assert_eq!(
                p.specific_field("CatalogSourceId"),
                Some(FieldValue::String(String::new()))
            );
        }
        other => panic!("expected a part of speech, got {other:?}"),
    }
}

#[test]
fn registered_type_without_view_is_unknown() {
    let (store, db) = lexicon();
    let registry = lexicon_registry();
    let resolver = ConcreteResolver::new(&registry);
    let handle = ObjectRef::load(&store, db).unwrap();

    let err = resolver.try_resolve(&store, &handle).unwrap_err();
    assert_eq!(err.reason, UnresolvedReason::NoTypedView);
    assert_eq!(err.handle, handle);

    assert_eq!(resolver.resolve(&store, &handle), Concrete::Unknown(handle));
}

#[test]
fn unknown_type_passes_through() {
    let (mut store, db) = lexicon();
    let id = entry(&mut store, db, "bank");
    let registry = FieldTypeRegistry::new(Arc::new(NoMetadata));
    let resolver = ConcreteResolver::new(&registry);
    let handle = ObjectRef::load(&store, id).unwrap();

    let err = resolver.try_resolve(&store, &handle).unwrap_err();
    assert_eq!(err.reason, UnresolvedReason::UnknownType);

    let concrete = resolver.resolve(&store, &handle);
    assert!(!concrete.is_resolved());
    assert_eq!(concrete.handle(), &handle);
}

#[test]
fn resolution_is_idempotent() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let s = sense(&mut store, e, "edge");
    let registry = lexicon_registry();
    let resolver = ConcreteResolver::new(&registry);

    for id in [db, e, s] {
        let first = resolver.resolve_id(&store, id).unwrap();
        let again = resolver.resolve(&store, first.handle());
        assert_eq!(first, again);
    }
}

#[test]
fn common_fields_come_from_the_handle() {
    let (mut store, db) = lexicon();
    let e = entry(&mut store, db, "bank");
    let handle = ObjectRef::load(&store, e).unwrap();

    assert_eq!(
        handle.common_field("ClassName"),
        Some(FieldValue::String("LexEntry".to_string()))
    );
    assert_eq!(handle.common_field("Owner"), Some(FieldValue::Object(Some(db))));
    assert_eq!(
        handle.common_field("OwningField"),
        Some(FieldValue::String("Entries".to_string()))
    );
    assert_eq!(
        handle.common_field("Guid"),
        Some(FieldValue::String(store.global_id(e).unwrap().to_string()))
    );
    assert_eq!(handle.common_field("Gloss"), None);
}

#[test]
fn missing_object_fails_to_load() {
    let (store, _) = lexicon();
    let registry = lexicon_registry();
    let missing = lexkit_types::ObjectId::new(999);
    assert!(ConcreteResolver::new(&registry)
        .resolve_id(&store, missing)
        .is_err());
}

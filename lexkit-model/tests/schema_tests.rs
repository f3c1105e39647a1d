use lexkit_model::{FieldDescriptor, FieldKind, TypeDescriptor, SYSTEM_FIELDS};
use pretty_assertions::assert_eq;

// ── FieldKind predicates ─────────────────────────────────────────

#[test]
fn owned_and_reference_are_disjoint() {
    for kind in FieldKind::ALL {
        assert!(!(kind.is_owned() && kind.is_reference()), "{kind}");
    }
}

#[test]
fn basic_kinds_are_not_objects() {
    let basic: Vec<_> = FieldKind::ALL.into_iter().filter(|k| k.is_basic()).collect();
    assert_eq!(
        basic,
        vec![
            FieldKind::Boolean,
            FieldKind::Integer,
            FieldKind::String,
            FieldKind::MultiString
        ]
    );
}

#[test]
fn sequences_are_ordered_vectors() {
    assert!(FieldKind::OwnedSequence.is_ordered());
    assert!(FieldKind::ReferenceSequence.is_ordered());
    assert!(!FieldKind::OwnedCollection.is_ordered());
    assert!(FieldKind::OwnedCollection.is_vector());
    assert!(!FieldKind::OwnedAtomic.is_vector());
}

#[test]
fn field_kind_serializes_snake_case() {
    let json = serde_json::to_string(&FieldKind::ReferenceSequence).unwrap();
    assert_eq!(json, "\"reference_sequence\"");
    let kind: FieldKind = serde_json::from_str("\"multi_string\"").unwrap();
    assert_eq!(kind, FieldKind::MultiString);
}

#[test]
fn field_kind_display_is_readable() {
    assert_eq!(FieldKind::MultiString.to_string(), "multilingual string");
    assert_eq!(FieldKind::OwnedAtomic.to_string(), "owned atomic");
}

// ── FieldDescriptor constructors ─────────────────────────────────

#[test]
fn linked_constructors_carry_target() {
    let f = FieldDescriptor::owned_sequence("Senses", "LexSense");
    assert_eq!(f.kind, FieldKind::OwnedSequence);
    assert_eq!(f.target.as_deref(), Some("LexSense"));
    assert!(!f.is_system);
}

#[test]
fn simple_constructors_have_no_target() {
    let f = FieldDescriptor::multi_string("Gloss");
    assert_eq!(f.kind, FieldKind::MultiString);
    assert_eq!(f.target, None);
}

#[test]
fn system_descriptor_is_flagged() {
    let f = FieldDescriptor::system("Guid", FieldKind::String);
    assert!(f.is_system);
    assert!(SYSTEM_FIELDS.contains(&f.name.as_str()));
}

#[test]
fn descriptor_json_omits_defaults() {
    let f = FieldDescriptor::boolean("IsAbstract");
    let json = serde_json::to_value(&f).unwrap();
    assert_eq!(json, serde_json::json!({"name": "IsAbstract", "kind": "boolean"}));
}

// ── TypeDescriptor ───────────────────────────────────────────────

#[test]
fn type_descriptor_field_filters() {
    let t = TypeDescriptor {
        type_tag: "Thing".into(),
        base: None,
        is_abstract: false,
        fields: vec![
            FieldDescriptor::system("Id", FieldKind::Integer),
            FieldDescriptor::string("Label"),
            FieldDescriptor::owned_atomic("Part", "Thing"),
            FieldDescriptor::reference_collection("Links", "Thing"),
        ],
    };

    let mergeable: Vec<_> = t.mergeable_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(mergeable, vec!["Label", "Part", "Links"]);

    let owned: Vec<_> = t.owned_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(owned, vec!["Part"]);

    let refs: Vec<_> = t.reference_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(refs, vec!["Links"]);

    assert!(t.field("Label").is_some());
    assert!(t.field("Missing").is_none());
}

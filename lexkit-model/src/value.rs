use lexkit_types::{Locale, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::FieldKind;

/// A string with one alternative per writing system.
///
/// Empty alternatives are not stored: setting an alternative to `""`
/// removes it, so "empty" and "absent" are the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiString(BTreeMap<Locale, String>);

impl MultiString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a multi-string from `(locale, text)` pairs. Pairs with an
    /// invalid locale tag are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut ms = Self::new();
        for (tag, text) in pairs {
            if let Ok(locale) = Locale::parse(tag) {
                ms.set(locale, text);
            }
        }
        ms
    }

    /// Returns the alternative for `locale`, or `""` when absent.
    pub fn get(&self, locale: &Locale) -> &str {
        self.0.get(locale).map(String::as_str).unwrap_or("")
    }

    /// Sets (or with `""`, clears) the alternative for `locale`.
    pub fn set(&mut self, locale: Locale, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.0.remove(&locale);
        } else {
            self.0.insert(locale, text);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-empty alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Non-empty alternatives in locale order.
    pub fn iter(&self) -> impl Iterator<Item = (&Locale, &str)> {
        self.0.iter().map(|(l, s)| (l, s.as_str()))
    }

    /// First non-empty alternative in `preferred` order, falling back to
    /// the first alternative in locale order.
    pub fn best<'a>(&'a self, preferred: &[Locale]) -> Option<&'a str> {
        preferred
            .iter()
            .find_map(|l| self.0.get(l))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }
}

/// A field value as read from or written to an object store.
///
/// Atomic object kinds use [`FieldValue::Object`]; collection and sequence
/// kinds use [`FieldValue::Objects`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    String(String),
    MultiString(MultiString),
    Object(Option<ObjectId>),
    Objects(Vec<ObjectId>),
}

impl FieldValue {
    /// The empty value a freshly created object holds for a field of `kind`.
    #[must_use]
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean => FieldValue::Bool(false),
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::String => FieldValue::String(String::new()),
            FieldKind::MultiString => FieldValue::MultiString(MultiString::new()),
            FieldKind::OwnedAtomic | FieldKind::ReferenceAtomic => FieldValue::Object(None),
            FieldKind::OwnedCollection
            | FieldKind::ReferenceCollection
            | FieldKind::OwnedSequence
            | FieldKind::ReferenceSequence => FieldValue::Objects(Vec::new()),
        }
    }

    /// True when this value has the shape a field of `kind` stores.
    #[must_use]
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Bool(_), FieldKind::Boolean)
                | (FieldValue::Integer(_), FieldKind::Integer)
                | (FieldValue::String(_), FieldKind::String)
                | (FieldValue::MultiString(_), FieldKind::MultiString)
                | (
                    FieldValue::Object(_),
                    FieldKind::OwnedAtomic | FieldKind::ReferenceAtomic
                )
                | (
                    FieldValue::Objects(_),
                    FieldKind::OwnedCollection
                        | FieldKind::ReferenceCollection
                        | FieldKind::OwnedSequence
                        | FieldKind::ReferenceSequence
                )
        )
    }

    /// True for `false`, `0`, `""`, an empty multi-string, no object or an
    /// empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Bool(b) => !b,
            FieldValue::Integer(i) => *i == 0,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::MultiString(ms) => ms.is_empty(),
            FieldValue::Object(o) => o.is_none(),
            FieldValue::Objects(v) => v.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_multi_string(&self) -> Option<&MultiString> {
        match self {
            FieldValue::MultiString(ms) => Some(ms),
            _ => None,
        }
    }

    /// The handle of an atomic object field (`None` when empty or not atomic).
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            FieldValue::Object(o) => *o,
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&[ObjectId]> {
        match self {
            FieldValue::Objects(v) => Some(v),
            _ => None,
        }
    }

    /// Every object handle this value mentions, in order.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            FieldValue::Object(Some(id)) => vec![*id],
            FieldValue::Objects(ids) => ids.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<MultiString> for FieldValue {
    fn from(ms: MultiString) -> Self {
        FieldValue::MultiString(ms)
    }
}

impl From<Option<ObjectId>> for FieldValue {
    fn from(o: Option<ObjectId>) -> Self {
        FieldValue::Object(o)
    }
}

impl From<Vec<ObjectId>> for FieldValue {
    fn from(v: Vec<ObjectId>) -> Self {
        FieldValue::Objects(v)
    }
}

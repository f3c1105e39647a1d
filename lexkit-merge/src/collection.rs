//! Filterable sequences of wrapped objects.
//!
//! [`WrapperSequence`] supplies the filtering, slicing and reporting
//! operations once; every implementor gets them back typed as itself, so a
//! filtered [`EntryCollection`] still offers the entry-specific filters.
//! All operations leave the receiver untouched.

use lexkit_model::{FieldValue, ObjectStore};
use lexkit_types::{Locale, ObjectId};
use std::collections::HashMap;
use std::fmt::Write;
use std::ops::{Bound, Index, RangeBounds};

use crate::resolve::{ConcreteResolver, Resolved};
use crate::wrapper::ObjectWrapper;
use crate::Result;

/// An ordered sequence of [`ObjectWrapper`]s.
pub trait WrapperSequence: Sized {
    /// Builds a sequence of the implementing type.
    fn from_wrappers(items: Vec<ObjectWrapper>) -> Self;

    fn wrappers(&self) -> &[ObjectWrapper];

    fn len(&self) -> usize {
        self.wrappers().len()
    }

    fn is_empty(&self) -> bool {
        self.wrappers().is_empty()
    }

    fn get(&self, index: usize) -> Option<&ObjectWrapper> {
        self.wrappers().get(index)
    }

    fn iter(&self) -> std::slice::Iter<'_, ObjectWrapper> {
        self.wrappers().iter()
    }

    fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(ObjectWrapper::id).collect()
    }

    /// Members whose runtime type tag is exactly `type_tag`.
    fn by_type(&self, type_tag: &str) -> Self {
        self.filter_where(|w| w.type_tag() == type_tag)
    }

    /// Members satisfying `predicate`.
    fn filter_where(&self, predicate: impl Fn(&ObjectWrapper) -> bool) -> Self {
        Self::from_wrappers(self.iter().filter(|&w| predicate(w)).cloned().collect())
    }

    /// Members in `range`, clamped to the sequence bounds.
    fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        Self::from_wrappers(self.wrappers()[start..end].to_vec())
    }

    /// `(type_tag, count)` pairs, most frequent first, ties by tag.
    fn type_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for w in self.iter() {
            *counts.entry(w.type_tag()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, n)| (tag.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Total count plus one `tag: count (pct%)` line per type.
    fn describe(&self) -> String {
        let total = self.len();
        let mut out = format!("{total} objects");
        for (tag, count) in self.type_counts() {
            let pct = (count as f64 * 100.0 / total as f64).round();
            let _ = write!(out, "\n  {tag}: {count} ({pct}%)");
        }
        out
    }
}

/// Wraps every id in `ids`, in order.
fn load_all(
    store: &dyn ObjectStore,
    ids: &[ObjectId],
    resolver: &ConcreteResolver<'_>,
) -> Result<Vec<ObjectWrapper>> {
    ids.iter()
        .map(|id| ObjectWrapper::with_resolver(store, *id, resolver))
        .collect()
}

macro_rules! wrapper_sequence {
    ($name:ident) => {
        impl WrapperSequence for $name {
            fn from_wrappers(items: Vec<ObjectWrapper>) -> Self {
                Self { items }
            }

            fn wrappers(&self) -> &[ObjectWrapper] {
                &self.items
            }
        }

        impl $name {
            /// Wraps `ids` using the process-wide registry.
            pub fn load(store: &dyn ObjectStore, ids: &[ObjectId]) -> Result<Self> {
                Self::load_with(store, ids, &ConcreteResolver::global())
            }

            pub fn load_with(
                store: &dyn ObjectStore,
                ids: &[ObjectId],
                resolver: &ConcreteResolver<'_>,
            ) -> Result<Self> {
                Ok(Self::from_wrappers(load_all(store, ids, resolver)?))
            }
        }

        impl Index<usize> for $name {
            type Output = ObjectWrapper;

            fn index(&self, index: usize) -> &ObjectWrapper {
                &self.items[index]
            }
        }

        impl FromIterator<ObjectWrapper> for $name {
            fn from_iter<I: IntoIterator<Item = ObjectWrapper>>(iter: I) -> Self {
                Self::from_wrappers(iter.into_iter().collect())
            }
        }

        impl IntoIterator for $name {
            type Item = ObjectWrapper;
            type IntoIter = std::vec::IntoIter<ObjectWrapper>;

            fn into_iter(self) -> Self::IntoIter {
                self.items.into_iter()
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a ObjectWrapper;
            type IntoIter = std::slice::Iter<'a, ObjectWrapper>;

            fn into_iter(self) -> Self::IntoIter {
                self.items.iter()
            }
        }
    };
}

/// General-purpose collection of wrapped objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartCollection {
    items: Vec<ObjectWrapper>,
}

wrapper_sequence!(SmartCollection);

/// Lexical entries, with entry-specific filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryCollection {
    items: Vec<ObjectWrapper>,
}

wrapper_sequence!(EntryCollection);

impl EntryCollection {
    /// Entries whose headword, ignoring the homograph number, is `form`.
    pub fn homographs_of(&self, form: &str) -> Self {
        self.filter_where(|w| match w.concrete().resolved() {
            Some(Resolved::LexEntry(entry)) => {
                entry.headword.trim_end_matches(|c: char| c.is_ascii_digit()) == form
            }
            _ => false,
        })
    }

    /// Entries whose citation form in `locale` is exactly `text`.
    pub fn with_citation_form(&self, locale: &Locale, text: &str) -> Self {
        self.filter_where(|w| match w.concrete().resolved() {
            Some(Resolved::LexEntry(entry)) => entry.citation_form.get(locale) == text,
            _ => false,
        })
    }

    /// Entries that have no senses.
    pub fn without_senses(&self) -> Self {
        self.filter_where(|w| {
            w.get_or_default("Senses", FieldValue::Objects(Vec::new()))
                .is_empty()
        })
    }
}

/// Senses, with sense-specific filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenseCollection {
    items: Vec<ObjectWrapper>,
}

wrapper_sequence!(SenseCollection);

impl SenseCollection {
    /// Senses with at least one example sentence.
    pub fn with_examples(&self) -> Self {
        self.filter_where(|w| {
            !w.get_or_default("Examples", FieldValue::Objects(Vec::new()))
                .is_empty()
        })
    }

    /// Senses tagged with the given part of speech.
    pub fn by_part_of_speech(&self, part_of_speech: ObjectId) -> Self {
        self.filter_where(|w| {
            w.get_or_default("PartOfSpeech", FieldValue::Object(None))
                .as_object()
                == Some(part_of_speech)
        })
    }
}

//! Field-kind registry.
//!
//! Maps runtime type tags to flattened [`TypeDescriptor`]s. The metadata is
//! pulled from a [`MetadataSource`] on the first lookup and cached for the
//! life of the registry; a failed load is cached too, after which every
//! lookup answers `None`.

use lexkit_model::{FieldDescriptor, FieldKind, MetadataSource, SchemaCatalog, TypeDescriptor};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

type TypeTable = HashMap<String, Arc<TypeDescriptor>>;

static GLOBAL: OnceLock<FieldTypeRegistry> = OnceLock::new();

/// Lazily populated type-tag → descriptor table.
pub struct FieldTypeRegistry {
    source: Arc<dyn MetadataSource>,
    cache: OnceLock<Option<TypeTable>>,
}

impl FieldTypeRegistry {
    /// Creates a registry that loads from `source` on first use.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cache: OnceLock::new(),
        }
    }

    /// Registry over an in-memory catalog.
    pub fn from_catalog(catalog: SchemaCatalog) -> Self {
        Self::new(Arc::new(catalog))
    }

    /// The process-wide registry over the built-in lexicon catalog.
    pub fn global() -> &'static FieldTypeRegistry {
        GLOBAL.get_or_init(|| Self::from_catalog(SchemaCatalog::lexicon()))
    }

    fn table(&self) -> Option<&TypeTable> {
        self.cache
            .get_or_init(|| match self.source.load_types() {
                Ok(types) => {
                    debug!("Field registry loaded {} types", types.len());
                    Some(
                        types
                            .into_iter()
                            .map(|t| (t.type_tag.clone(), Arc::new(t)))
                            .collect(),
                    )
                }
                Err(e) => {
                    warn!("Field metadata unavailable, all type lookups will fail: {}", e);
                    None
                }
            })
            .as_ref()
    }

    /// True once the first lookup has happened (successfully or not).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// True when metadata loaded successfully. Triggers the load.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.table().is_some()
    }

    /// The flattened descriptor for `type_tag`.
    pub fn describe(&self, type_tag: &str) -> Option<Arc<TypeDescriptor>> {
        self.table()?.get(type_tag).cloned()
    }

    /// The kind of `field` on `type_tag`.
    pub fn field_kind(&self, type_tag: &str, field: &str) -> Option<FieldKind> {
        self.field(type_tag, field).map(|f| f.kind)
    }

    pub fn field(&self, type_tag: &str, field: &str) -> Option<FieldDescriptor> {
        self.describe(type_tag)?.field(field).cloned()
    }

    /// Non-system fields of `type_tag`, in declaration order. Empty when the
    /// type is unknown.
    pub fn mergeable_fields(&self, type_tag: &str) -> Vec<FieldDescriptor> {
        self.describe(type_tag)
            .map(|t| t.mergeable_fields().cloned().collect())
            .unwrap_or_default()
    }

    /// True when `type_tag` is `ancestor` or derives from it.
    pub fn is_subtype(&self, type_tag: &str, ancestor: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.describe(type_tag);
        while let Some(descriptor) = current {
            if descriptor.type_tag == ancestor {
                return true;
            }
            if !seen.insert(descriptor.type_tag.clone()) {
                return false;
            }
            current = descriptor.base.as_deref().and_then(|b| self.describe(b));
        }
        false
    }

    /// Registered tags, sorted.
    pub fn type_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .table()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }
}

impl std::fmt::Debug for FieldTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTypeRegistry")
            .field("loaded", &self.is_loaded())
            .field(
                "types",
                &self.cache.get().and_then(|c| c.as_ref()).map(|t| t.len()),
            )
            .finish()
    }
}

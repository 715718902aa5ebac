//! Attribute classification per (source type, target type)

use crate::error::CopyError;
use graphcopy_model::{ObjectStore, Part, StructuredType, TypeRef};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// Source and target type of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    /// Type of the original
    pub source: TypeRef,

    /// Type of the copy
    pub target: TypeRef,
}

impl AttributeKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(source: TypeRef, target: TypeRef) -> Self {
        Self { source, target }
    }

    /// Check if source and target are the same type
    #[inline]
    #[must_use]
    pub fn is_same_type(&self) -> bool {
        self.source == self.target
    }
}

impl Display for AttributeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_same_type() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}->{}", self.source, self.target)
        }
    }
}

/// Parts of a source type that are copied onto a target type
///
/// Parts are the source type's parts; the target has a same-named,
/// non-derived part for each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyAttributes {
    compositions: Vec<Part>,
    plain: Vec<Part>,
}

impl CopyAttributes {
    /// Partition the parts of `source` for copying onto `target`
    #[must_use]
    pub fn classify(source: &StructuredType, target: &StructuredType) -> Self {
        let mut attributes = Self::default();
        for part in &source.parts {
            let Some(target_part) = target.part(&part.name) else {
                continue;
            };
            if target_part.derived {
                continue;
            }
            if part.is_composition() {
                attributes.compositions.push(part.clone());
            } else {
                attributes.plain.push(part.clone());
            }
        }
        attributes
    }

    /// Composition references to descend into
    #[inline]
    #[must_use]
    pub fn compositions(&self) -> &[Part] {
        &self.compositions
    }

    /// Properties and non-owning references
    #[inline]
    #[must_use]
    pub fn plain(&self) -> &[Part] {
        &self.plain
    }

    /// Names of the plain parts
    #[must_use]
    pub fn plain_names(&self) -> Vec<&str> {
        self.plain.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Cache of classifications, one per type pair
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: HashMap<AttributeKey, Rc<CopyAttributes>>,
}

impl AttributeCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached classification for `key`, computed on first request
    ///
    /// # Errors
    /// Returns error if the store does not know either type
    pub fn get_or_classify(
        &mut self,
        store: &dyn ObjectStore,
        key: AttributeKey,
    ) -> Result<Rc<CopyAttributes>, CopyError> {
        if let Some(cached) = self.entries.get(&key) {
            return Ok(Rc::clone(cached));
        }
        let source = store.structured_type(key.source)?;
        let attributes = if key.is_same_type() {
            CopyAttributes::classify(source, source)
        } else {
            CopyAttributes::classify(source, store.structured_type(key.target)?)
        };
        tracing::trace!(
            %key,
            compositions = attributes.compositions.len(),
            plain = attributes.plain.len(),
            "classified attributes"
        );
        let attributes = Rc::new(attributes);
        self.entries.insert(key, Rc::clone(&attributes));
        Ok(attributes)
    }

    /// Number of cached classifications
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

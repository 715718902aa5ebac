//! Allocation context

use graphcopy_model::{ObjectRef, PartKey};

/// Where a copy is being allocated
///
/// The container is the *copy* that will hold the new object, the relation
/// the composition reference it is reached through. Both are `None` for a
/// root copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyContext {
    /// Copy that owns the new object
    pub container: Option<ObjectRef>,

    /// Composition reference leading to the new object
    pub relation: Option<PartKey>,
}

impl CopyContext {
    /// Context of a root copy
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Context of a child reached through `relation` of `container`
    #[inline]
    #[must_use]
    pub fn within(container: ObjectRef, relation: PartKey) -> Self {
        Self {
            container: Some(container),
            relation: Some(relation),
        }
    }

    /// Check if this is a root context
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.container.is_none()
    }
}

//! Top-level copy operation

use crate::context::CopyContext;
use crate::driver::OperationCore;
use crate::error::CopyError;
use crate::hooks::{CopyConstructor, CopyFilter};
use crate::memo::MemoEntry;
use crate::nested::NestedOperation;
use crate::operation::CopyOperation;
use crate::options::{CopyOptions, CopyStats};
use graphcopy_model::{ObjectRef, ObjectStore, Value};

/// Copy operation owning its memo, caches and pending batches
///
/// Holds the store for its whole lifetime; drop the operation to use the
/// store again.
///
/// # Example
///
/// ```rust,ignore
/// let mut op = InitialOperation::new(&mut store).with_filter(RejectParts::new(["owner"]));
/// let copy = op.copy_reference(folder)?;
/// op.finish()?;
/// ```
pub struct InitialOperation<'s> {
    store: &'s mut dyn ObjectStore,
    core: OperationCore<'s>,
    context: CopyContext,
}

impl<'s> InitialOperation<'s> {
    /// Create operation with default hooks and options
    pub fn new(store: &'s mut dyn ObjectStore) -> Self {
        Self {
            store,
            core: OperationCore::new(),
            context: CopyContext::root(),
        }
    }

    /// With filter
    ///
    /// Hooks and options should be configured before the first copy; later
    /// changes only affect work that is still pending.
    #[must_use]
    pub fn with_filter(mut self, filter: impl CopyFilter + 's) -> Self {
        self.warn_if_started("filter");
        self.core.filter = Box::new(filter);
        self
    }

    /// With constructor
    #[must_use]
    pub fn with_constructor(mut self, constructor: impl CopyConstructor + 's) -> Self {
        self.warn_if_started("constructor");
        self.core.constructor = Box::new(constructor);
        self
    }

    /// Force copies transient or persistent
    #[must_use]
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.warn_if_started("transient");
        self.core.options.transient = Some(transient);
        self
    }

    /// With options
    ///
    /// A transient override already set is kept unless `options` carries
    /// its own.
    #[must_use]
    pub fn with_options(mut self, options: CopyOptions) -> Self {
        self.warn_if_started("options");
        let transient = options.transient.or(self.core.options.transient);
        self.core.options = CopyOptions { transient, ..options };
        self
    }

    /// Effective options
    #[inline]
    #[must_use]
    pub fn options(&self) -> CopyOptions {
        self.core.options
    }

    /// Start a copy from a different contextual root
    ///
    /// The nested operation shares this operation's memo and pending
    /// batches, so originals already copied here are not copied again.
    pub fn nested(&mut self, context: CopyContext) -> NestedOperation<'_, 's> {
        NestedOperation::new(self, context)
    }

    /// Counters so far
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CopyStats {
        self.core.stats()
    }

    /// Registered originals and their copies, in registration order
    pub fn copies(&self) -> impl Iterator<Item = &MemoEntry> {
        self.core.entries()
    }

    /// Read access to the store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn ObjectStore {
        &*self.store
    }

    pub(crate) fn copy_reference_in(
        &mut self,
        orig: ObjectRef,
        context: &CopyContext,
    ) -> Result<ObjectRef, CopyError> {
        self.core.create_copy(&mut *self.store, orig, context)
    }

    pub(crate) fn copy_value_in(
        &mut self,
        value: &Value,
        context: &CopyContext,
    ) -> Result<Value, CopyError> {
        self.core.copy_value(&mut *self.store, value, context)
    }

    fn warn_if_started(&self, setting: &str) {
        if self.core.has_started() {
            tracing::warn!(setting, "configuration changed after copying started");
        }
    }
}

impl CopyOperation for InitialOperation<'_> {
    fn set_context(&mut self, context: CopyContext) -> CopyContext {
        std::mem::replace(&mut self.context, context)
    }

    fn context(&self) -> &CopyContext {
        &self.context
    }

    fn copy_reference(&mut self, orig: ObjectRef) -> Result<ObjectRef, CopyError> {
        self.core.create_copy(&mut *self.store, orig, &self.context)
    }

    fn copy_value(&mut self, value: &Value) -> Result<Value, CopyError> {
        self.core.copy_value(&mut *self.store, value, &self.context)
    }

    fn finish(&mut self) -> Result<(), CopyError> {
        self.core.finish(&mut *self.store)
    }

    fn resolve_copy(&self, orig: ObjectRef) -> Option<ObjectRef> {
        self.core.resolve(orig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcopy_model::{MemoryStore, TypeKind};

    fn note_type(store: &mut MemoryStore) -> graphcopy_model::TypeRef {
        store
            .define("Note", TypeKind::Class)
            .property("text")
            .build()
            .unwrap()
    }

    #[test]
    fn options_merge_transient_override() {
        let mut store = MemoryStore::new();
        let op = InitialOperation::new(&mut store)
            .with_transient(false)
            .with_options(CopyOptions::new());
        assert_eq!(op.options().transient, Some(false));

        let op = op.with_options(CopyOptions::new().with_transient(true));
        assert_eq!(op.options().transient, Some(true));
    }

    #[test]
    fn settings_changed_after_start_apply_to_later_copies() {
        let mut store = MemoryStore::new();
        let note = note_type(&mut store);
        let first = store.create(note).unwrap();
        let second = store.create(note).unwrap();

        let mut op = InitialOperation::new(&mut store);
        let first_copy = op.copy(first).unwrap();
        let mut op = op
            .with_transient(true)
            .with_options(CopyOptions::new().with_preload(false));
        let second_copy = op.copy(second).unwrap();

        assert!(!op.store().is_transient(first_copy).unwrap());
        assert!(op.store().is_transient(second_copy).unwrap());
        assert_eq!(op.stats().preloads, 1);
    }
}

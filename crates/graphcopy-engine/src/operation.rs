//! Copy operation contract

use crate::context::CopyContext;
use crate::error::CopyError;
use graphcopy_model::{ObjectRef, Value};

/// A deep-copy operation
///
/// Copying is two-phase. [`CopyOperation::copy_reference`] allocates and
/// returns the copy right away but leaves it empty; [`CopyOperation::finish`]
/// populates everything allocated so far. Splitting the phases lets the
/// engine read values in batches, with one bulk preload per batch.
pub trait CopyOperation {
    /// Replace the context used for subsequent root allocations
    ///
    /// Returns the previous context so the caller can restore it.
    fn set_context(&mut self, context: CopyContext) -> CopyContext;

    /// Context used for root allocations
    fn context(&self) -> &CopyContext;

    /// Copy of `orig`, allocated if `orig` was not seen before
    ///
    /// The copy is not populated until [`CopyOperation::finish`] runs.
    /// Originals that are not class instances, or whose type no longer
    /// exists, are returned unchanged.
    fn copy_reference(&mut self, orig: ObjectRef) -> Result<ObjectRef, CopyError>;

    /// Copy every object in `value`, keeping its collection category
    ///
    /// Like [`CopyOperation::copy_reference`], copies stay unpopulated until
    /// [`CopyOperation::finish`].
    fn copy_value(&mut self, value: &Value) -> Result<Value, CopyError>;

    /// Populate all pending copies
    ///
    /// Calling it again with nothing pending does nothing.
    fn finish(&mut self) -> Result<(), CopyError>;

    /// Copy registered for `orig`, if any
    fn resolve_copy(&self, orig: ObjectRef) -> Option<ObjectRef>;

    /// Allocate and populate in one go
    fn copy(&mut self, orig: ObjectRef) -> Result<ObjectRef, CopyError> {
        let copy = self.copy_reference(orig)?;
        self.finish()?;
        Ok(copy)
    }
}

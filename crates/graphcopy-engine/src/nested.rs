//! Nested copy operation

use crate::context::CopyContext;
use crate::error::CopyError;
use crate::initial::InitialOperation;
use crate::operation::CopyOperation;
use graphcopy_model::{ObjectRef, Value};

/// Copy operation borrowing an outer operation's state
///
/// Root allocations use the nested operation's own context; memo, hooks and
/// pending batches belong to the outer operation. [`CopyOperation::finish`]
/// drains everything pending on the outer operation.
pub struct NestedOperation<'op, 's> {
    outer: &'op mut InitialOperation<'s>,
    context: CopyContext,
}

impl<'op, 's> NestedOperation<'op, 's> {
    pub(crate) fn new(outer: &'op mut InitialOperation<'s>, context: CopyContext) -> Self {
        Self { outer, context }
    }
}

impl CopyOperation for NestedOperation<'_, '_> {
    fn set_context(&mut self, context: CopyContext) -> CopyContext {
        std::mem::replace(&mut self.context, context)
    }

    fn context(&self) -> &CopyContext {
        &self.context
    }

    fn copy_reference(&mut self, orig: ObjectRef) -> Result<ObjectRef, CopyError> {
        self.outer.copy_reference_in(orig, &self.context)
    }

    fn copy_value(&mut self, value: &Value) -> Result<Value, CopyError> {
        self.outer.copy_value_in(value, &self.context)
    }

    fn finish(&mut self) -> Result<(), CopyError> {
        self.outer.finish()
    }

    fn resolve_copy(&self, orig: ObjectRef) -> Option<ObjectRef> {
        self.outer.resolve_copy(orig)
    }
}

//! Filter and constructor hooks
//!
//! Provides [`CopyFilter`] to leave parts out of a copy and
//! [`CopyConstructor`] to take over allocation of copies.

use crate::context::CopyContext;
use crate::error::CopyError;
use graphcopy_model::{ObjectRef, ObjectStore, Part, Value};
use std::collections::HashSet;
use std::fmt;

/// Decides whether a part value is copied
pub trait CopyFilter {
    /// Accept `value` of `part` read from the original `owner`
    ///
    /// A rejected part is never written on the copy; it keeps whatever the
    /// allocation left there.
    fn accept(&self, part: &Part, value: &Value, owner: ObjectRef) -> bool;
}

/// Filter accepting every part
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CopyFilter for AcceptAll {
    #[inline]
    fn accept(&self, _part: &Part, _value: &Value, _owner: ObjectRef) -> bool {
        true
    }
}

/// Filter rejecting parts by name, on any type
#[derive(Debug, Clone, Default)]
pub struct RejectParts {
    names: HashSet<String>,
}

impl RejectParts {
    /// Reject the given part names
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl CopyFilter for RejectParts {
    fn accept(&self, part: &Part, _value: &Value, _owner: ObjectRef) -> bool {
        !self.names.contains(&part.name)
    }
}

/// Filter backed by a closure, see [`filter_fn`]
pub struct FnFilter<F>(F);

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFilter")
    }
}

impl<F> CopyFilter for FnFilter<F>
where
    F: Fn(&Part, &Value, ObjectRef) -> bool,
{
    #[inline]
    fn accept(&self, part: &Part, value: &Value, owner: ObjectRef) -> bool {
        (self.0)(part, value, owner)
    }
}

/// Build a filter from a closure
pub fn filter_fn<F>(f: F) -> FnFilter<F>
where
    F: Fn(&Part, &Value, ObjectRef) -> bool,
{
    FnFilter(f)
}

/// Allocates the copy of an original
pub trait CopyConstructor {
    /// Allocate the copy of `orig`
    ///
    /// `Ok(None)` means no opinion: the engine's default allocation runs.
    /// A returned object is populated like a freshly allocated one.
    fn allocate(
        &self,
        orig: ObjectRef,
        context: &CopyContext,
        store: &mut dyn ObjectStore,
    ) -> Result<Option<ObjectRef>, CopyError>;
}

/// Constructor deferring every allocation to the engine
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructor;

impl CopyConstructor for DefaultConstructor {
    #[inline]
    fn allocate(
        &self,
        _orig: ObjectRef,
        _context: &CopyContext,
        _store: &mut dyn ObjectStore,
    ) -> Result<Option<ObjectRef>, CopyError> {
        Ok(None)
    }
}

/// Constructor backed by a closure, see [`constructor_fn`]
pub struct FnConstructor<F>(F);

impl<F> fmt::Debug for FnConstructor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnConstructor")
    }
}

impl<F> CopyConstructor for FnConstructor<F>
where
    F: Fn(ObjectRef, &CopyContext, &mut dyn ObjectStore) -> Result<Option<ObjectRef>, CopyError>,
{
    #[inline]
    fn allocate(
        &self,
        orig: ObjectRef,
        context: &CopyContext,
        store: &mut dyn ObjectStore,
    ) -> Result<Option<ObjectRef>, CopyError> {
        (self.0)(orig, context, store)
    }
}

/// Build a constructor from a closure
pub fn constructor_fn<F>(f: F) -> FnConstructor<F>
where
    F: Fn(ObjectRef, &CopyContext, &mut dyn ObjectStore) -> Result<Option<ObjectRef>, CopyError>,
{
    FnConstructor(f)
}

//! Object store contract and scoped bulk preload
//!
//! Provides the [`ObjectStore`] trait the copy engine runs against, and
//! [`PreloadScope`], the guard that pairs every preload with its release.

use crate::ids::{ObjectRef, TypeRef};
use crate::schema::StructuredType;
use crate::value::Value;
use std::ops::{Deref, DerefMut};

/// Token identifying one open preload
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreloadTicket(pub u64);

/// Storage collaborator of the copy engine
///
/// Implementations resolve handles, read and write part values, allocate
/// instances and answer version questions. All calls are blocking.
pub trait ObjectStore {
    /// Metadata of a type
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownType`] for handles the store never issued
    fn structured_type(&self, ty: TypeRef) -> Result<&StructuredType, StoreError>;

    /// Live version of a type, `None` when the type was removed
    fn current_type(&self, ty: TypeRef) -> Result<Option<TypeRef>, StoreError>;

    /// Runtime type of an object revision
    fn type_of(&self, obj: ObjectRef) -> Result<TypeRef, StoreError>;

    /// Whether the object lives outside of the persistent store
    fn is_transient(&self, obj: ObjectRef) -> Result<bool, StoreError>;

    /// Read a part value; unset parts read as [`Value::Null`]
    fn get(&self, obj: ObjectRef, part: &str) -> Result<Value, StoreError>;

    /// Write a part value
    fn set(&mut self, obj: ObjectRef, part: &str, value: Value) -> Result<(), StoreError>;

    /// Create a fresh instance of a class type
    fn allocate(
        &mut self,
        ty: TypeRef,
        transient: bool,
        container: Option<ObjectRef>,
    ) -> Result<ObjectRef, StoreError>;

    /// Live revision of an object
    fn current_version(&self, obj: ObjectRef) -> Result<ObjectRef, StoreError>;

    /// Make subsequent reads of `parts` on `objects` cheap
    fn preload(&mut self, objects: &[ObjectRef], parts: &[&str])
        -> Result<PreloadTicket, StoreError>;

    /// Close a preload opened by [`ObjectStore::preload`]
    fn release(&mut self, ticket: PreloadTicket);
}

/// Scoped preload
///
/// Derefs to the store so reads inside the scope go through the guard.
/// The preload is released on drop, whichever way the scope is left.
#[derive(Debug)]
pub struct PreloadScope<'a, S: ObjectStore + ?Sized> {
    store: &'a mut S,
    ticket: Option<PreloadTicket>,
}

impl<'a, S: ObjectStore + ?Sized> PreloadScope<'a, S> {
    /// Open a preload for `parts` of `objects`
    ///
    /// # Errors
    /// Propagates the store's preload failure; nothing is left open then
    pub fn open(store: &'a mut S, objects: &[ObjectRef], parts: &[&str]) -> Result<Self, StoreError> {
        let ticket = store.preload(objects, parts)?;
        Ok(Self {
            store,
            ticket: Some(ticket),
        })
    }

    /// Scope that issues no preload at all
    #[inline]
    pub fn unloaded(store: &'a mut S) -> Self {
        Self {
            store,
            ticket: None,
        }
    }

    /// Check if a preload is held
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.ticket.is_some()
    }
}

impl<S: ObjectStore + ?Sized> Deref for PreloadScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: ObjectStore + ?Sized> DerefMut for PreloadScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: ObjectStore + ?Sized> Drop for PreloadScope<'_, S> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.store.release(ticket);
        }
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Object handle does not resolve
    #[error("unknown object: {0}")]
    UnknownObject(ObjectRef),

    /// Type handle does not resolve
    #[error("unknown type: {0}")]
    UnknownType(TypeRef),

    /// Type has no part of that name
    #[error("type {ty} has no part '{part}'")]
    UnknownPart {
        /// Owning type
        ty: TypeRef,
        /// Part name
        part: String,
    },

    /// Part is computed and cannot be written
    #[error("part '{part}' of {ty} is derived")]
    DerivedPart {
        /// Owning type
        ty: TypeRef,
        /// Part name
        part: String,
    },

    /// Type cannot have instances
    #[error("type {0} cannot be instantiated")]
    NotInstantiable(TypeRef),

    /// Historic revisions are read-only
    #[error("revision {0} is read-only")]
    ReadOnlyRevision(ObjectRef),

    /// Schema definition rejected
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Schema document could not be decoded
    #[error("schema decoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

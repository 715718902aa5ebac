//! graphcopy model
//!
//! Contracts between the copy engine and the system that owns the objects.
//!
//! # Core Concepts
//!
//! - [`ObjectRef`]: Handle of one revision of an object
//! - [`StructuredType`] / [`Part`]: Type metadata, parts are properties or references
//! - [`Value`]: Part values, scalars, object references and collections
//! - [`ObjectStore`]: Value access, allocation, version resolution and bulk preload
//! - [`PreloadScope`]: Guard pairing a preload with its release
//! - [`MemoryStore`]: In-memory reference implementation of [`ObjectStore`]
//!
//! # Example
//!
//! ```rust,ignore
//! use graphcopy_model::{MemoryStore, ObjectStore, TypeKind};
//!
//! let mut store = MemoryStore::new();
//! let folder = store
//!     .define("Folder", TypeKind::Class)
//!     .property("name")
//!     .composition("documents")
//!     .build()?;
//!
//! let obj = store.create(folder)?;
//! store.set(obj, "name", "inbox".into())?;
//! ```

#![warn(unreachable_pub)]

mod ids;
mod memory;
mod schema;
mod store;
mod value;

pub use ids::{ObjectId, ObjectRef, Revision, TypeRef};
pub use memory::{MemoryStore, PreloadRecord, TypeBuilder};
pub use schema::{
    HistoryType, Part, PartKey, PartKind, StructuredType, TypeKind, UnknownHistoryType,
};
pub use store::{ObjectStore, PreloadScope, PreloadTicket, StoreError};
pub use value::Value;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! graphcopy engine
//!
//! Deep copy of typed object graphs. A root object is copied together with
//! everything it owns through composition references; non-owning references
//! are rewritten to point at copies where those exist.
//!
//! # Core Concepts
//!
//! - [`CopyOperation`]: Two-phase contract, allocate with `copy_reference`, populate with `finish`
//! - [`InitialOperation`]: Top-level operation owning memo, caches and batches
//! - [`NestedOperation`]: Copy from another contextual root, sharing the outer memo
//! - [`CopyFilter`] / [`CopyConstructor`]: Hooks to omit parts and take over allocation
//! - [`CopyAttributes`]: Composition and plain parts per (source, target) type pair
//! - [`BatchScheduler`]: Groups work so one preload covers a whole batch
//!
//! # Example
//!
//! ```rust,ignore
//! use graphcopy_engine::{CopyOperation, InitialOperation};
//! use graphcopy_model::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! // ... define types, create `folder` ...
//! let mut op = InitialOperation::new(&mut store);
//! let copy = op.copy_reference(folder)?;
//! op.finish()?;
//! ```

#![warn(unreachable_pub)]

mod attributes;
mod batch;
mod context;
mod driver;
mod error;
mod hooks;
mod initial;
mod memo;
mod nested;
mod operation;
mod options;

pub use attributes::{AttributeCache, AttributeKey, CopyAttributes};
pub use batch::{BatchScheduler, DescendBatch, DescendRound, ValueBatch, ValueRound};
pub use context::CopyContext;
pub use error::CopyError;
pub use hooks::{
    constructor_fn, filter_fn, AcceptAll, CopyConstructor, CopyFilter, DefaultConstructor,
    FnConstructor, FnFilter, RejectParts,
};
pub use initial::InitialOperation;
pub use memo::{EntryId, IdentityMemo, MemoEntry};
pub use nested::NestedOperation;
pub use operation::CopyOperation;
pub use options::{CopyOptions, CopyStats};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running copy operations
    pub use crate::{
        CopyContext, CopyError, CopyFilter, CopyConstructor, CopyOperation, CopyOptions,
        InitialOperation, RejectParts,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for the copy engine
//!
//! The engine adds no recovery of its own: store and hook failures are
//! wrapped and returned as they are.

use graphcopy_model::{ObjectRef, StoreError};

/// Copy operation error
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Store call failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Custom constructor refused to allocate
    #[error("constructor failed for {orig}: {reason}")]
    Constructor {
        /// Original whose copy was requested
        orig: ObjectRef,
        /// Message from the hook
        reason: String,
    },

    /// Options document could not be decoded
    #[error("invalid copy options: {0}")]
    Options(#[from] toml::de::Error),
}

impl CopyError {
    /// Create constructor failure
    #[inline]
    pub fn constructor(orig: ObjectRef, reason: impl Into<String>) -> Self {
        Self::Constructor {
            orig,
            reason: reason.into(),
        }
    }
}

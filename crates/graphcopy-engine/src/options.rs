//! Copy options and statistics

use crate::error::CopyError;
use serde::{Deserialize, Serialize};

/// Operation-wide settings
///
/// Can be loaded from TOML:
///
/// ```toml
/// transient = true
/// preload = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyOptions {
    /// Force copies transient (`true`) or persistent (`false`);
    /// `None` inherits each original's own status
    #[serde(default)]
    pub transient: Option<bool>,

    /// Issue bulk preloads before reading batches
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_preload() -> bool {
    true
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            transient: None,
            preload: true,
        }
    }
}

impl CopyOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document
    ///
    /// # Errors
    /// Returns [`CopyError::Options`] on malformed input or unknown keys
    pub fn from_toml_str(s: &str) -> Result<Self, CopyError> {
        Ok(toml::from_str(s)?)
    }

    /// With transient override
    #[inline]
    #[must_use]
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = Some(transient);
        self
    }

    /// With preloading switched on or off
    #[inline]
    #[must_use]
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}

/// Counters of one copy operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Originals registered in the memo
    pub originals: usize,

    /// New objects allocated
    pub allocated: usize,

    /// Originals kept as their own copy
    pub passed_through: usize,

    /// Composition drain rounds
    pub rounds: usize,

    /// Descend batches processed
    pub descend_batches: usize,

    /// Value batches processed
    pub value_batches: usize,

    /// Preloads issued
    pub preloads: usize,
}

//! Handles for objects, object revisions and types
//!
//! Handles are plain copyable values. They carry no data of their own; an
//! [`ObjectStore`](crate::ObjectStore) resolves them.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable identity of an object across all of its revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Handle of a structured type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub u32);

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Which revision of an object a handle points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Revision {
    /// The live object
    #[default]
    Current,

    /// A frozen point-in-time snapshot
    Historic(u32),
}

/// Handle of one revision of an object
///
/// Two handles with the same [`ObjectId`] but different revisions are
/// different originals as far as copying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object identity
    pub id: ObjectId,

    /// Revision of the object
    pub revision: Revision,
}

impl ObjectRef {
    /// Handle of the live object
    #[inline]
    #[must_use]
    pub fn current(id: ObjectId) -> Self {
        Self {
            id,
            revision: Revision::Current,
        }
    }

    /// Handle of a historic snapshot
    #[inline]
    #[must_use]
    pub fn historic(id: ObjectId, revision: u32) -> Self {
        Self {
            id,
            revision: Revision::Historic(revision),
        }
    }

    /// Check if handle points at the live object
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        matches!(self.revision, Revision::Current)
    }

    /// Same object, live revision
    #[inline]
    #[must_use]
    pub fn to_current(self) -> Self {
        Self::current(self.id)
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.revision {
            Revision::Current => write!(f, "{}", self.id),
            Revision::Historic(rev) => write!(f, "{}@{rev}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ref_display() {
        let live = ObjectRef::current(ObjectId(7));
        let old = ObjectRef::historic(ObjectId(7), 2);
        assert_eq!(live.to_string(), "obj#7");
        assert_eq!(old.to_string(), "obj#7@2");
        assert_eq!(TypeRef(3).to_string(), "type#3");
    }

    #[test]
    fn historic_and_current_are_distinct() {
        let live = ObjectRef::current(ObjectId(1));
        let old = ObjectRef::historic(ObjectId(1), 0);
        assert_ne!(live, old);
        assert!(!old.is_current());
        assert_eq!(old.to_current(), live);
    }
}

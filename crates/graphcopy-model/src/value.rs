//! Part values

use crate::ids::ObjectRef;
use indexmap::IndexSet;
use std::hash::{Hash, Hasher};

/// Value stored in a part
///
/// Collections own their elements; cloning a value never aliases the
/// original collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Text
    Text(String),

    /// Reference to an object revision
    Object(ObjectRef),

    /// Insertion-ordered list
    List(Vec<Value>),

    /// Insertion-ordered set
    Set(IndexSet<Value>),
}

// Set equality ignores order, so sets hash by length only.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Text(s) => s.hash(state),
            Self::Object(o) => o.hash(state),
            Self::List(items) => items.hash(state),
            Self::Set(items) => items.len().hash(state),
        }
    }
}

impl Value {
    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Single object reference, if this is one
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// Text content, if this is text
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// All object references held directly or in a collection
    #[must_use]
    pub fn objects(&self) -> Vec<ObjectRef> {
        match self {
            Self::Object(o) => vec![*o],
            Self::List(items) => items.iter().filter_map(Self::as_object).collect(),
            Self::Set(items) => items.iter().filter_map(Self::as_object).collect(),
            _ => Vec::new(),
        }
    }

    /// Build a list of object references
    #[must_use]
    pub fn object_list(objects: impl IntoIterator<Item = ObjectRef>) -> Self {
        Self::List(objects.into_iter().map(Self::Object).collect())
    }

    /// Build a set of object references
    #[must_use]
    pub fn object_set(objects: impl IntoIterator<Item = ObjectRef>) -> Self {
        Self::Set(objects.into_iter().map(Self::Object).collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

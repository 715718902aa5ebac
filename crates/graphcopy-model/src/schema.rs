//! Type metadata: structured types and their parts

use crate::ids::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Version semantics of a non-composition reference
///
/// The set is closed. Decoding any other tag fails with
/// [`UnknownHistoryType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryType {
    /// Keep the exact revision that was referenced
    Historic,

    /// Historic when the target was not copied
    Mixed,

    /// Always point at the live revision
    Current,
}

impl HistoryType {
    /// Tag used in schema documents
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Historic => "historic",
            Self::Mixed => "mixed",
            Self::Current => "current",
        }
    }
}

impl Display for HistoryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryType {
    type Err = UnknownHistoryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historic" => Ok(Self::Historic),
            "mixed" => Ok(Self::Mixed),
            "current" => Ok(Self::Current),
            other => Err(UnknownHistoryType(other.to_string())),
        }
    }
}

/// History tag outside of the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown history type: {0}")]
pub struct UnknownHistoryType(pub String);

/// Kind of a structured type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Class-like data type; instances are copied
    Class,

    /// Enumeration; literals are shared, never copied
    Enumeration,

    /// Primitive datatype
    Primitive,
}

/// What a part holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartKind {
    /// Plain property value
    Property,

    /// Reference to other objects
    Reference {
        /// Targets are owned by the holder
        composite: bool,

        /// Version semantics when the target is not copied
        history: HistoryType,
    },
}

/// Identity of a part: the type that declares it plus its name
///
/// Subtypes inherit parts with their original declaring type, so every
/// object sharing a reference shares its key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartKey {
    /// Declaring type
    pub declaring: TypeRef,

    /// Part name
    pub name: String,
}

impl Display for PartKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring, self.name)
    }
}

/// A named, typed part of a structured type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Part {
    /// Part name, unique within a type
    pub name: String,

    /// Type that declares the part
    pub declaring: TypeRef,

    /// Computed, not stored
    #[serde(default)]
    pub derived: bool,

    /// Property or reference
    pub kind: PartKind,
}

impl Part {
    /// Plain property
    #[must_use]
    pub fn property(declaring: TypeRef, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring,
            derived: false,
            kind: PartKind::Property,
        }
    }

    /// Non-owning reference
    #[must_use]
    pub fn reference(declaring: TypeRef, name: impl Into<String>, history: HistoryType) -> Self {
        Self {
            name: name.into(),
            declaring,
            derived: false,
            kind: PartKind::Reference {
                composite: false,
                history,
            },
        }
    }

    /// Owning (composition) reference
    #[must_use]
    pub fn composition(declaring: TypeRef, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring,
            derived: false,
            kind: PartKind::Reference {
                composite: true,
                history: HistoryType::Current,
            },
        }
    }

    /// Mark part as derived
    #[inline]
    #[must_use]
    pub fn into_derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Check if part is a composition reference
    #[inline]
    #[must_use]
    pub fn is_composition(&self) -> bool {
        matches!(self.kind, PartKind::Reference { composite: true, .. })
    }

    /// Identity of this part
    #[must_use]
    pub fn key(&self) -> PartKey {
        PartKey {
            declaring: self.declaring,
            name: self.name.clone(),
        }
    }
}

/// A structured type with its flattened part list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredType {
    /// Type handle
    pub id: TypeRef,

    /// Type name
    pub name: String,

    /// Type kind
    pub kind: TypeKind,

    /// All parts, inherited ones included
    pub parts: Vec<Part>,
}

impl StructuredType {
    /// Lookup part by name
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Check if instances are copyable data objects
    #[inline]
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_type_parse() {
        assert_eq!("current".parse::<HistoryType>(), Ok(HistoryType::Current));
        assert_eq!("mixed".parse::<HistoryType>(), Ok(HistoryType::Mixed));
        assert_eq!(
            "sometimes".parse::<HistoryType>(),
            Err(UnknownHistoryType("sometimes".to_string()))
        );
    }

    #[test]
    fn history_type_serde_rejects_unknown_tag() {
        let ok: HistoryType = serde_json::from_str("\"historic\"").unwrap();
        assert_eq!(ok, HistoryType::Historic);
        assert!(serde_json::from_str::<HistoryType>("\"eventual\"").is_err());
    }

    #[test]
    fn composition_part() {
        let part = Part::composition(TypeRef(1), "children");
        assert!(part.is_composition());
        assert!(!Part::reference(TypeRef(1), "owner", HistoryType::Current).is_composition());
        assert!(!Part::property(TypeRef(1), "name").is_composition());
    }

    #[test]
    fn part_key_display() {
        let key = Part::property(TypeRef(4), "title").key();
        assert_eq!(key.to_string(), "type#4.title");
    }

    #[test]
    fn structured_type_part_lookup() {
        let ty = StructuredType {
            id: TypeRef(0),
            name: "Folder".to_string(),
            kind: TypeKind::Class,
            parts: vec![Part::property(TypeRef(0), "name")],
        };
        assert!(ty.part("name").is_some());
        assert!(ty.part("missing").is_none());
        assert!(ty.is_class());
    }
}

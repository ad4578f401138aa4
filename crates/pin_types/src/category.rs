// Pin Categories - Top-level discriminators of a pin's type
//
// Categories are string-keyed on the wire (`"int"`, `"struct"`, ...) so that
// application-specific tags can pass through untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────────────────

/// Application-specific key that is never one of the reserved ones
///
/// Only `PinCategory::from_key` and `SubCategory::from_tag` build these, so a
/// reserved key always parses to its own variant and survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomTag(String);

impl CustomTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CustomTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Category tag of a pin type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PinCategory {
    /// Execution flow (no data)
    Exec,
    Boolean,
    /// 8-bit number, or an enumeration when a nominal enum is attached
    Byte,
    Int,
    Float,
    Name,
    String,
    /// Localizable text
    Text,
    /// Object reference (class or interface attached)
    Object,
    /// Class reference (meta class attached)
    Class,
    /// Value struct (record type attached)
    Struct,
    /// Single-cast delegate (function signature attached)
    Delegate,
    /// Multicast delegate (function signature attached)
    MulticastDelegate,
    /// Unresolved type that unifies with whatever it is connected to
    Wildcard,
    /// Result of a malformed type description; never compatible with anything
    BadType,
    /// Application-specific tag, only ever equal to itself
    Other(CustomTag),
}

impl PinCategory {
    /// Every built-in category except `BadType`, in declaration order
    pub const BUILTIN: [PinCategory; 14] = [
        PinCategory::Exec,
        PinCategory::Boolean,
        PinCategory::Byte,
        PinCategory::Int,
        PinCategory::Float,
        PinCategory::Name,
        PinCategory::String,
        PinCategory::Text,
        PinCategory::Object,
        PinCategory::Class,
        PinCategory::Struct,
        PinCategory::Delegate,
        PinCategory::MulticastDelegate,
        PinCategory::Wildcard,
    ];

    /// Wire key of this category
    pub fn as_str(&self) -> &str {
        match self {
            PinCategory::Exec => "exec",
            PinCategory::Boolean => "bool",
            PinCategory::Byte => "byte",
            PinCategory::Int => "int",
            PinCategory::Float => "float",
            PinCategory::Name => "name",
            PinCategory::String => "string",
            PinCategory::Text => "text",
            PinCategory::Object => "object",
            PinCategory::Class => "class",
            PinCategory::Struct => "struct",
            PinCategory::Delegate => "delegate",
            PinCategory::MulticastDelegate => "mcdelegate",
            PinCategory::Wildcard => "wildcard",
            PinCategory::BadType => "bad_type",
            PinCategory::Other(key) => key.as_str(),
        }
    }

    /// Parse a wire key; unknown keys become `Other`
    pub fn from_key(key: &str) -> Self {
        match key {
            "exec" => PinCategory::Exec,
            "bool" => PinCategory::Boolean,
            "byte" => PinCategory::Byte,
            "int" => PinCategory::Int,
            "float" => PinCategory::Float,
            "name" => PinCategory::Name,
            "string" => PinCategory::String,
            "text" => PinCategory::Text,
            "object" => PinCategory::Object,
            "class" => PinCategory::Class,
            "struct" => PinCategory::Struct,
            "delegate" => PinCategory::Delegate,
            "mcdelegate" => PinCategory::MulticastDelegate,
            "wildcard" => PinCategory::Wildcard,
            "bad_type" => PinCategory::BadType,
            other => PinCategory::Other(CustomTag(other.to_string())),
        }
    }

    /// Scalars that never carry a nominal sub-type
    pub fn is_primitive_scalar(&self) -> bool {
        matches!(
            self,
            PinCategory::Boolean
                | PinCategory::Int
                | PinCategory::Float
                | PinCategory::Name
                | PinCategory::String
                | PinCategory::Text
        )
    }

    /// Categories whose sub-type takes part in subtyping (object, class, struct)
    pub fn is_nominal(&self) -> bool {
        matches!(
            self,
            PinCategory::Object | PinCategory::Class | PinCategory::Struct
        )
    }

    /// Delegate or multicast delegate
    pub fn is_delegate_family(&self) -> bool {
        matches!(
            self,
            PinCategory::Delegate | PinCategory::MulticastDelegate
        )
    }
}

impl fmt::Display for PinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

impl From<String> for PinCategory {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

impl From<PinCategory> for String {
    fn from(category: PinCategory) -> Self {
        category.as_str().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sub-category Tags
// ─────────────────────────────────────────────────────────────────────────────

/// String tag refining a category
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubCategory {
    #[default]
    None,
    /// `"self"` - resolve the nominal type from the calling context
    SelfContext,
    /// `"index"` - wildcard restricted to index-like types
    Index,
    /// Any other tag, compared by value
    Named(CustomTag),
}

impl SubCategory {
    pub fn as_str(&self) -> &str {
        match self {
            SubCategory::None => "",
            SubCategory::SelfContext => "self",
            SubCategory::Index => "index",
            SubCategory::Named(tag) => tag.as_str(),
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" => SubCategory::None,
            "self" => SubCategory::SelfContext,
            "index" => SubCategory::Index,
            other => SubCategory::Named(CustomTag(other.to_string())),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SubCategory::None)
    }
}

impl fmt::Display for SubCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SubCategory {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<SubCategory> for String {
    fn from(sub: SubCategory) -> Self {
        sub.as_str().to_string()
    }
}

/// The two members of the wildcard family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WildcardKind {
    /// Matches anything
    Generic,
    /// Matches only non-array bool, byte and int
    Index,
}

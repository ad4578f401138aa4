// Reflection - Read-only view of the nominal type database
//
// Pin types never own class/struct/enum/function definitions. They hold a
// `TypeHandle` and ask a `TypeReflection` implementation about it.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Handles
// ─────────────────────────────────────────────────────────────────────────────

/// Stable, non-owning reference to a nominal type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHandle(u32);

impl TypeHandle {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of definition a handle points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NominalKind {
    Class,
    Interface,
    Struct,
    Enum,
    /// Function signature (delegate sub-type)
    Function,
}

/// Built-in value structs that the autocast table knows by identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownStruct {
    #[default]
    None,
    Vector,
    Rotator,
    Transform,
    LinearColor,
    Color,
}

impl WellKnownStruct {
    pub const ALL: [WellKnownStruct; 5] = [
        WellKnownStruct::Vector,
        WellKnownStruct::Rotator,
        WellKnownStruct::Transform,
        WellKnownStruct::LinearColor,
        WellKnownStruct::Color,
    ];

    /// Engine name of the struct
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            WellKnownStruct::None => None,
            WellKnownStruct::Vector => Some("Vector"),
            WellKnownStruct::Rotator => Some("Rotator"),
            WellKnownStruct::Transform => Some("Transform"),
            WellKnownStruct::LinearColor => Some("LinearColor"),
            WellKnownStruct::Color => Some("Color"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

/// An object-valued property declared on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Property name
    pub name: String,
    /// Class that declares the property
    pub owner: TypeHandle,
    /// Declared class of the referenced object
    pub value_class: TypeHandle,
    /// Exposed to visual scripts
    pub blueprint_visible: bool,
    /// Readable from visual scripts
    pub readable: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reflection Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Queries the connection schema needs from the type database
///
/// All queries are read-only and expected to be O(1) or O(hierarchy depth).
/// Unknown handles answer `None`/`false` rather than panicking.
pub trait TypeReflection {
    /// Display name of a type
    fn type_name(&self, ty: TypeHandle) -> Option<&str>;

    /// Kind of definition behind a handle
    fn kind(&self, ty: TypeHandle) -> Option<NominalKind>;

    /// Reflexive, transitive is-a over the parent chain
    fn is_child_of(&self, ty: TypeHandle, ancestor: TypeHandle) -> bool;

    /// Whether `class` (or an ancestor) implements `interface` (or a descendant of it)
    fn implements_interface(&self, class: TypeHandle, interface: TypeHandle) -> bool;

    /// Built-in struct tag, `None` for everything else
    fn well_known_struct(&self, ty: TypeHandle) -> WellKnownStruct;

    /// Same parameter and return shape
    fn is_signature_compatible(&self, a: TypeHandle, b: TypeHandle) -> bool;

    /// Object-valued properties of a class, own properties first, then inherited ones
    fn object_properties(&self, class: TypeHandle) -> Vec<PropertyInfo>;

    /// Entry names of an enum
    fn enum_entries(&self, ty: TypeHandle) -> Option<&[String]>;

    fn is_interface(&self, ty: TypeHandle) -> bool {
        self.kind(ty) == Some(NominalKind::Interface)
    }

    fn is_enum(&self, ty: TypeHandle) -> bool {
        self.kind(ty) == Some(NominalKind::Enum)
    }

    /// Class or interface
    fn is_class_like(&self, ty: TypeHandle) -> bool {
        matches!(
            self.kind(ty),
            Some(NominalKind::Class) | Some(NominalKind::Interface)
        )
    }
}

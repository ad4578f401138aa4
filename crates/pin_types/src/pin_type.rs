// Pin Type - What a pin carries
//
// A pin type is a category tag, an optional sub-category tag, an optional handle
// to a nominal type and a handful of container/qualifier flags. Pin types are
// plain values: they are compared structurally and never mutated by the schema.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NominalKind, PinCategory, SubCategory, TypeHandle, TypeReflection, WildcardKind};

// ─────────────────────────────────────────────────────────────────────────────
// Direction
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a pin on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    pub fn opposite(self) -> Self {
        match self {
            PinDirection::Input => PinDirection::Output,
            PinDirection::Output => PinDirection::Input,
        }
    }
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinDirection::Input => f.write_str("input"),
            PinDirection::Output => f.write_str("output"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Shape violations of a pin type description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinTypeError {
    #[error("struct pin carries sub-category '{0}', should be empty")]
    SubCategoryOnStruct(String),
    #[error("struct pin has no struct type")]
    MissingStruct,
    #[error("{category} pin must not carry a nominal type")]
    UnexpectedSubCategoryObject { category: PinCategory },
    #[error("{category} pin has no class and is not a self reference")]
    MissingClass { category: PinCategory },
    #[error("{category} pin references {handle}, which is not a {expected}")]
    WrongNominalKind {
        category: PinCategory,
        handle: TypeHandle,
        expected: &'static str,
    },
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("invalid pin type syntax '{0}'")]
    Syntax(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Pin Type
// ─────────────────────────────────────────────────────────────────────────────

/// Semantic type of a pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinType {
    /// Top-level category
    pub category: PinCategory,
    /// Sub-category tag (`self`, `index`, ...)
    #[serde(default, skip_serializing_if = "SubCategory::is_none")]
    pub sub_category: SubCategory,
    /// Nominal class/struct/enum/signature, owned by the reflection database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_object: Option<TypeHandle>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_const: bool,
    /// Non-owning object reference
    #[serde(default)]
    pub is_weak_pointer: bool,
}

impl PinType {
    /// Create a scalar pin type of the given category with no refinements
    pub fn new(category: PinCategory) -> Self {
        Self {
            category,
            sub_category: SubCategory::None,
            sub_category_object: None,
            is_array: false,
            is_reference: false,
            is_const: false,
            is_weak_pointer: false,
        }
    }

    fn with_object(category: PinCategory, object: TypeHandle) -> Self {
        Self {
            sub_category_object: Some(object),
            ..Self::new(category)
        }
    }

    fn with_tag(category: PinCategory, tag: SubCategory) -> Self {
        Self {
            sub_category: tag,
            ..Self::new(category)
        }
    }

    pub fn exec() -> Self {
        Self::new(PinCategory::Exec)
    }

    pub fn boolean() -> Self {
        Self::new(PinCategory::Boolean)
    }

    pub fn byte() -> Self {
        Self::new(PinCategory::Byte)
    }

    /// Byte pin restricted to an enumeration
    pub fn enumeration(enumeration: TypeHandle) -> Self {
        Self::with_object(PinCategory::Byte, enumeration)
    }

    pub fn int() -> Self {
        Self::new(PinCategory::Int)
    }

    pub fn float() -> Self {
        Self::new(PinCategory::Float)
    }

    pub fn name() -> Self {
        Self::new(PinCategory::Name)
    }

    pub fn string() -> Self {
        Self::new(PinCategory::String)
    }

    pub fn text() -> Self {
        Self::new(PinCategory::Text)
    }

    pub fn object(class: TypeHandle) -> Self {
        Self::with_object(PinCategory::Object, class)
    }

    /// Object pin typed as the calling context
    pub fn self_object() -> Self {
        Self::with_tag(PinCategory::Object, SubCategory::SelfContext)
    }

    pub fn class(meta_class: TypeHandle) -> Self {
        Self::with_object(PinCategory::Class, meta_class)
    }

    pub fn self_class() -> Self {
        Self::with_tag(PinCategory::Class, SubCategory::SelfContext)
    }

    pub fn structure(def: TypeHandle) -> Self {
        Self::with_object(PinCategory::Struct, def)
    }

    /// Delegate pin; `None` while the signature is still being edited
    pub fn delegate(signature: Option<TypeHandle>) -> Self {
        Self {
            sub_category_object: signature,
            ..Self::new(PinCategory::Delegate)
        }
    }

    pub fn multicast_delegate(signature: Option<TypeHandle>) -> Self {
        Self {
            sub_category_object: signature,
            ..Self::new(PinCategory::MulticastDelegate)
        }
    }

    pub fn wildcard() -> Self {
        Self::new(PinCategory::Wildcard)
    }

    pub fn index_wildcard() -> Self {
        Self::with_tag(PinCategory::Wildcard, SubCategory::Index)
    }

    /// The opaque category malformed types degrade to
    pub fn bad_type() -> Self {
        Self::new(PinCategory::BadType)
    }

    /// Application-specific pass-through category
    pub fn other(key: impl Into<String>) -> Self {
        Self::new(PinCategory::from_key(&key.into()))
    }

    /// Same type as an array
    pub fn array(self) -> Self {
        Self {
            is_array: true,
            ..self
        }
    }

    /// Same type passed by reference
    pub fn by_ref(self) -> Self {
        Self {
            is_reference: true,
            ..self
        }
    }

    pub fn as_const(self) -> Self {
        Self {
            is_const: true,
            ..self
        }
    }

    /// Same object type held through a weak pointer
    pub fn weak(self) -> Self {
        Self {
            is_weak_pointer: true,
            ..self
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if this is an execution pin type
    pub fn is_exec(&self) -> bool {
        self.category == PinCategory::Exec
    }

    /// Nominal type must be taken from the calling context
    pub fn is_self_placeholder(&self) -> bool {
        self.sub_category == SubCategory::SelfContext
    }

    pub fn is_delegate_family(&self) -> bool {
        self.category.is_delegate_family()
    }

    pub fn is_wildcard(&self) -> bool {
        self.category == PinCategory::Wildcard
    }

    pub fn is_index_wildcard(&self) -> bool {
        self.is_wildcard() && self.sub_category == SubCategory::Index
    }

    pub fn is_bad_type(&self) -> bool {
        self.category == PinCategory::BadType
    }

    /// Which wildcard this is, if any
    pub fn wildcard_kind(&self) -> Option<WildcardKind> {
        match (&self.category, &self.sub_category) {
            (PinCategory::Wildcard, SubCategory::Index) => Some(WildcardKind::Index),
            (PinCategory::Wildcard, _) => Some(WildcardKind::Generic),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Check the category/sub-type invariants against the reflection database
    pub fn validate_shape(&self, reflection: &dyn TypeReflection) -> Result<(), PinTypeError> {
        let kind_of = |handle: TypeHandle| reflection.kind(handle);
        let wrong_kind = |handle, expected| PinTypeError::WrongNominalKind {
            category: self.category.clone(),
            handle,
            expected,
        };

        match &self.category {
            PinCategory::Struct => {
                if !self.sub_category.is_none() {
                    return Err(PinTypeError::SubCategoryOnStruct(
                        self.sub_category.to_string(),
                    ));
                }
                match self.sub_category_object {
                    None => Err(PinTypeError::MissingStruct),
                    Some(h) if kind_of(h) == Some(NominalKind::Struct) => Ok(()),
                    Some(h) => Err(wrong_kind(h, "struct")),
                }
            }
            PinCategory::Object | PinCategory::Class => match self.sub_category_object {
                None if self.is_self_placeholder() => Ok(()),
                None => Err(PinTypeError::MissingClass {
                    category: self.category.clone(),
                }),
                Some(h) if reflection.is_class_like(h) => Ok(()),
                Some(h) => Err(wrong_kind(h, "class")),
            },
            PinCategory::Byte => match self.sub_category_object {
                None => Ok(()),
                Some(h) if kind_of(h) == Some(NominalKind::Enum) => Ok(()),
                Some(h) => Err(wrong_kind(h, "enum")),
            },
            PinCategory::Delegate | PinCategory::MulticastDelegate => {
                match self.sub_category_object {
                    None => Ok(()),
                    Some(h) if kind_of(h) == Some(NominalKind::Function) => Ok(()),
                    Some(h) => Err(wrong_kind(h, "function signature")),
                }
            }
            category if category.is_primitive_scalar() => {
                if self.sub_category_object.is_some() {
                    Err(PinTypeError::UnexpectedSubCategoryObject {
                        category: category.clone(),
                    })
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// This type, or `bad_type` if it violates the shape invariants
    pub fn sanitized(self, reflection: &dyn TypeReflection) -> Self {
        match self.validate_shape(reflection) {
            Ok(()) => self,
            Err(err) => {
                tracing::debug!(error = %err, "Malformed pin type degraded to bad_type");
                Self::bad_type()
            }
        }
    }

    /// Diagnostic form, e.g. `array[object'Actor']` or `int (by ref)`
    pub fn display<'a>(&'a self, reflection: &'a dyn TypeReflection) -> PinTypeDisplay<'a> {
        PinTypeDisplay {
            pin_type: self,
            reflection,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display
// ─────────────────────────────────────────────────────────────────────────────

/// Formats a pin type for diagnostics and tooltips
pub struct PinTypeDisplay<'a> {
    pin_type: &'a PinType,
    reflection: &'a dyn TypeReflection,
}

impl fmt::Display for PinTypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.pin_type;

        let base = if let Some(object) = ty.sub_category_object {
            let name = self.reflection.type_name(object).unwrap_or("None");
            if ty.category == PinCategory::Byte {
                format!("enum'{name}'")
            } else if ty.is_weak_pointer {
                format!("weak_ptr_{}'{name}'", ty.category)
            } else if self.reflection.is_interface(object) {
                format!("interface'{name}'")
            } else {
                format!("{}'{name}'", ty.category)
            }
        } else if !ty.sub_category.is_none() {
            format!("{}'{}'", ty.category, ty.sub_category)
        } else {
            ty.category.to_string()
        };

        if ty.is_array {
            write!(f, "array[{base}]")
        } else if ty.is_reference {
            write!(f, "{base} (by ref)")
        } else {
            f.write_str(&base)
        }
    }
}

/// Diagnostic string for a pin type
pub fn type_to_display_string(pin_type: &PinType, reflection: &dyn TypeReflection) -> String {
    pin_type.display(reflection).to_string()
}

// Property Conversion - Reflected property descriptors to pin types
//
// Function parameters and member variables are described by reflected
// properties. Each supported property kind maps onto exactly one pin category;
// anything else degrades to `bad_type`.

use serde::{Deserialize, Serialize};

use crate::{PinType, TypeHandle};

// ─────────────────────────────────────────────────────────────────────────────
// Descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// Storage kind of a reflected property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyType {
    Bool,
    Byte {
        #[serde(default)]
        enumeration: Option<TypeHandle>,
    },
    Int,
    Float,
    Name,
    Str,
    Text,
    Object {
        class: TypeHandle,
        #[serde(default)]
        weak: bool,
    },
    Class {
        meta: TypeHandle,
    },
    Interface {
        class: TypeHandle,
    },
    Struct {
        def: TypeHandle,
    },
    Delegate {
        #[serde(default)]
        signature: Option<TypeHandle>,
    },
    MulticastDelegate {
        #[serde(default)]
        signature: Option<TypeHandle>,
    },
    Array {
        inner: Box<PropertyType>,
    },
    /// Storage kind with no pin representation (maps, sets, raw pointers, ...)
    Unsupported {
        name: String,
    },
}

/// A reflected property with its parameter flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDesc {
    pub name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub out_param: bool,
    #[serde(default)]
    pub reference_param: bool,
    #[serde(default)]
    pub const_param: bool,
    /// Element parameter of a generic array function
    #[serde(default)]
    pub array_wildcard: bool,
}

impl PropertyDesc {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            out_param: false,
            reference_param: false,
            const_param: false,
            array_wildcard: false,
        }
    }

    /// Mark as an output parameter passed by reference
    pub fn out_ref(mut self) -> Self {
        self.out_param = true;
        self.reference_param = true;
        self
    }

    pub fn as_const(mut self) -> Self {
        self.const_param = true;
        self
    }

    pub fn array_wildcard(mut self) -> Self {
        self.array_wildcard = true;
        self
    }
}

/// Errors converting a property into a pin type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyConversionError {
    #[error("Property {property} has unsupported type {kind}")]
    Unsupported { property: String, kind: String },
    #[error("Property {0} is an array of arrays")]
    NestedArray(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Pin type describing a property
pub fn property_to_pin_type(property: &PropertyDesc) -> Result<PinType, PropertyConversionError> {
    let (element, is_array) = match &property.property_type {
        PropertyType::Array { inner } => {
            if matches!(**inner, PropertyType::Array { .. }) {
                return Err(PropertyConversionError::NestedArray(property.name.clone()));
            }
            (inner.as_ref(), true)
        }
        other => (other, false),
    };

    let mut pin_type = if property.array_wildcard {
        PinType::wildcard()
    } else {
        element_pin_type(element).ok_or_else(|| PropertyConversionError::Unsupported {
            property: property.name.clone(),
            kind: match element {
                PropertyType::Unsupported { name } => name.clone(),
                other => format!("{other:?}"),
            },
        })?
    };

    pin_type.is_array = is_array;
    pin_type.is_reference = property.out_param && property.reference_param;
    pin_type.is_const = property.const_param;
    Ok(pin_type)
}

/// Like `property_to_pin_type`, but reports failures as `bad_type`
pub fn property_to_pin_type_lossy(property: &PropertyDesc) -> PinType {
    property_to_pin_type(property).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "Property has no pin representation");
        PinType::bad_type()
    })
}

fn element_pin_type(property_type: &PropertyType) -> Option<PinType> {
    let pin_type = match property_type {
        PropertyType::Bool => PinType::boolean(),
        PropertyType::Byte { enumeration } => PinType {
            sub_category_object: *enumeration,
            ..PinType::byte()
        },
        PropertyType::Int => PinType::int(),
        PropertyType::Float => PinType::float(),
        PropertyType::Name => PinType::name(),
        PropertyType::Str => PinType::string(),
        PropertyType::Text => PinType::text(),
        PropertyType::Object { class, weak } => PinType {
            is_weak_pointer: *weak,
            ..PinType::object(*class)
        },
        PropertyType::Class { meta } => PinType::class(*meta),
        PropertyType::Interface { class } => PinType::object(*class),
        PropertyType::Struct { def } => PinType::structure(*def),
        PropertyType::Delegate { signature } => PinType::delegate(*signature),
        PropertyType::MulticastDelegate { signature } => PinType::multicast_delegate(*signature),
        PropertyType::Array { .. } | PropertyType::Unsupported { .. } => return None,
    };
    Some(pin_type)
}

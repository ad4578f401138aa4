// Autocast - Single-function conversions between scalar pin types
//
// The table is closed: every cast here is one a reader would expect to be
// inserted silently. Numeric parsing beyond the listed string casts and lossy
// struct conversions other than Color <-> LinearColor do not belong here.

use std::fmt;

use pin_types::{PinCategory, PinType, WellKnownStruct};
use serde::Serialize;

use crate::PinSchema;

// ─────────────────────────────────────────────────────────────────────────────
// Cast Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Library function performing an automatic cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastFunction {
    IntToFloat,
    IntToString,
    IntToByte,
    IntToBool,
    IntToText,
    /// Float to int, rounding towards negative infinity
    FloatToInt,
    FloatToVector,
    FloatToString,
    FloatToLinearColor,
    FloatToText,
    VectorToTransform,
    VectorToLinearColor,
    VectorToString,
    RotatorToTransform,
    RotatorToString,
    LinearColorToColor,
    LinearColorToString,
    LinearColorToVector,
    ColorToLinearColor,
    BoolToString,
    BoolToInt,
    BoolToFloat,
    BoolToByte,
    ByteToString,
    ByteToInt,
    ByteToFloat,
    NameToString,
    NameToText,
    StringToName,
    StringToInt,
    StringToFloat,
    StringToText,
    TextToString,
}

impl CastFunction {
    /// Every cast, in table order
    pub const ALL: [CastFunction; 33] = [
        CastFunction::IntToFloat,
        CastFunction::IntToString,
        CastFunction::IntToByte,
        CastFunction::IntToBool,
        CastFunction::IntToText,
        CastFunction::FloatToInt,
        CastFunction::FloatToVector,
        CastFunction::FloatToString,
        CastFunction::FloatToLinearColor,
        CastFunction::FloatToText,
        CastFunction::VectorToTransform,
        CastFunction::VectorToLinearColor,
        CastFunction::VectorToString,
        CastFunction::RotatorToTransform,
        CastFunction::RotatorToString,
        CastFunction::LinearColorToColor,
        CastFunction::LinearColorToString,
        CastFunction::LinearColorToVector,
        CastFunction::ColorToLinearColor,
        CastFunction::BoolToString,
        CastFunction::BoolToInt,
        CastFunction::BoolToFloat,
        CastFunction::BoolToByte,
        CastFunction::ByteToString,
        CastFunction::ByteToInt,
        CastFunction::ByteToFloat,
        CastFunction::NameToString,
        CastFunction::NameToText,
        CastFunction::StringToName,
        CastFunction::StringToInt,
        CastFunction::StringToFloat,
        CastFunction::StringToText,
        CastFunction::TextToString,
    ];

    /// Name of the library function
    pub fn name(self) -> &'static str {
        match self {
            CastFunction::IntToFloat => "Conv_IntToFloat",
            CastFunction::IntToString => "Conv_IntToString",
            CastFunction::IntToByte => "Conv_IntToByte",
            CastFunction::IntToBool => "Conv_IntToBool",
            CastFunction::IntToText => "Conv_IntToText",
            CastFunction::FloatToInt => "FFloor",
            CastFunction::FloatToVector => "Conv_FloatToVector",
            CastFunction::FloatToString => "Conv_FloatToString",
            CastFunction::FloatToLinearColor => "Conv_FloatToLinearColor",
            CastFunction::FloatToText => "Conv_FloatToText",
            CastFunction::VectorToTransform => "Conv_VectorToTransform",
            CastFunction::VectorToLinearColor => "Conv_VectorToLinearColor",
            CastFunction::VectorToString => "Conv_VectorToString",
            CastFunction::RotatorToTransform => "MakeTransform",
            CastFunction::RotatorToString => "Conv_RotatorToString",
            CastFunction::LinearColorToColor => "Conv_LinearColorToColor",
            CastFunction::LinearColorToString => "Conv_ColorToString",
            CastFunction::LinearColorToVector => "Conv_LinearColorToVector",
            CastFunction::ColorToLinearColor => "Conv_ColorToLinearColor",
            CastFunction::BoolToString => "Conv_BoolToString",
            CastFunction::BoolToInt => "Conv_BoolToInt",
            CastFunction::BoolToFloat => "Conv_BoolToFloat",
            CastFunction::BoolToByte => "Conv_BoolToByte",
            CastFunction::ByteToString => "Conv_ByteToString",
            CastFunction::ByteToInt => "Conv_ByteToInt",
            CastFunction::ByteToFloat => "Conv_ByteToFloat",
            CastFunction::NameToString => "Conv_NameToString",
            CastFunction::NameToText => "Conv_NameToText",
            CastFunction::StringToName => "Conv_StringToName",
            CastFunction::StringToInt => "Conv_StringToInt",
            CastFunction::StringToFloat => "Conv_StringToFloat",
            CastFunction::StringToText => "Conv_StringToText",
            CastFunction::TextToString => "Conv_TextToString",
        }
    }
}

impl fmt::Display for CastFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CastFunction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cast Table
// ─────────────────────────────────────────────────────────────────────────────

/// One side of a cast: a scalar category or a built-in struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Int,
    Float,
    Bool,
    /// Plain byte, never an enumeration
    Byte,
    Name,
    Str,
    Text,
    Struct(WellKnownStruct),
}

use CastFunction as C;
use Endpoint as E;
use WellKnownStruct as W;

/// (source, destination, cast), grouped by source in priority order
const AUTOCAST_TABLE: &[(Endpoint, Endpoint, CastFunction)] = &[
    (E::Int, E::Float, C::IntToFloat),
    (E::Int, E::Str, C::IntToString),
    (E::Int, E::Byte, C::IntToByte),
    (E::Int, E::Bool, C::IntToBool),
    (E::Int, E::Text, C::IntToText),
    (E::Float, E::Int, C::FloatToInt),
    (E::Float, E::Struct(W::Vector), C::FloatToVector),
    (E::Float, E::Str, C::FloatToString),
    (E::Float, E::Struct(W::LinearColor), C::FloatToLinearColor),
    (E::Float, E::Text, C::FloatToText),
    (E::Struct(W::Vector), E::Struct(W::Transform), C::VectorToTransform),
    (E::Struct(W::Vector), E::Struct(W::LinearColor), C::VectorToLinearColor),
    (E::Struct(W::Vector), E::Str, C::VectorToString),
    (E::Struct(W::Rotator), E::Struct(W::Transform), C::RotatorToTransform),
    (E::Struct(W::Rotator), E::Str, C::RotatorToString),
    (E::Struct(W::LinearColor), E::Struct(W::Color), C::LinearColorToColor),
    (E::Struct(W::LinearColor), E::Str, C::LinearColorToString),
    (E::Struct(W::LinearColor), E::Struct(W::Vector), C::LinearColorToVector),
    (E::Struct(W::Color), E::Struct(W::LinearColor), C::ColorToLinearColor),
    (E::Bool, E::Str, C::BoolToString),
    (E::Bool, E::Int, C::BoolToInt),
    (E::Bool, E::Float, C::BoolToFloat),
    (E::Bool, E::Byte, C::BoolToByte),
    (E::Byte, E::Str, C::ByteToString),
    (E::Byte, E::Int, C::ByteToInt),
    (E::Byte, E::Float, C::ByteToFloat),
    (E::Name, E::Str, C::NameToString),
    (E::Name, E::Text, C::NameToText),
    (E::Str, E::Name, C::StringToName),
    (E::Str, E::Int, C::StringToInt),
    (E::Str, E::Float, C::StringToFloat),
    (E::Str, E::Text, C::StringToText),
    (E::Text, E::Str, C::TextToString),
];

impl PinSchema<'_> {
    /// Cast function bridging two scalar pins of the same array shape
    pub fn find_scalar_autocast(&self, output: &PinType, input: &PinType) -> Option<CastFunction> {
        // Array <-> scalar is a structural conversion, never a cast
        if output.is_array != input.is_array {
            return None;
        }
        let source = self.endpoint(output, true)?;
        let destination = self.endpoint(input, false)?;

        AUTOCAST_TABLE
            .iter()
            .find(|(from, to, _)| *from == source && *to == destination)
            .map(|(_, _, cast)| *cast)
    }

    fn endpoint(&self, pin_type: &PinType, is_source: bool) -> Option<Endpoint> {
        let endpoint = match pin_type.category {
            PinCategory::Int => E::Int,
            PinCategory::Float => E::Float,
            PinCategory::Boolean => E::Bool,
            PinCategory::Name => E::Name,
            PinCategory::String => E::Str,
            PinCategory::Text => E::Text,
            PinCategory::Byte => {
                let is_enum = match pin_type.sub_category_object {
                    None => false,
                    // Any attached object blocks the destination side
                    Some(_) if !is_source => true,
                    Some(object) => self.reflection().is_enum(object),
                };
                if is_enum {
                    return None;
                }
                E::Byte
            }
            PinCategory::Struct => {
                let object = pin_type.sub_category_object?;
                match self.reflection().well_known_struct(object) {
                    WellKnownStruct::None => return None,
                    tag => E::Struct(tag),
                }
            }
            _ => return None,
        };
        Some(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    #[test]
    fn test_function_names_are_unique() {
        let mut names: Vec<_> = CastFunction::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CastFunction::ALL.len());
        assert_eq!(AUTOCAST_TABLE.len(), CastFunction::ALL.len());
    }

    #[test]
    fn test_numeric_casts() {
        let fx = Fixture::new();
        let schema = fx.schema();
        assert_eq!(
            schema.find_scalar_autocast(&PinType::int(), &PinType::float()),
            Some(CastFunction::IntToFloat)
        );
        assert_eq!(
            schema.find_scalar_autocast(&PinType::float(), &PinType::int()),
            Some(CastFunction::FloatToInt)
        );
        assert_eq!(CastFunction::FloatToInt.name(), "FFloor");
        assert_eq!(
            schema.find_scalar_autocast(&PinType::int().array(), &PinType::float().array()),
            Some(CastFunction::IntToFloat)
        );
    }

    #[test]
    fn test_no_cast_across_array_shapes() {
        let fx = Fixture::new();
        let schema = fx.schema();
        assert_eq!(schema.find_scalar_autocast(&PinType::int(), &PinType::float().array()), None);
        assert_eq!(schema.find_scalar_autocast(&PinType::int().array(), &PinType::float()), None);
    }

    #[test]
    fn test_enum_bytes_are_not_cast() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let color = PinType::enumeration(fx.ty("EColor"));

        assert_eq!(schema.find_scalar_autocast(&PinType::int(), &color), None);
        assert_eq!(schema.find_scalar_autocast(&PinType::boolean(), &color), None);
        assert_eq!(schema.find_scalar_autocast(&color, &PinType::string()), None);
        assert_eq!(
            schema.find_scalar_autocast(&PinType::int(), &PinType::byte()),
            Some(CastFunction::IntToByte)
        );
    }

    #[test]
    fn test_struct_casts() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let cast = |from: &str, to: &str| {
            schema.find_scalar_autocast(&fx.structure(from), &fx.structure(to))
        };

        assert_eq!(cast("Vector", "Transform"), Some(CastFunction::VectorToTransform));
        assert_eq!(cast("Rotator", "Transform"), Some(CastFunction::RotatorToTransform));
        assert_eq!(cast("LinearColor", "Color"), Some(CastFunction::LinearColorToColor));
        assert_eq!(cast("Color", "LinearColor"), Some(CastFunction::ColorToLinearColor));
        assert_eq!(cast("Color", "Vector"), None);
        assert_eq!(cast("Transform", "Vector"), None);
        assert_eq!(cast("HitResult", "Vector"), None);

        assert_eq!(
            schema.find_scalar_autocast(&PinType::float(), &fx.structure("Vector")),
            Some(CastFunction::FloatToVector)
        );
        assert_eq!(
            schema.find_scalar_autocast(&fx.structure("LinearColor"), &PinType::string()),
            Some(CastFunction::LinearColorToString)
        );
        assert_eq!(schema.find_scalar_autocast(&fx.structure("Color"), &PinType::string()), None);
    }

    #[test]
    fn test_table_is_closed_over_scalars() {
        use PinCategory as P;

        let fx = Fixture::new();
        let schema = fx.schema();
        let expected: &[(PinCategory, PinCategory)] = &[
            (P::Int, P::Float),
            (P::Int, P::String),
            (P::Int, P::Byte),
            (P::Int, P::Boolean),
            (P::Int, P::Text),
            (P::Float, P::Int),
            (P::Float, P::String),
            (P::Float, P::Text),
            (P::Boolean, P::String),
            (P::Boolean, P::Int),
            (P::Boolean, P::Float),
            (P::Boolean, P::Byte),
            (P::Byte, P::String),
            (P::Byte, P::Int),
            (P::Byte, P::Float),
            (P::Name, P::String),
            (P::Name, P::Text),
            (P::String, P::Name),
            (P::String, P::Int),
            (P::String, P::Float),
            (P::String, P::Text),
            (P::Text, P::String),
        ];

        let categories = PinCategory::BUILTIN
            .into_iter()
            .chain([PinCategory::BadType, PinCategory::from_key("CommentType")]);
        let categories: Vec<_> = categories.collect();

        for source in &categories {
            for destination in &categories {
                let found = schema.find_scalar_autocast(
                    &PinType::new(source.clone()),
                    &PinType::new(destination.clone()),
                );
                let listed = expected.contains(&(source.clone(), destination.clone()));
                assert_eq!(found.is_some(), listed, "{source} -> {destination}");
            }
        }
    }
}

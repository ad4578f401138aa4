// Default Values - Literal rules for unconnected input pins
//
// A literal is a string, an optional object reference (carried as the handle
// of the referenced class), and an optional localized text. Which of the
// three a pin may carry depends on its category.

use pin_types::{PinCategory, PinType, SubCategory, TypeHandle, WellKnownStruct};
use serde::{Deserialize, Serialize};

use crate::{PinSchema, PinView};

/// Localized text literal with the flags that make it unusable as a default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLiteral {
    pub value: String,
    #[serde(default)]
    pub transient: bool,
    #[serde(default)]
    pub culture_invariant: bool,
}

/// Proposed default for a pin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValue {
    #[serde(default)]
    pub string: String,
    #[serde(default)]
    pub object: Option<TypeHandle>,
    #[serde(default)]
    pub text: Option<TextLiteral>,
}

impl DefaultValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string: value.into(),
            ..Self::default()
        }
    }

    pub fn object(object: TypeHandle) -> Self {
        Self {
            object: Some(object),
            ..Self::default()
        }
    }

    pub fn text(text: TextLiteral) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }
}

/// Why a literal was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefaultValueError {
    #[error("'{value}' is not a valid enumerant of '<{enumeration}>'")]
    NotAnEnumerant { value: String, enumeration: String },
    #[error("Expected a valid unsigned number for a byte property")]
    InvalidByte,
    #[error("Expected a value between 0 and 255 for a byte property")]
    ByteOutOfRange,
    #[error("String default '{value}' specified on class pin '{pin}'")]
    StringOnClassPin { value: String, pin: String },
    #[error("Literal on pin {pin} is not a class.")]
    NotAClass { pin: String },
    #[error("Failed to find class for pin {pin}")]
    MissingPinClass { pin: String },
    #[error("{literal} isn't a valid subclass of {class} (specified on pin {pin})")]
    NotASubclass {
        literal: String,
        class: String,
        pin: String,
    },
    #[error("Expected a valid number for a float property")]
    InvalidFloat,
    #[error("Expected a valid number for an integer property")]
    InvalidInt,
    #[error("Invalid default name for pin {pin}")]
    NumericName { pin: String },
    #[error("Pin '{pin}' names no class and its sub-category '{sub_category}' is not 'self'")]
    ObjectWithoutClass { pin: String, sub_category: String },
    #[error("Pin '{pin}' names a class but has sub-category '{sub_category}', should be empty")]
    ObjectWithSubCategory { pin: String, sub_category: String },
    #[error("String default '{value}' specified on object pin '{pin}'")]
    StringOnObjectPin { value: String, pin: String },
    #[error("{literal} isn't a {class} (specified on pin {pin})")]
    WrongObjectClass {
        literal: String,
        class: String,
        pin: String,
    },
    #[error("Invalid text literal, text is transient!")]
    TransientText,
    #[error("Invalid text literal, text is culture invariant!")]
    CultureInvariantText,
    #[error("Sub-category on pin '{pin}' is '{sub_category}', should be empty")]
    SubCategoryOnStruct { pin: String, sub_category: String },
    #[error("No struct specified for pin '{pin}'")]
    NoStruct { pin: String },
    #[error("Invalid value for a Vector")]
    InvalidVector,
    #[error("Invalid value for a Rotator")]
    InvalidRotator,
    #[error("Invalid value for a Transform")]
    InvalidTransform,
    #[error("Invalid value for a LinearColor")]
    InvalidLinearColor,
    #[error("Unsupported type {pin_type} on pin {pin}")]
    Unsupported { pin_type: String, pin: String },
    #[error("Literal values are not allowed for array parameters.  Use a Make Array node instead")]
    ArrayLiteral,
    #[error("Literal values are not allowed for pass-by-reference parameters.")]
    ReferenceLiteral,
}

impl PinSchema<'_> {
    /// Check a literal against the pin it would be stored on
    ///
    /// Array and by-reference pins take no literal unless the call creates a
    /// temporary for them; interface graphs skip that restriction.
    pub fn is_pin_default_valid(
        &self,
        pin: PinView<'_>,
        value: &DefaultValue,
        in_interface: bool,
    ) -> Result<(), DefaultValueError> {
        let pin_type = pin.pin_type();
        if !in_interface && !pin.node.is_auto_create_ref_term(&pin.pin.name) {
            if pin_type.is_array {
                return Err(DefaultValueError::ArrayLiteral);
            }
            if pin_type.is_reference {
                return Err(DefaultValueError::ReferenceLiteral);
            }
        }
        self.validate_default_value(pin_type, &pin.pin.name, value)
    }

    /// Category rules for a literal, independent of the owning node
    pub fn validate_default_value(
        &self,
        pin_type: &PinType,
        pin_name: &str,
        value: &DefaultValue,
    ) -> Result<(), DefaultValueError> {
        let reflection = self.reflection();
        let pin = || pin_name.to_string();
        let name_of = |handle: TypeHandle| reflection.type_name(handle).unwrap_or("None").to_string();
        let literal = value.string.as_str();

        match &pin_type.category {
            PinCategory::Boolean | PinCategory::String => Ok(()),
            PinCategory::Other(key) if key.as_str() == "CommentType" => Ok(()),

            PinCategory::Byte => match pin_type.sub_category_object.filter(|h| reflection.is_enum(*h)) {
                Some(enumeration) => {
                    let known = reflection
                        .enum_entries(enumeration)
                        .is_some_and(|entries| entries.iter().any(|e| e == literal));
                    if known {
                        Ok(())
                    } else {
                        Err(DefaultValueError::NotAnEnumerant {
                            value: literal.to_string(),
                            enumeration: name_of(enumeration),
                        })
                    }
                }
                None if literal.is_empty() => Ok(()),
                None => {
                    if !is_valid_integer(literal) {
                        return Err(DefaultValueError::InvalidByte);
                    }
                    match literal.trim().parse::<i64>() {
                        Ok(byte) if (0..=255).contains(&byte) => Ok(()),
                        _ => Err(DefaultValueError::ByteOutOfRange),
                    }
                }
            },

            PinCategory::Class => {
                if !literal.is_empty() {
                    return Err(DefaultValueError::StringOnClassPin {
                        value: literal.to_string(),
                        pin: pin(),
                    });
                }
                // No literal is an empty or self reference
                let Some(object) = value.object else {
                    return Ok(());
                };
                if !reflection.is_class_like(object) {
                    return Err(DefaultValueError::NotAClass { pin: pin() });
                }
                let Some(class) = pin_type.sub_category_object.filter(|h| reflection.is_class_like(*h)) else {
                    return Err(DefaultValueError::MissingPinClass { pin: pin() });
                };
                if reflection.is_child_of(object, class) {
                    Ok(())
                } else {
                    Err(DefaultValueError::NotASubclass {
                        literal: name_of(object),
                        class: name_of(class),
                        pin: pin(),
                    })
                }
            }

            PinCategory::Float => {
                if literal.is_empty() || is_valid_float(literal) {
                    Ok(())
                } else {
                    Err(DefaultValueError::InvalidFloat)
                }
            }

            PinCategory::Int => {
                if literal.is_empty() || is_valid_integer(literal) {
                    Ok(())
                } else {
                    Err(DefaultValueError::InvalidInt)
                }
            }

            PinCategory::Name => {
                if is_numeric(literal) {
                    Err(DefaultValueError::NumericName { pin: pin() })
                } else {
                    Ok(())
                }
            }

            PinCategory::Object => {
                let sub_category = pin_type.sub_category.to_string();
                match pin_type.sub_category_object {
                    None if pin_type.sub_category != SubCategory::SelfContext => {
                        return Err(DefaultValueError::ObjectWithoutClass { pin: pin(), sub_category });
                    }
                    Some(_) if !pin_type.sub_category.is_none() => {
                        return Err(DefaultValueError::ObjectWithSubCategory { pin: pin(), sub_category });
                    }
                    _ => {}
                }
                if !literal.is_empty() {
                    return Err(DefaultValueError::StringOnObjectPin {
                        value: literal.to_string(),
                        pin: pin(),
                    });
                }
                let class = pin_type.sub_category_object.filter(|h| reflection.is_class_like(*h));
                match (value.object, class) {
                    (Some(object), Some(class)) if !reflection.is_child_of(object, class) => {
                        Err(DefaultValueError::WrongObjectClass {
                            literal: name_of(object),
                            class: name_of(class),
                            pin: pin(),
                        })
                    }
                    _ => Ok(()),
                }
            }

            PinCategory::Text => match &value.text {
                Some(text) if text.transient => Err(DefaultValueError::TransientText),
                Some(text) if text.culture_invariant => Err(DefaultValueError::CultureInvariantText),
                _ => Ok(()),
            },

            PinCategory::Struct => {
                if !pin_type.sub_category.is_none() {
                    return Err(DefaultValueError::SubCategoryOnStruct {
                        pin: pin(),
                        sub_category: pin_type.sub_category.to_string(),
                    });
                }
                let Some(def) = pin_type.sub_category_object else {
                    return Err(DefaultValueError::NoStruct { pin: pin() });
                };
                if literal.is_empty() {
                    return Ok(());
                }
                // Other structs are checked when the call is compiled
                match reflection.well_known_struct(def) {
                    WellKnownStruct::Vector if parse_vector(literal).is_none() => {
                        Err(DefaultValueError::InvalidVector)
                    }
                    WellKnownStruct::Rotator if parse_vector(literal).is_none() => {
                        Err(DefaultValueError::InvalidRotator)
                    }
                    WellKnownStruct::Transform if !is_valid_transform(literal) => {
                        Err(DefaultValueError::InvalidTransform)
                    }
                    WellKnownStruct::LinearColor if !is_valid_linear_color(literal) => {
                        Err(DefaultValueError::InvalidLinearColor)
                    }
                    _ => Ok(()),
                }
            }

            _ => Err(DefaultValueError::Unsupported {
                pin_type: self.type_to_string(pin_type),
                pin: pin(),
            }),
        }
    }

    /// Literal a freshly created pin of this type starts with
    pub fn autogenerated_default(&self, pin_type: &PinType) -> String {
        if pin_type.is_array {
            return String::new();
        }

        let reflection = self.reflection();
        match pin_type.category {
            PinCategory::Int => "0".to_string(),
            PinCategory::Byte => pin_type
                .sub_category_object
                .and_then(|h| reflection.enum_entries(h))
                .map(|entries| entries.first().cloned().unwrap_or_default())
                .unwrap_or_else(|| "0".to_string()),
            PinCategory::Float => "0.0".to_string(),
            PinCategory::Boolean => "false".to_string(),
            PinCategory::Name => "None".to_string(),
            PinCategory::Struct => match pin_type.sub_category_object.map(|h| reflection.well_known_struct(h)) {
                Some(WellKnownStruct::Vector | WellKnownStruct::Rotator) => "0, 0, 0".to_string(),
                _ => String::new(),
            },
            _ => String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literal Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Optional sign followed by decimal digits
fn is_valid_integer(text: &str) -> bool {
    let text = text.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_float(text: &str) -> bool {
    let text = text.trim();
    // Trailing `f` suffix as in `1.5f`
    let text = text.strip_suffix(['f', 'F']).unwrap_or(text);
    !text.is_empty() && text.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Signed decimal number with at most one dot, e.g. `12`, `-3.5`
fn is_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().filter(|b| *b == b'.').count() <= 1
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().any(|b| b.is_ascii_digit())
}

/// Three comma-separated numbers, `x, y, z`
fn parse_vector(text: &str) -> Option<[f64; 3]> {
    let mut parts = text.split(',').map(|p| p.trim().parse::<f64>().ok());
    let vector = [parts.next()??, parts.next()??, parts.next()??];
    parts.next().is_none().then_some(vector)
}

/// Translation, rotation and scale joined with `|`
fn is_valid_transform(text: &str) -> bool {
    let parts: Vec<_> = text.split('|').collect();
    parts.len() == 3 && parts.iter().all(|part| parse_vector(part).is_some())
}

/// `(R=..,G=..,B=..,A=..)`; alpha may be omitted
fn is_valid_linear_color(text: &str) -> bool {
    let Some(body) = text
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return false;
    };

    let mut seen = [false; 4];
    for field in body.split(',') {
        let Some((key, number)) = field.split_once('=') else {
            return false;
        };
        let slot = match key.trim() {
            "R" => 0,
            "G" => 1,
            "B" => 2,
            "A" => 3,
            _ => return false,
        };
        if seen[slot] || number.trim().parse::<f64>().is_err() {
            return false;
        }
        seen[slot] = true;
    }
    seen[..3].iter().all(|s| *s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use crate::{GraphNode, GraphPin, NodeKind};

    fn check(fx: &Fixture, pin_type: &PinType, value: DefaultValue) -> Result<(), DefaultValueError> {
        fx.schema().validate_default_value(pin_type, "Target", &value)
    }

    #[test]
    fn test_anything_goes_for_bool_and_string() {
        let fx = Fixture::new();
        assert!(check(&fx, &PinType::boolean(), DefaultValue::string("maybe")).is_ok());
        assert!(check(&fx, &PinType::string(), DefaultValue::string("12 monkeys")).is_ok());
        assert!(check(&fx, &PinType::other("CommentType"), DefaultValue::string("note")).is_ok());
    }

    #[test]
    fn test_byte_literals() {
        let fx = Fixture::new();
        assert!(check(&fx, &PinType::byte(), DefaultValue::string("")).is_ok());
        assert!(check(&fx, &PinType::byte(), DefaultValue::string("255")).is_ok());
        assert_eq!(
            check(&fx, &PinType::byte(), DefaultValue::string("256")),
            Err(DefaultValueError::ByteOutOfRange)
        );
        assert_eq!(
            check(&fx, &PinType::byte(), DefaultValue::string("-1")),
            Err(DefaultValueError::ByteOutOfRange)
        );
        assert_eq!(
            check(&fx, &PinType::byte(), DefaultValue::string("ten")),
            Err(DefaultValueError::InvalidByte)
        );
    }

    #[test]
    fn test_enum_literals() {
        let fx = Fixture::new();
        let color = PinType::enumeration(fx.ty("EColor"));
        assert!(check(&fx, &color, DefaultValue::string("Green")).is_ok());

        let err = check(&fx, &color, DefaultValue::string("Purple")).unwrap_err();
        assert_eq!(err.to_string(), "'Purple' is not a valid enumerant of '<EColor>'");
    }

    #[test]
    fn test_numbers() {
        let fx = Fixture::new();
        assert!(check(&fx, &PinType::int(), DefaultValue::string("-42")).is_ok());
        assert_eq!(
            check(&fx, &PinType::int(), DefaultValue::string("4.2")),
            Err(DefaultValueError::InvalidInt)
        );
        assert!(check(&fx, &PinType::float(), DefaultValue::string("4.2")).is_ok());
        assert!(check(&fx, &PinType::float(), DefaultValue::string("1e3")).is_ok());
        assert_eq!(
            check(&fx, &PinType::float(), DefaultValue::string("fast")),
            Err(DefaultValueError::InvalidFloat)
        );
    }

    #[test]
    fn test_numeric_names_rejected() {
        let fx = Fixture::new();
        assert!(check(&fx, &PinType::name(), DefaultValue::string("Spawn")).is_ok());
        assert!(check(&fx, &PinType::name(), DefaultValue::string("")).is_ok());
        let err = check(&fx, &PinType::name(), DefaultValue::string("3.5")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid default name for pin Target");
    }

    #[test]
    fn test_class_literals() {
        let fx = Fixture::new();
        let actor_class = PinType::class(fx.ty("Actor"));

        assert!(check(&fx, &actor_class, DefaultValue::default()).is_ok());
        assert!(check(&fx, &actor_class, DefaultValue::object(fx.ty("Pawn"))).is_ok());
        assert!(matches!(
            check(&fx, &actor_class, DefaultValue::string("Pawn")),
            Err(DefaultValueError::StringOnClassPin { .. })
        ));
        assert!(matches!(
            check(&fx, &actor_class, DefaultValue::object(fx.ty("EColor"))),
            Err(DefaultValueError::NotAClass { .. })
        ));

        let err = check(&fx, &actor_class, DefaultValue::object(fx.ty("Widget"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Widget isn't a valid subclass of Actor (specified on pin Target)"
        );

        assert!(matches!(
            check(&fx, &PinType::self_class(), DefaultValue::object(fx.ty("Pawn"))),
            Err(DefaultValueError::MissingPinClass { .. })
        ));
    }

    #[test]
    fn test_object_literals() {
        let fx = Fixture::new();
        let actor = fx.object("Actor");

        assert!(check(&fx, &actor, DefaultValue::object(fx.ty("Character"))).is_ok());
        assert!(check(&fx, &PinType::self_object(), DefaultValue::default()).is_ok());
        assert!(matches!(
            check(&fx, &actor, DefaultValue::string("self")),
            Err(DefaultValueError::StringOnObjectPin { .. })
        ));

        let err = check(&fx, &actor, DefaultValue::object(fx.ty("Widget"))).unwrap_err();
        assert_eq!(err.to_string(), "Widget isn't a Actor (specified on pin Target)");

        let mut unnamed = actor.clone();
        unnamed.sub_category_object = None;
        assert!(matches!(
            check(&fx, &unnamed, DefaultValue::default()),
            Err(DefaultValueError::ObjectWithoutClass { .. })
        ));

        let mut tagged = actor;
        tagged.sub_category = SubCategory::SelfContext;
        assert!(matches!(
            check(&fx, &tagged, DefaultValue::default()),
            Err(DefaultValueError::ObjectWithSubCategory { .. })
        ));
    }

    #[test]
    fn test_text_flags() {
        let fx = Fixture::new();
        let plain = TextLiteral {
            value: "Hello".into(),
            ..TextLiteral::default()
        };
        assert!(check(&fx, &PinType::text(), DefaultValue::text(plain.clone())).is_ok());

        let transient = TextLiteral {
            transient: true,
            ..plain.clone()
        };
        assert_eq!(
            check(&fx, &PinType::text(), DefaultValue::text(transient)),
            Err(DefaultValueError::TransientText)
        );

        let invariant = TextLiteral {
            culture_invariant: true,
            ..plain
        };
        assert_eq!(
            check(&fx, &PinType::text(), DefaultValue::text(invariant)),
            Err(DefaultValueError::CultureInvariantText)
        );
    }

    #[test]
    fn test_struct_literals() {
        let fx = Fixture::new();
        let vector = fx.structure("Vector");
        assert!(check(&fx, &vector, DefaultValue::string("1, 2.5, -3")).is_ok());
        assert_eq!(
            check(&fx, &vector, DefaultValue::string("1, 2")),
            Err(DefaultValueError::InvalidVector)
        );
        assert_eq!(
            check(&fx, &fx.structure("Rotator"), DefaultValue::string("0, 90")),
            Err(DefaultValueError::InvalidRotator)
        );

        let transform = fx.structure("Transform");
        assert!(check(&fx, &transform, DefaultValue::string("0,0,0|0,0,0|1,1,1")).is_ok());
        assert_eq!(
            check(&fx, &transform, DefaultValue::string("0,0,0|1,1,1")),
            Err(DefaultValueError::InvalidTransform)
        );

        let color = fx.structure("LinearColor");
        assert!(check(&fx, &color, DefaultValue::string("(R=1,G=0.5,B=0,A=1)")).is_ok());
        assert!(check(&fx, &color, DefaultValue::string("(R=1,G=0.5,B=0)")).is_ok());
        assert_eq!(
            check(&fx, &color, DefaultValue::string("(R=1,G=0.5)")),
            Err(DefaultValueError::InvalidLinearColor)
        );

        // Arbitrary structs are accepted as-is
        assert!(check(&fx, &fx.structure("HitResult"), DefaultValue::string("anything")).is_ok());

        let mut missing = vector;
        missing.sub_category_object = None;
        let err = check(&fx, &missing, DefaultValue::default()).unwrap_err();
        assert_eq!(err.to_string(), "No struct specified for pin 'Target'");
    }

    #[test]
    fn test_unsupported_categories() {
        let fx = Fixture::new();
        let err = check(&fx, &PinType::exec(), DefaultValue::default()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported type exec on pin Target");
        assert!(check(&fx, &PinType::wildcard(), DefaultValue::default()).is_err());
    }

    #[test]
    fn test_array_and_reference_pins() {
        let fx = Fixture::new();
        let schema = fx.schema();

        let mut kind = NodeKind::call(fx.ty("Actor"));
        if let NodeKind::CallFunction { auto_create_ref_term, .. } = &mut kind {
            auto_create_ref_term.push("Temp".to_string());
        }
        let node = GraphNode::new("call", kind)
            .with_pin(GraphPin::input("Values", PinType::int().array()))
            .with_pin(GraphPin::input("Out", PinType::int().by_ref()))
            .with_pin(GraphPin::input("Temp", PinType::int().by_ref()));
        let view = |name: &str| PinView {
            node: &node,
            pin: node.get_pin(name).unwrap(),
        };
        let value = DefaultValue::string("1");

        assert_eq!(
            schema.is_pin_default_valid(view("Values"), &value, false),
            Err(DefaultValueError::ArrayLiteral)
        );
        assert_eq!(
            schema.is_pin_default_valid(view("Out"), &value, false),
            Err(DefaultValueError::ReferenceLiteral)
        );
        assert!(schema.is_pin_default_valid(view("Out"), &value, true).is_ok());
        assert!(schema.is_pin_default_valid(view("Temp"), &value, false).is_ok());
    }

    #[test]
    fn test_autogenerated_defaults() {
        let fx = Fixture::new();
        let schema = fx.schema();

        assert_eq!(schema.autogenerated_default(&PinType::int()), "0");
        assert_eq!(schema.autogenerated_default(&PinType::int().array()), "");
        assert_eq!(schema.autogenerated_default(&PinType::byte()), "0");
        assert_eq!(schema.autogenerated_default(&PinType::enumeration(fx.ty("EColor"))), "Red");
        assert_eq!(schema.autogenerated_default(&PinType::float()), "0.0");
        assert_eq!(schema.autogenerated_default(&PinType::boolean()), "false");
        assert_eq!(schema.autogenerated_default(&PinType::name()), "None");
        assert_eq!(schema.autogenerated_default(&fx.structure("Rotator")), "0, 0, 0");
        assert_eq!(schema.autogenerated_default(&fx.structure("Transform")), "");
        assert_eq!(schema.autogenerated_default(&PinType::string()), "");
    }

    #[test]
    fn test_literal_parsers() {
        assert!(is_valid_integer(" +7 "));
        assert!(!is_valid_integer("-"));
        assert!(is_valid_float("2.5f"));
        assert!(!is_valid_float("inf"));
        assert!(is_numeric("-0.5"));
        assert!(!is_numeric("1.2.3"));
        assert!(!is_numeric("."));
        assert_eq!(parse_vector("1,2,3"), Some([1.0, 2.0, 3.0]));
        assert!(parse_vector("1,2,3,4").is_none());
    }
}

// Conversion Planning - Describe the node that bridges two incompatible pins
//
// Plans are plain descriptors. Building the node and rewiring the graph is up
// to the caller; `autowire_plan` only says which pins of the new node to use.

use std::fmt;

use pin_types::{PinCategory, PinDirection, PinType, TypeHandle};
use serde::Serialize;

use crate::{CastFunction, GraphPin, PinSchema, PinView};

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

/// Which kind of node a plan asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    FunctionCall,
    ArrayPromotion,
    PropertyAccess,
    EnumToName,
    EnumToString,
    ByteToEnum,
}

/// A property on a class, by declaring class and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyRef {
    pub owner: TypeHandle,
    pub name: String,
}

/// Conversion node to synthesize between an output and an input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionPlan {
    /// Call a library cast function
    FunctionCall { function: CastFunction },
    /// Wrap the scalar into a single-element array
    ArrayPromotion,
    /// Read an object property and call the function on that instead
    PropertyAccess { property: PropertyRef },
    EnumToName { enumeration: TypeHandle },
    EnumToString { enumeration: TypeHandle },
    /// Cast a byte to an enum; a `safe` cast yields the default entry when out of range
    ByteToEnum { enumeration: TypeHandle, safe: bool },
}

impl ConversionPlan {
    pub fn kind(&self) -> ConversionKind {
        match self {
            ConversionPlan::FunctionCall { .. } => ConversionKind::FunctionCall,
            ConversionPlan::ArrayPromotion => ConversionKind::ArrayPromotion,
            ConversionPlan::PropertyAccess { .. } => ConversionKind::PropertyAccess,
            ConversionPlan::EnumToName { .. } => ConversionKind::EnumToName,
            ConversionPlan::EnumToString { .. } => ConversionKind::EnumToString,
            ConversionPlan::ByteToEnum { .. } => ConversionKind::ByteToEnum,
        }
    }
}

impl fmt::Display for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionPlan::FunctionCall { function } => write!(f, "call {function}"),
            ConversionPlan::ArrayPromotion => f.write_str("make array"),
            ConversionPlan::PropertyAccess { property } => {
                write!(f, "get {} on {}", property.name, property.owner)
            }
            ConversionPlan::EnumToName { enumeration } => {
                write!(f, "enumerator name of {enumeration}")
            }
            ConversionPlan::EnumToString { enumeration } => {
                write!(f, "enumerator string of {enumeration}")
            }
            ConversionPlan::ByteToEnum { enumeration, safe } => {
                write!(f, "byte to enum {enumeration} (safe: {safe})")
            }
        }
    }
}

/// Pins of a freshly built conversion node to wire up, by index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutowirePlan {
    /// Input pin that receives the original output
    pub input_pin: Option<usize>,
    /// Output pin that feeds the original input
    pub output_pin: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Planner
// ─────────────────────────────────────────────────────────────────────────────

impl PinSchema<'_> {
    /// Conversion node bridging `output` into `input`, if any
    ///
    /// A scalar cast is preferred over a structural conversion.
    pub fn plan_conversion(&self, output: PinView<'_>, input: PinView<'_>) -> Option<ConversionPlan> {
        if let Some(function) = self.find_scalar_autocast(output.pin_type(), input.pin_type()) {
            return Some(ConversionPlan::FunctionCall { function });
        }
        self.find_structural_conversion(output, input)
    }

    /// Non-cast bridges: array promotion, member access, enum conversions
    pub fn find_structural_conversion(
        &self,
        output: PinView<'_>,
        input: PinView<'_>,
    ) -> Option<ConversionPlan> {
        let out_type = output.pin_type();
        let in_type = input.pin_type();

        if !out_type.is_array
            && in_type.is_array
            && self.are_pin_types_compatible(out_type, in_type, None, true)
        {
            return Some(ConversionPlan::ArrayPromotion);
        }

        if input.node.is_call_function()
            && input.is_self_pin()
            && out_type.category == PinCategory::Object
        {
            if let Some(property) = self.find_member_target(out_type, input) {
                return Some(ConversionPlan::PropertyAccess { property });
            }
        }

        if let Some(plan) = enum_to_name(out_type, in_type, self) {
            return Some(plan);
        }

        byte_to_enum(out_type, in_type, self)
    }

    /// Visible, readable object property of the output's class whose type declares
    /// the function called on `input`'s node
    ///
    /// When several properties qualify, the last one wins.
    fn find_member_target(&self, out_type: &PinType, input: PinView<'_>) -> Option<PropertyRef> {
        let function_class = input.node.function_class()?;
        let output_class = out_type.sub_category_object?;
        let reflection = self.reflection();
        if !reflection.is_class_like(output_class) {
            return None;
        }

        reflection
            .object_properties(output_class)
            .into_iter()
            .filter(|p| {
                p.blueprint_visible
                    && p.readable
                    && reflection.is_child_of(p.value_class, function_class)
            })
            .last()
            .map(|p| PropertyRef {
                owner: p.owner,
                name: p.name,
            })
    }

    /// Which pins of a conversion node to wire between `source` and `destination`
    ///
    /// Each side is wired at most once, to the first compatible pin.
    pub fn autowire_plan(
        &self,
        conversion_pins: &[GraphPin],
        source: &PinType,
        destination: &PinType,
    ) -> AutowirePlan {
        let context = self.calling_context();
        let mut plan = AutowirePlan::default();

        for (index, pin) in conversion_pins.iter().enumerate() {
            match pin.direction {
                PinDirection::Input if plan.input_pin.is_none() => {
                    if self.are_pin_types_compatible(source, &pin.pin_type, context, false) {
                        plan.input_pin = Some(index);
                    }
                }
                PinDirection::Output if plan.output_pin.is_none() => {
                    if self.are_pin_types_compatible(&pin.pin_type, destination, context, false) {
                        plan.output_pin = Some(index);
                    }
                }
                _ => {}
            }
        }
        plan
    }
}

fn enum_to_name(output: &PinType, input: &PinType, schema: &PinSchema<'_>) -> Option<ConversionPlan> {
    if input.is_array || output.is_array || output.category != PinCategory::Byte {
        return None;
    }
    let enumeration = output
        .sub_category_object
        .filter(|e| schema.reflection().is_enum(*e))?;
    match input.category {
        PinCategory::Name => Some(ConversionPlan::EnumToName { enumeration }),
        PinCategory::String => Some(ConversionPlan::EnumToString { enumeration }),
        _ => None,
    }
}

fn byte_to_enum(output: &PinType, input: &PinType, schema: &PinSchema<'_>) -> Option<ConversionPlan> {
    if input.is_array || output.is_array {
        return None;
    }
    if input.category != PinCategory::Byte || output.category != PinCategory::Byte {
        return None;
    }
    let enumeration = input
        .sub_category_object
        .filter(|e| schema.reflection().is_enum(*e))?;
    Some(ConversionPlan::ByteToEnum {
        enumeration,
        safe: true,
    })
}

// Compatibility - Can an output of one type feed an input of another?
//
// Pure structural rules: array shape first, then same-category refinements
// (subtyping, interfaces, enums, delegate signatures), then wildcards.

use pin_types::{NominalKind, PinCategory, PinDirection, PinType, SubCategory, TypeHandle};

use crate::{PinSchema, PinView};

/// Order two pins as (output, input); `None` unless directions are opposite
pub fn categorize_by_direction<'g>(
    a: PinView<'g>,
    b: PinView<'g>,
) -> Option<(PinView<'g>, PinView<'g>)> {
    match (a.direction(), b.direction()) {
        (PinDirection::Output, PinDirection::Input) => Some((a, b)),
        (PinDirection::Input, PinDirection::Output) => Some((b, a)),
        _ => None,
    }
}

/// Index wildcards only accept scalar bool, byte and int
pub fn is_index_wildcard_compatible(other: &PinType) -> bool {
    !other.is_array
        && matches!(
            other.category,
            PinCategory::Boolean | PinCategory::Byte | PinCategory::Int
        )
}

impl PinSchema<'_> {
    /// Whether a pin of type `output` may feed a pin of type `input`
    ///
    /// `calling_context` substitutes for `self` placeholders on either side.
    /// With `ignore_array_mismatch`, array-ness is not compared at all.
    pub fn are_pin_types_compatible(
        &self,
        output: &PinType,
        input: &PinType,
        calling_context: Option<TypeHandle>,
        ignore_array_mismatch: bool,
    ) -> bool {
        if output.is_bad_type() || input.is_bad_type() {
            return false;
        }

        // Only a scalar wildcard input may ignore the array shape
        if !ignore_array_mismatch
            && output.is_array != input.is_array
            && (!input.is_wildcard() || input.is_array)
        {
            return false;
        }

        if output.category == input.category {
            self.same_category_compatible(output, input, calling_context)
        } else if output.is_wildcard() || input.is_wildcard() {
            if output.sub_category == SubCategory::Index {
                is_index_wildcard_compatible(input)
            } else if input.sub_category == SubCategory::Index {
                is_index_wildcard_compatible(output)
            } else {
                true
            }
        } else {
            false
        }
    }

    /// Direction-aware form of `are_pin_types_compatible`
    pub fn are_pins_compatible(
        &self,
        a: PinView<'_>,
        b: PinView<'_>,
        calling_context: Option<TypeHandle>,
        ignore_array_mismatch: bool,
    ) -> bool {
        match categorize_by_direction(a, b) {
            Some((output, input)) => self.are_pin_types_compatible(
                output.pin_type(),
                input.pin_type(),
                calling_context,
                ignore_array_mismatch,
            ),
            None => false,
        }
    }

    fn same_category_compatible(
        &self,
        output: &PinType,
        input: &PinType,
        calling_context: Option<TypeHandle>,
    ) -> bool {
        if output.sub_category == input.sub_category
            && output.sub_category_object == input.sub_category_object
        {
            return true;
        }

        match output.category {
            PinCategory::Object | PinCategory::Class | PinCategory::Struct => {
                self.nominal_compatible(output, input, calling_context)
            }
            // Enums still widen to plain bytes
            PinCategory::Byte if output.sub_category == input.sub_category => {
                input.sub_category_object.is_none()
            }
            PinCategory::Delegate | PinCategory::MulticastDelegate => {
                match (output.sub_category_object, input.sub_category_object) {
                    (Some(out_sig), Some(in_sig)) => {
                        self.reflection().is_signature_compatible(out_sig, in_sig)
                    }
                    // Signature still being edited
                    _ => true,
                }
            }
            _ => false,
        }
    }

    fn nominal_compatible(
        &self,
        output: &PinType,
        input: &PinType,
        calling_context: Option<TypeHandle>,
    ) -> bool {
        let resolve = |pin_type: &PinType| {
            if pin_type.is_self_placeholder() {
                calling_context
            } else {
                pin_type.sub_category_object
            }
        };
        let (Some(out_ty), Some(in_ty)) = (resolve(output), resolve(input)) else {
            return false;
        };

        let reflection = self.reflection();
        let out_is_interface = reflection.is_interface(out_ty);
        let in_is_interface = reflection.is_interface(in_ty);

        if out_is_interface != in_is_interface {
            let is_class = |ty| reflection.kind(ty) == Some(NominalKind::Class);
            return if in_is_interface && is_class(out_ty) {
                reflection.implements_interface(out_ty, in_ty)
            } else if out_is_interface && is_class(in_ty) {
                reflection.implements_interface(in_ty, out_ty)
            } else {
                false
            };
        }

        reflection.is_child_of(out_ty, in_ty)
    }
}

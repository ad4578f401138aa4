// Pin Type Syntax - Compact textual notation for pin types
//
//   int               scalar
//   float[]           array
//   &int              by reference
//   const int         const
//   weak object<A>    weak object pointer
//   object<Actor>     nominal object
//   object<self>      calling-context placeholder
//   byte<EColor>      enumeration
//   wildcard<index>   index wildcard
//
// Used by type manifests, graph files and the command line.

use crate::{PinCategory, PinType, PinTypeError, SubCategory, TypeDatabase, TypeReflection};

/// Parse a pin type, resolving nominal names against the database
pub fn parse_pin_type(text: &str, db: &TypeDatabase) -> Result<PinType, PinTypeError> {
    let syntax_error = || PinTypeError::Syntax(text.to_string());

    let mut rest = text.trim();
    let mut is_const = false;
    let mut is_weak = false;
    let mut is_reference = false;

    loop {
        if let Some(stripped) = rest.strip_prefix("const ") {
            is_const = true;
            rest = stripped.trim_start();
        } else if let Some(stripped) = rest.strip_prefix("weak ") {
            is_weak = true;
            rest = stripped.trim_start();
        } else if let Some(stripped) = rest.strip_prefix('&') {
            is_reference = true;
            rest = stripped.trim_start();
        } else {
            break;
        }
    }

    let (rest, is_array) = match rest.strip_suffix("[]") {
        Some(stripped) => (stripped.trim_end(), true),
        None => (rest, false),
    };

    let (key, argument) = match rest.split_once('<') {
        Some((key, tail)) => {
            let argument = tail.strip_suffix('>').ok_or_else(syntax_error)?.trim();
            if argument.is_empty() {
                return Err(syntax_error());
            }
            (key.trim(), Some(argument))
        }
        None => (rest, None),
    };

    if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '>') {
        return Err(syntax_error());
    }

    let category = PinCategory::from_key(key);
    let mut pin_type = PinType::new(category.clone());

    if let Some(argument) = argument {
        let nominal = category.is_nominal()
            || category.is_delegate_family()
            || category == PinCategory::Byte;
        if nominal && argument != "self" {
            let handle = db
                .lookup(argument)
                .ok_or_else(|| PinTypeError::UnknownType(argument.to_string()))?;
            pin_type.sub_category_object = Some(handle);
        } else {
            pin_type.sub_category = SubCategory::from_tag(argument);
        }
    }

    pin_type.is_array = is_array;
    pin_type.is_reference = is_reference;
    pin_type.is_const = is_const;
    pin_type.is_weak_pointer = is_weak;

    pin_type.validate_shape(db)?;
    Ok(pin_type)
}

/// Inverse of `parse_pin_type`
pub fn format_pin_type(pin_type: &PinType, reflection: &dyn TypeReflection) -> String {
    let mut out = String::new();
    if pin_type.is_const {
        out.push_str("const ");
    }
    if pin_type.is_weak_pointer {
        out.push_str("weak ");
    }
    if pin_type.is_reference {
        out.push('&');
    }
    out.push_str(pin_type.category.as_str());

    if let Some(object) = pin_type.sub_category_object {
        let name = reflection
            .type_name(object)
            .map(str::to_string)
            .unwrap_or_else(|| object.to_string());
        out.push('<');
        out.push_str(&name);
        out.push('>');
    } else if !pin_type.sub_category.is_none() {
        out.push('<');
        out.push_str(pin_type.sub_category.as_str());
        out.push('>');
    }

    if pin_type.is_array {
        out.push_str("[]");
    }
    out
}

// Pin Schema - Entry point of the connection rules
//
// A `PinSchema` borrows the reflection database and carries the calling
// context used to resolve `self` placeholders. The rules themselves live in
// `compat`, `autocast`, `conversion`, `connection` and `defaults`.

use pin_types::{PinType, TypeHandle, TypeReflection, type_to_display_string};

/// Connection rules for one graph's calling context
#[derive(Clone, Copy)]
pub struct PinSchema<'r> {
    reflection: &'r dyn TypeReflection,
    calling_context: Option<TypeHandle>,
}

impl<'r> PinSchema<'r> {
    pub fn new(reflection: &'r dyn TypeReflection) -> Self {
        Self {
            reflection,
            calling_context: None,
        }
    }

    /// Class that `self` placeholders resolve to
    pub fn with_calling_context(mut self, calling_context: Option<TypeHandle>) -> Self {
        self.calling_context = calling_context;
        self
    }

    pub fn reflection(&self) -> &'r dyn TypeReflection {
        self.reflection
    }

    pub fn calling_context(&self) -> Option<TypeHandle> {
        self.calling_context
    }

    /// Diagnostic string for a pin type
    pub fn type_to_string(&self, pin_type: &PinType) -> String {
        type_to_display_string(pin_type, self.reflection)
    }
}

impl std::fmt::Debug for PinSchema<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinSchema")
            .field("calling_context", &self.calling_context)
            .finish_non_exhaustive()
    }
}

//! Pin Types - Type model for visual-script graph pins
//!
//! This crate contains the pure data structures describing what flows through a
//! pin, plus the read-only view of the type-reflection database that the
//! connection schema consults.
//!
//! ## Modules
//!
//! - `category` - category tags and sub-category tags
//! - `pin_type` - the immutable `PinType` value and its display form
//! - `reflection` - handles into the nominal type database and the query trait
//! - `database` - in-memory reflection database loadable from TOML
//! - `syntax` - textual pin type notation (`object<Actor>`, `float[]`, ...)
//! - `property` - reflected property descriptors to pin types

mod category;
mod database;
mod pin_type;
mod property;
mod reflection;
mod syntax;

pub use category::*;
pub use database::*;
pub use pin_type::*;
pub use property::*;
pub use reflection::*;
pub use syntax::*;

//! Pin Schema - Connection rules for visual-script graphs
//!
//! Given a read-only graph snapshot and the reflection database, the schema
//! answers whether two pins may be linked, what has to give way if they are,
//! and which conversion node would bridge two pins that do not match.
//!
//! ## Modules
//!
//! - `graph` - graph snapshot, pin addresses, node veto hooks, JSON graph files
//! - `schema` - the `PinSchema` entry point and its calling context
//! - `compat` - type compatibility between an output and an input
//! - `autocast` - fixed table of scalar conversion functions
//! - `conversion` - conversion plans beyond the cast table, autowiring
//! - `connection` - connection verdicts and link invalidation
//! - `defaults` - literal default values for unconnected pins

mod autocast;
mod compat;
mod connection;
mod conversion;
mod defaults;
mod graph;
mod schema;

#[cfg(test)]
mod fixtures;

pub use autocast::*;
pub use compat::*;
pub use connection::*;
pub use conversion::*;
pub use defaults::*;
pub use graph::*;
pub use schema::*;

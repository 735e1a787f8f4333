//! The Star Wars trilogy, as a schema with an interface, a union, an enum and
//! cyclic type references.

mod schema;

pub use self::schema::{request, schema};

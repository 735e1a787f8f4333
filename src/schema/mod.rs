//! Schema description, validation and registration

pub mod meta;
pub mod model;
mod printer;
pub mod validation;

//! Provides serialization of the types crossing the wire
#[doc(hidden)]
pub mod serde;

//! Type system surface consumed by the marshalling layer
//!
//! Architecture:
//! - `primitive.rs` - primitive kinds, tagged values, the `Primitive` trait
//! - `descriptor.rs` - per-type layout and behaviour hooks
//! - `signature.rs` - parameter, return and signature descriptors

mod descriptor;
mod primitive;
mod signature;

pub use descriptor::{TypeBehaviours, TypeCategory, TypeDescriptor};
pub use primitive::{Primitive, PrimitiveKind, PrimitiveValue};
pub use signature::{ParamDescriptor, ParamModifier, ReturnType, Signature, SlotKind};

#[cfg(test)]
mod tests;

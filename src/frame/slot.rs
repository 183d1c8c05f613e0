//! Argument and return slot representations

use super::storage::{OwnedObject, RawStorage};
use crate::config::CoercionPolicy;
use crate::error::MarshalError;
use crate::types::{PrimitiveKind, PrimitiveValue};
use core::fmt;

/// Already-evaluated argument supplied by the caller
///
/// - `Primitive`: narrowed or widened to the declared kind per policy
/// - `Handle`: object address carrying the caller's reference (may be null)
/// - `Object`: address of a value-type instance the frame copies
/// - `Reference`: address bound to a `&in`, `&out` or `&inout` parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue {
    Primitive(PrimitiveValue),
    Handle(*mut u8),
    Object(*const u8),
    Reference(*mut u8),
}

impl ArgValue {
    #[inline]
    pub fn null_handle() -> Self {
        Self::Handle(core::ptr::null_mut())
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Primitive(v) => v.kind().to_string(),
            Self::Handle(_) => "handle".to_string(),
            Self::Object(_) => "object".to_string(),
            Self::Reference(_) => "reference".to_string(),
        }
    }
}

macro_rules! impl_arg_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ArgValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    ArgValue::Primitive(PrimitiveValue::from(v))
                }
            }
        )*
    };
}

impl_arg_from!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl From<PrimitiveValue> for ArgValue {
    #[inline]
    fn from(v: PrimitiveValue) -> Self {
        ArgValue::Primitive(v)
    }
}

/// Stored argument; the tag never changes after construction
pub(crate) enum ArgSlot {
    Primitive(PrimitiveValue),
    Handle { address: *mut u8, claimed: bool },
    Object(OwnedObject),
    Reference(*mut u8),
}

impl ArgSlot {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Primitive(v) => v.kind().to_string(),
            Self::Handle { .. } => "handle".to_string(),
            Self::Object(obj) => obj.type_descriptor().name().to_string(),
            Self::Reference(_) => "reference".to_string(),
        }
    }
}

impl fmt::Debug for ArgSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(v) => write!(f, "Primitive({:?})", v),
            Self::Handle { address, claimed } => {
                write!(f, "Handle({:?}, claimed: {})", address, claimed)
            }
            Self::Object(obj) => write!(f, "Object({:?})", obj),
            Self::Reference(address) => write!(f, "Reference({:?})", address),
        }
    }
}

/// Return slot, shaped by the declared return type
pub(crate) enum ReturnSlot {
    Void,
    /// Zero until the callee writes it
    Primitive(PrimitiveValue),
    /// Preallocated, uninitialised until constructed by the callee
    Object {
        storage: RawStorage,
        constructed: bool,
    },
    /// Starts null
    Handle(*mut u8),
    Reference(*mut u8),
}

impl ReturnSlot {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Primitive(_) => "primitive",
            Self::Object { .. } => "object",
            Self::Handle(_) => "handle",
            Self::Reference(_) => "reference",
        }
    }
}

/// Bring `value` to `declared` under `policy`
pub(crate) fn coerce(
    value: PrimitiveValue,
    declared: PrimitiveKind,
    policy: CoercionPolicy,
) -> Option<PrimitiveValue> {
    if value.kind() == declared {
        return Some(value);
    }
    match policy {
        CoercionPolicy::Strict => None,
        CoercionPolicy::Convert => Some(value.convert(declared)),
    }
}

pub(crate) fn mismatch(index: usize, declared: impl ToString, requested: impl ToString) -> MarshalError {
    MarshalError::TypeMismatch {
        index,
        declared: declared.to_string(),
        requested: requested.to_string(),
    }
}

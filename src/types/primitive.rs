//! Primitive kinds and values carried in argument and return slots
//!
//! Every supported width has its own variant so a slot's tag always states
//! the exact bit width that was declared at registration.

use core::alloc::Layout;
use core::fmt;
use num_traits::AsPrimitive;

/// Primitive type kind of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Size of the kind in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    #[inline]
    pub const fn align(self) -> usize {
        self.layout().align()
    }

    pub const fn layout(self) -> Layout {
        match self {
            Self::Bool => Layout::new::<bool>(),
            Self::I8 | Self::U8 => Layout::new::<u8>(),
            Self::I16 | Self::U16 => Layout::new::<u16>(),
            Self::I32 | Self::U32 => Layout::new::<u32>(),
            Self::F32 => Layout::new::<f32>(),
            Self::I64 | Self::U64 => Layout::new::<u64>(),
            Self::F64 => Layout::new::<f64>(),
        }
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Script-facing name of the kind
    pub const fn script_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint",
            Self::U64 => "uint64",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// Tagged primitive value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

macro_rules! cast_into {
    ($src:expr, $to:expr) => {{
        let src = $src;
        match $to {
            PrimitiveKind::Bool => {
                let wide: f64 = src.as_();
                PrimitiveValue::Bool(wide != 0.0)
            }
            PrimitiveKind::I8 => PrimitiveValue::I8(src.as_()),
            PrimitiveKind::I16 => PrimitiveValue::I16(src.as_()),
            PrimitiveKind::I32 => PrimitiveValue::I32(src.as_()),
            PrimitiveKind::I64 => PrimitiveValue::I64(src.as_()),
            PrimitiveKind::U8 => PrimitiveValue::U8(src.as_()),
            PrimitiveKind::U16 => PrimitiveValue::U16(src.as_()),
            PrimitiveKind::U32 => PrimitiveValue::U32(src.as_()),
            PrimitiveKind::U64 => PrimitiveValue::U64(src.as_()),
            PrimitiveKind::F32 => PrimitiveValue::F32(src.as_()),
            PrimitiveKind::F64 => PrimitiveValue::F64(src.as_()),
        }
    }};
}

impl PrimitiveValue {
    /// Zero bit pattern of the given kind
    pub const fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
        }
    }

    #[inline]
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::I8(_) => PrimitiveKind::I8,
            Self::I16(_) => PrimitiveKind::I16,
            Self::I32(_) => PrimitiveKind::I32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::U8(_) => PrimitiveKind::U8,
            Self::U16(_) => PrimitiveKind::U16,
            Self::U32(_) => PrimitiveKind::U32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
        }
    }

    /// Convert with `as` semantics: integers truncate or extend, floats
    /// saturate into integers, anything non-zero becomes `true`.
    pub fn convert(self, to: PrimitiveKind) -> Self {
        if self.kind() == to {
            return self;
        }
        match self {
            Self::Bool(v) => cast_into!(v as u8, to),
            Self::I8(v) => cast_into!(v, to),
            Self::I16(v) => cast_into!(v, to),
            Self::I32(v) => cast_into!(v, to),
            Self::I64(v) => cast_into!(v, to),
            Self::U8(v) => cast_into!(v, to),
            Self::U16(v) => cast_into!(v, to),
            Self::U32(v) => cast_into!(v, to),
            Self::U64(v) => cast_into!(v, to),
            Self::F32(v) => cast_into!(v, to),
            Self::F64(v) => cast_into!(v, to),
        }
    }

    /// Address of the stored bits, valid while `self` is not moved
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        match self {
            Self::Bool(v) => v as *mut bool as *mut u8,
            Self::I8(v) => v as *mut i8 as *mut u8,
            Self::I16(v) => v as *mut i16 as *mut u8,
            Self::I32(v) => v as *mut i32 as *mut u8,
            Self::I64(v) => v as *mut i64 as *mut u8,
            Self::U8(v) => v as *mut u8,
            Self::U16(v) => v as *mut u16 as *mut u8,
            Self::U32(v) => v as *mut u32 as *mut u8,
            Self::U64(v) => v as *mut u64 as *mut u8,
            Self::F32(v) => v as *mut f32 as *mut u8,
            Self::F64(v) => v as *mut f64 as *mut u8,
        }
    }
}

/// Rust types that map one-to-one onto a [`PrimitiveKind`]
pub trait Primitive: Copy + 'static {
    const KIND: PrimitiveKind;

    fn into_value(self) -> PrimitiveValue;

    /// Extract when the value's kind is exactly `Self::KIND`
    fn from_value(value: PrimitiveValue) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$variant;

                #[inline]
                fn into_value(self) -> PrimitiveValue {
                    PrimitiveValue::$variant(self)
                }

                #[inline]
                fn from_value(value: PrimitiveValue) -> Option<Self> {
                    match value {
                        PrimitiveValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for PrimitiveValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    PrimitiveValue::$variant(v)
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

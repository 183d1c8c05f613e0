//! Parameter, return and signature descriptors resolved at registration

use super::descriptor::{TypeCategory, TypeDescriptor};
use super::primitive::PrimitiveKind;
use core::fmt;
use std::sync::Arc;

/// Reference modifier of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamModifier {
    /// Passed by value (or as a handle)
    None,
    /// `&in`: read-only reference to a caller-owned value
    InRef,
    /// `&out`: reference to a default-constructed instance the callee may overwrite
    OutRef,
    /// `&inout`: reference to a live caller-owned value
    InOutRef,
}

/// How an argument is stored in its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Primitive(PrimitiveKind),
    Handle,
    Object,
    Reference,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::Handle => f.write_str("handle"),
            Self::Object => f.write_str("object"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// Descriptor of one parameter
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    ty: Arc<TypeDescriptor>,
    handle: bool,
    auto_handle: bool,
    modifier: ParamModifier,
}

impl ParamDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            ty: Arc::new(TypeDescriptor::primitive(kind)),
            handle: false,
            auto_handle: false,
            modifier: ParamModifier::None,
        }
    }

    /// Value object passed by value
    pub fn value(ty: Arc<TypeDescriptor>) -> Self {
        Self {
            ty,
            handle: false,
            auto_handle: false,
            modifier: ParamModifier::None,
        }
    }

    /// Object handle (`T@`)
    pub fn handle(ty: Arc<TypeDescriptor>) -> Self {
        Self {
            ty,
            handle: true,
            auto_handle: false,
            modifier: ParamModifier::None,
        }
    }

    /// Reference parameter (`T &in`, `T &out`, `T &inout`)
    pub fn reference(ty: Arc<TypeDescriptor>, modifier: ParamModifier) -> Self {
        Self {
            ty,
            handle: false,
            auto_handle: false,
            modifier,
        }
    }

    /// Mark a handle parameter as auto-handle (`T@+`)
    pub fn auto_handle(mut self) -> Self {
        debug_assert!(self.handle, "auto-handle applies to handle parameters only");
        self.auto_handle = self.handle;
        self
    }

    #[inline]
    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    #[inline]
    pub fn is_handle(&self) -> bool {
        self.handle
    }

    #[inline]
    pub fn is_auto_handle(&self) -> bool {
        self.auto_handle
    }

    #[inline]
    pub fn modifier(&self) -> ParamModifier {
        self.modifier
    }

    /// Slot representation implied by type and modifiers
    pub fn slot_kind(&self) -> SlotKind {
        if self.modifier != ParamModifier::None {
            return SlotKind::Reference;
        }
        if self.handle {
            return SlotKind::Handle;
        }
        match self.ty.category() {
            TypeCategory::Primitive(kind) => SlotKind::Primitive(kind),
            TypeCategory::Value => SlotKind::Object,
            // reference types by value are passed by address
            TypeCategory::Reference => SlotKind::Reference,
        }
    }
}

impl fmt::Display for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        if self.handle {
            f.write_str("@")?;
        }
        if self.auto_handle {
            f.write_str("+")?;
        }
        match self.modifier {
            ParamModifier::None => Ok(()),
            ParamModifier::InRef => f.write_str(" &in"),
            ParamModifier::OutRef => f.write_str(" &out"),
            ParamModifier::InOutRef => f.write_str(" &inout"),
        }
    }
}

/// Declared return type
#[derive(Debug, Clone)]
pub enum ReturnType {
    Void,
    Primitive(PrimitiveKind),
    /// Value object returned by value into preallocated storage
    Value(Arc<TypeDescriptor>),
    /// Object handle; `auto_handle` is the `@+` return modifier
    Handle {
        ty: Arc<TypeDescriptor>,
        auto_handle: bool,
    },
    /// Reference to an existing instance
    Reference(Arc<TypeDescriptor>),
}

impl ReturnType {
    pub fn handle(ty: Arc<TypeDescriptor>) -> Self {
        Self::Handle {
            ty,
            auto_handle: false,
        }
    }

    pub fn auto_handle(ty: Arc<TypeDescriptor>) -> Self {
        Self::Handle {
            ty,
            auto_handle: true,
        }
    }

    pub fn type_descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Value(ty) | Self::Handle { ty, .. } | Self::Reference(ty) => Some(ty),
            Self::Void | Self::Primitive(_) => None,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::Value(ty) => write!(f, "{}", ty),
            Self::Handle { ty, auto_handle } => {
                write!(f, "{}@{}", ty, if *auto_handle { "+" } else { "" })
            }
            Self::Reference(ty) => write!(f, "{}&", ty),
        }
    }
}

/// Resolved signature of a registered function or method
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    object_type: Option<Arc<TypeDescriptor>>,
    params: Vec<ParamDescriptor>,
    return_type: ReturnType,
}

impl Signature {
    /// Global function (or static method) signature
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: None,
            params: Vec::new(),
            return_type: ReturnType::Void,
        }
    }

    /// Class method signature; calls require an object pointer
    pub fn method(object_type: Arc<TypeDescriptor>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: Some(object_type),
            params: Vec::new(),
            return_type: ReturnType::Void,
        }
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Type::name` for methods, `name` otherwise
    pub fn qualified_name(&self) -> String {
        match &self.object_type {
            Some(ty) => format!("{}::{}", ty.name(), self.name),
            None => self.name.clone(),
        }
    }

    #[inline]
    pub fn object_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.object_type.as_ref()
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        self.object_type.is_some()
    }

    #[inline]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.qualified_name())?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")
    }
}

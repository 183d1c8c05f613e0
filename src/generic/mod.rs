//! Generic call context - the only interface a generic native function sees
//!
//! Wraps one [`CallFrame`]. Every argument can be read as a typed value or
//! through its raw address; the return slot is written through typed
//! setters or its raw address; the exception flag is raised here.
//!
//! ```ignore
//! // registered as: MyIntf@ func(int, float, MyIntf@+)
//! fn my_generic_function(gen: &mut GenericCall<'_>) {
//!     let (Ok(a), Ok(b), Ok(obj)) = (gen.arg_i32(0), gen.arg_f32(1), gen.arg_object(2)) else {
//!         return;
//!     };
//!     let ret = my_function(a, b, obj);
//!     let _ = gen.set_return_object(ret);
//! }
//! ```

use crate::config::CoercionPolicy;
use crate::error::MarshalError;
use crate::frame::{coerce, mismatch, ArgSlot, CallFrame, ReturnSlot};
use crate::logging::{log_protocol_warning, log_script_exception};
use crate::object::HandleRef;
use crate::types::{ParamDescriptor, Primitive, PrimitiveKind, PrimitiveValue, ReturnType, Signature, TypeDescriptor};
use core::fmt;
use std::any::Any;
use std::sync::Arc;

pub struct GenericCall<'a> {
    frame: &'a mut CallFrame,
    auxiliary: Option<&'a (dyn Any + Send + Sync + 'static)>,
}

macro_rules! typed_accessors {
    ($($get:ident, $set:ident => $ty:ty;)*) => {
        $(
            #[inline]
            pub fn $get(&self, index: usize) -> Result<$ty, MarshalError> {
                self.arg::<$ty>(index)
            }

            #[inline]
            pub fn $set(&mut self, value: $ty) -> Result<(), MarshalError> {
                self.set_return(value)
            }
        )*
    };
}

impl<'a> GenericCall<'a> {
    pub fn new(frame: &'a mut CallFrame) -> Self {
        Self {
            frame,
            auxiliary: None,
        }
    }

    /// Context exposing the auxiliary object registered with the function
    pub fn with_auxiliary(
        frame: &'a mut CallFrame,
        auxiliary: Option<&'a (dyn Any + Send + Sync + 'static)>,
    ) -> Self {
        Self { frame, auxiliary }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[inline]
    pub fn argument_count(&self) -> usize {
        self.frame.argument_count()
    }

    pub fn argument_type(&self, index: usize) -> Result<&ParamDescriptor, MarshalError> {
        self.frame.check_index(index)?;
        Ok(&self.frame.signature.params()[index])
    }

    #[inline]
    pub fn declared_return_type(&self) -> &ReturnType {
        self.frame.declared_return_type()
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.frame.signature
    }

    #[inline]
    pub fn function_name(&self) -> &str {
        self.frame.signature.name()
    }

    /// Receiver address; only valid for method registrations
    #[inline]
    pub fn object_pointer(&self) -> Result<*mut u8, MarshalError> {
        self.frame.object_pointer()
    }

    #[inline]
    pub fn object_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.frame.signature.object_type()
    }

    /// Auxiliary object registered with the function, if it is a `T`
    pub fn auxiliary<T: Any>(&self) -> Option<&T> {
        self.auxiliary.and_then(|aux| aux.downcast_ref::<T>())
    }

    #[inline]
    pub fn policy(&self) -> CoercionPolicy {
        self.frame.policy
    }

    // ------------------------------------------------------------------
    // Arguments
    // ------------------------------------------------------------------

    /// Read a primitive argument as `kind`
    ///
    /// Under the strict policy `kind` must be the declared kind; under the
    /// converting policy integers truncate or extend and floats convert.
    pub fn get_argument_as(&self, index: usize, kind: PrimitiveKind) -> Result<PrimitiveValue, MarshalError> {
        self.frame.check_index(index)?;
        match &self.frame.slots[index] {
            ArgSlot::Primitive(value) => {
                coerce(*value, kind, self.frame.policy).ok_or_else(|| mismatch(index, value.kind(), kind))
            }
            other => Err(mismatch(index, other.describe(), kind)),
        }
    }

    /// Read a primitive argument as `T`
    pub fn arg<T: Primitive>(&self, index: usize) -> Result<T, MarshalError> {
        let value = self.get_argument_as(index, T::KIND)?;
        T::from_value(value).ok_or_else(|| mismatch(index, value.kind(), T::KIND))
    }

    typed_accessors! {
        arg_bool, set_return_bool => bool;
        arg_i8, set_return_i8 => i8;
        arg_i16, set_return_i16 => i16;
        arg_i32, set_return_i32 => i32;
        arg_i64, set_return_i64 => i64;
        arg_u8, set_return_u8 => u8;
        arg_u16, set_return_u16 => u16;
        arg_u32, set_return_u32 => u32;
        arg_u64, set_return_u64 => u64;
        arg_f32, set_return_f32 => f32;
        arg_f64, set_return_f64 => f64;
    }

    /// Address of the argument's stored value
    ///
    /// Primitive slots yield the address of the value inside the frame,
    /// handle slots the address of the handle, value objects the frame's
    /// copy, and reference parameters the referenced address. For `&out`
    /// parameters that address already holds a default instance.
    pub fn address_of_argument(&mut self, index: usize) -> Result<*mut u8, MarshalError> {
        self.frame.check_index(index)?;
        let ptr = match &mut self.frame.slots[index] {
            ArgSlot::Primitive(value) => value.as_mut_ptr(),
            ArgSlot::Handle { address, .. } => (address as *mut *mut u8).cast::<u8>(),
            ArgSlot::Object(obj) => obj.as_ptr(),
            ArgSlot::Reference(ptr) => *ptr,
        };
        Ok(ptr)
    }

    /// Address carried by a reference or handle argument
    pub fn arg_address(&self, index: usize) -> Result<*mut u8, MarshalError> {
        self.frame.check_index(index)?;
        match &self.frame.slots[index] {
            ArgSlot::Reference(ptr) => Ok(*ptr),
            ArgSlot::Handle { address, .. } => Ok(*address),
            other => Err(mismatch(index, other.describe(), "address")),
        }
    }

    /// Object address of a handle or by-value object argument
    ///
    /// Does not claim the handle: the frame still releases it at teardown
    /// unless [`take_arg_handle`](Self::take_arg_handle) is called.
    pub fn arg_object(&self, index: usize) -> Result<*mut u8, MarshalError> {
        self.frame.check_index(index)?;
        match &self.frame.slots[index] {
            ArgSlot::Handle { address, .. } => Ok(*address),
            ArgSlot::Object(obj) => Ok(obj.as_ptr()),
            other => Err(mismatch(index, other.describe(), "object")),
        }
    }

    /// Claim the reference carried by a handle argument
    ///
    /// The returned owner releases on drop; `into_raw` keeps the reference
    /// alive elsewhere. A null handle claims successfully as `None`.
    pub fn take_arg_handle(&mut self, index: usize) -> Result<Option<HandleRef>, MarshalError> {
        self.frame.check_index(index)?;
        let ty = Arc::clone(self.frame.signature.params()[index].type_descriptor());
        match &mut self.frame.slots[index] {
            ArgSlot::Handle { address, claimed } => {
                if *claimed {
                    return Err(MarshalError::HandleAlreadyClaimed { index });
                }
                *claimed = true;
                Ok(unsafe { HandleRef::from_raw(*address, ty) })
            }
            other => Err(mismatch(index, other.describe(), "handle")),
        }
    }

    // ------------------------------------------------------------------
    // Return value
    // ------------------------------------------------------------------

    /// Write a primitive return value, coerced to the declared kind per policy
    pub fn set_return_value(&mut self, value: PrimitiveValue) -> Result<(), MarshalError> {
        let policy = self.frame.policy;
        let declared = self.frame.signature.return_type();
        match &mut self.frame.ret {
            ReturnSlot::Primitive(slot) => {
                let kind = slot.kind();
                *slot = coerce(value, kind, policy).ok_or_else(|| MarshalError::ReturnTypeMismatch {
                    declared: kind.to_string(),
                    attempted: value.kind().to_string(),
                })?;
                Ok(())
            }
            _ => Err(MarshalError::ReturnTypeMismatch {
                declared: declared.to_string(),
                attempted: value.kind().to_string(),
            }),
        }
    }

    #[inline]
    pub fn set_return<T: Primitive>(&mut self, value: T) -> Result<(), MarshalError> {
        self.set_return_value(value.into_value())
    }

    /// Store an address as the return value without touching reference counts
    ///
    /// For handle returns the callee transfers a reference it already owns.
    /// A different handle set earlier in the same call is released; setting
    /// the same handle again restates the one transfer.
    pub fn set_return_address(&mut self, ptr: *mut u8) -> Result<(), MarshalError> {
        let signature = Arc::clone(&self.frame.signature);
        match (&mut self.frame.ret, signature.return_type()) {
            (ReturnSlot::Handle(current), ReturnType::Handle { ty, .. }) => {
                let previous = core::mem::replace(current, ptr);
                if !previous.is_null() && previous != ptr {
                    log_protocol_warning(signature.name(), "handle return overwritten; releasing previous");
                    unsafe { ty.release(previous) };
                }
                Ok(())
            }
            (ReturnSlot::Reference(current), _) => {
                *current = ptr;
                Ok(())
            }
            (_, declared) => Err(MarshalError::ReturnTypeMismatch {
                declared: declared.to_string(),
                attempted: "address".to_string(),
            }),
        }
    }

    /// Transfer an owned handle reference to the return slot
    pub fn set_return_handle(&mut self, handle: Option<HandleRef>) -> Result<(), MarshalError> {
        if !matches!(self.frame.ret, ReturnSlot::Handle(_)) {
            return Err(MarshalError::ReturnTypeMismatch {
                declared: self.frame.signature.return_type().to_string(),
                attempted: "handle".to_string(),
            });
        }
        let ptr = handle.map_or(core::ptr::null_mut(), HandleRef::into_raw);
        self.set_return_address(ptr)
    }

    /// Return an object the callee does not give away
    ///
    /// Handle returns take a new reference (once per distinct handle); value
    /// objects are copied into the preallocated return storage; reference
    /// returns store the address.
    pub fn set_return_object(&mut self, ptr: *mut u8) -> Result<(), MarshalError> {
        let signature = Arc::clone(&self.frame.signature);
        match signature.return_type() {
            ReturnType::Handle { ty, .. } => {
                if matches!(self.frame.ret, ReturnSlot::Handle(current) if current == ptr) {
                    return Ok(());
                }
                unsafe { ty.add_ref(ptr) };
                self.set_return_address(ptr)
            }
            ReturnType::Value(ty) => {
                if ptr.is_null() {
                    return Err(MarshalError::NullAddress {
                        position: "return value".to_string(),
                    });
                }
                let copy = ty
                    .behaviours()
                    .copy_construct
                    .ok_or_else(|| ty.missing("copy constructor"))?;
                if let ReturnSlot::Object { storage, constructed } = &mut self.frame.ret {
                    unsafe {
                        if *constructed {
                            ty.destruct(storage.as_ptr());
                        }
                        copy(storage.as_ptr(), ptr);
                    }
                    *constructed = true;
                }
                Ok(())
            }
            ReturnType::Reference(_) => self.set_return_address(ptr),
            declared => Err(MarshalError::ReturnTypeMismatch {
                declared: declared.to_string(),
                attempted: "object".to_string(),
            }),
        }
    }

    /// Raw address of the return storage
    ///
    /// Value-type storage is uninitialised. A callee that constructs the
    /// return in place must then call
    /// [`mark_return_constructed`](Self::mark_return_constructed). Handle
    /// storage holds null, primitive storage zero. Void returns yield null.
    pub fn address_of_return_location(&mut self) -> *mut u8 {
        match &mut self.frame.ret {
            ReturnSlot::Void => core::ptr::null_mut(),
            ReturnSlot::Primitive(value) => value.as_mut_ptr(),
            ReturnSlot::Object { storage, .. } => storage.as_ptr(),
            ReturnSlot::Handle(ptr) | ReturnSlot::Reference(ptr) => (ptr as *mut *mut u8).cast::<u8>(),
        }
    }

    /// Record that the value-type return was constructed in place
    ///
    /// # Safety
    /// The storage behind [`address_of_return_location`](Self::address_of_return_location)
    /// must hold a constructed instance of the declared return type. Once
    /// marked, the frame or the caller runs its destructor.
    pub unsafe fn mark_return_constructed(&mut self) -> Result<(), MarshalError> {
        match &mut self.frame.ret {
            ReturnSlot::Object { constructed, .. } => {
                *constructed = true;
                Ok(())
            }
            _ => Err(MarshalError::ReturnTypeMismatch {
                declared: self.frame.signature.return_type().to_string(),
                attempted: "object".to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------

    /// Raise a script exception; the first message of a call wins
    pub fn set_exception(&mut self, message: impl Into<String>) -> Result<(), MarshalError> {
        let message = message.into();
        let function = self.frame.signature.qualified_name();
        match self.frame.exception.set(&function, message.clone()) {
            Ok(()) => {
                log_script_exception(&function, &message);
                Ok(())
            }
            Err(err) => {
                log_protocol_warning(&function, &err.to_string());
                Err(err)
            }
        }
    }

    #[inline]
    pub fn has_exception(&self) -> bool {
        self.frame.has_exception()
    }
}

impl fmt::Debug for GenericCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericCall")
            .field("frame", &self.frame)
            .field("auxiliary", &self.auxiliary.is_some())
            .finish()
    }
}

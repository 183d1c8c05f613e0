//! Call frame - per-invocation argument and return storage
//!
//! A frame is built from a resolved signature and already-evaluated
//! arguments right before one native invocation, and dropped right after
//! the caller has taken the outcome. Frames nest with the Rust call stack,
//! so a native function that calls back into script gets its own frame.
//!
//! - `slot.rs` - caller-facing `ArgValue`, stored argument and return slots
//! - `storage.rs` - heap storage for value-type instances and `&out` targets

mod slot;
mod storage;

pub use slot::ArgValue;
pub use storage::{OutRef, OwnedObject};

pub(crate) use slot::{coerce, mismatch, ArgSlot, ReturnSlot};
use storage::RawStorage;

use crate::call::{CallOutcome, ReturnValue};
use crate::config::CoercionPolicy;
use crate::error::MarshalError;
use crate::exception::ExceptionFlag;
use crate::logging::{log_frame_teardown, trace};
use crate::object::HandleRef;
use crate::protocol::{self, EntryAction, ExitAction, Position};
use crate::stats;
use crate::types::{ParamDescriptor, PrimitiveValue, ReturnType, Signature, SlotKind};
use core::fmt;
use core::ptr::NonNull;
use smallvec::SmallVec;
use std::sync::Arc;

/// Marshalled arguments, receiver and return slot of one invocation
pub struct CallFrame {
    pub(crate) signature: Arc<Signature>,
    pub(crate) object: Option<NonNull<u8>>,
    pub(crate) slots: SmallVec<[ArgSlot; 8]>,
    pub(crate) ret: ReturnSlot,
    pub(crate) policy: CoercionPolicy,
    pub(crate) exception: ExceptionFlag,
}

impl CallFrame {
    /// Build a frame for `signature`
    ///
    /// Handle arguments hand their reference to the frame (or, for `@+`
    /// parameters, the frame takes an extra one). Value objects passed by
    /// value are copied into frame-owned storage. On error nothing has
    /// been adopted or copied: the caller still owns everything it passed.
    pub fn construct(
        signature: Arc<Signature>,
        object: Option<*mut u8>,
        args: &[ArgValue],
        policy: CoercionPolicy,
    ) -> Result<Self, MarshalError> {
        let object = object.and_then(NonNull::new);
        match (signature.is_method(), object) {
            (true, None) => {
                return Err(MarshalError::MissingObject {
                    function: signature.qualified_name(),
                })
            }
            (false, Some(_)) => {
                return Err(MarshalError::UnexpectedObject {
                    function: signature.qualified_name(),
                })
            }
            _ => {}
        }

        if args.len() != signature.arity() {
            return Err(MarshalError::ArgumentCountMismatch {
                expected: signature.arity(),
                got: args.len(),
            });
        }

        for (index, (param, arg)) in signature.params().iter().zip(args).enumerate() {
            validate(index, param, arg, policy)?;
        }

        let mut slots = SmallVec::with_capacity(args.len());
        for (index, (param, arg)) in signature.params().iter().zip(args).enumerate() {
            slots.push(fill(index, param, arg, policy)?);
        }

        let ret = match signature.return_type() {
            ReturnType::Void => ReturnSlot::Void,
            ReturnType::Primitive(kind) => ReturnSlot::Primitive(PrimitiveValue::zero(*kind)),
            ReturnType::Value(ty) => ReturnSlot::Object {
                storage: RawStorage::uninit(ty.layout()),
                constructed: false,
            },
            ReturnType::Handle { auto_handle, .. } => {
                debug_assert_eq!(
                    protocol::rule(Position::Return, *auto_handle).entry,
                    EntryAction::InitNull
                );
                ReturnSlot::Handle(core::ptr::null_mut())
            }
            ReturnType::Reference(_) => ReturnSlot::Reference(core::ptr::null_mut()),
        };

        trace!(
            event = "frame_construct",
            function = signature.name(),
            args = slots.len(),
            "Call frame constructed"
        );

        Ok(Self {
            signature,
            object,
            slots,
            ret,
            policy,
            exception: ExceptionFlag::Idle,
        })
    }

    /// Address of the receiver for method-style calls
    pub fn object_pointer(&self) -> Result<*mut u8, MarshalError> {
        match self.object {
            Some(ptr) if self.signature.is_method() => Ok(ptr.as_ptr()),
            _ => Err(MarshalError::NotAMethod {
                function: self.signature.qualified_name(),
            }),
        }
    }

    #[inline]
    pub fn argument_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    #[inline]
    pub fn declared_return_type(&self) -> &ReturnType {
        self.signature.return_type()
    }

    #[inline]
    pub fn has_exception(&self) -> bool {
        self.exception.is_pending()
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), MarshalError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(MarshalError::InvalidArgumentIndex {
                index,
                count: self.slots.len(),
            })
        }
    }

    /// Resolve the return slot and hand the outcome to the caller
    ///
    /// A pending exception wins: the return slot is neither read nor
    /// destroyed. Teardown of the arguments follows when the frame drops.
    pub fn finish(mut self) -> Result<CallOutcome, MarshalError> {
        let ret = core::mem::replace(&mut self.ret, ReturnSlot::Void);

        if let Some(exception) = self.exception.take() {
            // Storage is freed without running a destructor
            drop(ret);
            return Ok(CallOutcome::Exception(exception));
        }

        let value = match (ret, self.signature.return_type()) {
            (ReturnSlot::Primitive(v), _) => ReturnValue::Primitive(v),
            (ReturnSlot::Object { storage, constructed }, ReturnType::Value(ty)) => {
                if !constructed {
                    return Err(MarshalError::ReturnNotConstructed {
                        function: self.signature.qualified_name(),
                    });
                }
                ReturnValue::Object(unsafe { OwnedObject::from_constructed(storage, Arc::clone(ty)) })
            }
            (ReturnSlot::Handle(ptr), ReturnType::Handle { ty, auto_handle }) => {
                let rule = protocol::rule(Position::Return, *auto_handle);
                if rule.on_success == ExitAction::AddRefThenTransfer {
                    unsafe { ty.add_ref(ptr) };
                }
                ReturnValue::Handle(unsafe { HandleRef::from_raw(ptr, Arc::clone(ty)) })
            }
            (ReturnSlot::Reference(ptr), _) => ReturnValue::Reference(ptr),
            _ => ReturnValue::Void,
        };

        Ok(CallOutcome::Returned(value))
    }
}

fn validate(
    index: usize,
    param: &ParamDescriptor,
    arg: &ArgValue,
    policy: CoercionPolicy,
) -> Result<(), MarshalError> {
    match (param.slot_kind(), arg) {
        (SlotKind::Primitive(kind), ArgValue::Primitive(v)) => coerce(*v, kind, policy)
            .map(|_| ())
            .ok_or_else(|| mismatch(index, param, v.kind())),
        (SlotKind::Handle, ArgValue::Handle(_)) => Ok(()),
        (SlotKind::Object, ArgValue::Object(src)) => {
            if src.is_null() {
                return Err(MarshalError::NullAddress {
                    position: format!("argument {}", index),
                });
            }
            let ty = param.type_descriptor();
            match ty.behaviours().copy_construct {
                Some(_) => Ok(()),
                None => Err(ty.missing("copy constructor")),
            }
        }
        (SlotKind::Reference, ArgValue::Reference(ptr)) => {
            if ptr.is_null() {
                Err(MarshalError::NullAddress {
                    position: format!("argument {}", index),
                })
            } else {
                Ok(())
            }
        }
        (_, other) => Err(mismatch(index, param, other.describe())),
    }
}

/// Store a validated argument, applying the entry action for handles
fn fill(
    index: usize,
    param: &ParamDescriptor,
    arg: &ArgValue,
    policy: CoercionPolicy,
) -> Result<ArgSlot, MarshalError> {
    let slot = match (param.slot_kind(), arg) {
        (SlotKind::Primitive(kind), ArgValue::Primitive(v)) => {
            ArgSlot::Primitive(coerce(*v, kind, policy).unwrap_or(*v))
        }
        (SlotKind::Handle, ArgValue::Handle(address)) => {
            let rule = protocol::rule(Position::Argument, param.is_auto_handle());
            if rule.entry == EntryAction::AddRef {
                unsafe { param.type_descriptor().add_ref(*address) };
            }
            ArgSlot::Handle {
                address: *address,
                claimed: false,
            }
        }
        (SlotKind::Object, ArgValue::Object(src)) => {
            ArgSlot::Object(unsafe { OwnedObject::copy_from(param.type_descriptor(), *src)? })
        }
        (_, ArgValue::Reference(ptr)) => ArgSlot::Reference(*ptr),
        (_, other) => return Err(mismatch(index, param, other.describe())),
    };
    Ok(slot)
}

impl Drop for CallFrame {
    fn drop(&mut self) {
        let pending = self.exception.is_pending();
        let mut released = 0;

        for (slot, param) in self.slots.iter_mut().zip(self.signature.params()) {
            if let ArgSlot::Handle { address, claimed } = slot {
                let rule = protocol::rule(Position::Argument, param.is_auto_handle());
                let action = if pending { rule.on_exception } else { rule.on_success };
                if action == ExitAction::ReleaseUnclaimed && !*claimed && !address.is_null() {
                    unsafe { param.type_descriptor().release(*address) };
                    *claimed = true;
                    released += 1;
                }
            }
        }

        // Return slot still here: the frame was never finished
        match (&self.ret, self.signature.return_type()) {
            (ReturnSlot::Object { storage, constructed: true }, ReturnType::Value(ty)) if !pending => unsafe {
                ty.destruct(storage.as_ptr());
            },
            (ReturnSlot::Handle(ptr), ReturnType::Handle { ty, .. }) if !pending => unsafe {
                ty.release(*ptr);
            },
            _ => {}
        }

        stats::record_released(released);
        log_frame_teardown(self.signature.name(), released);
    }
}

impl fmt::Debug for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallFrame")
            .field("function", &self.signature.qualified_name())
            .field("object", &self.object)
            .field("slots", &self.slots)
            .field("return", &self.ret.describe())
            .field("exception", &self.exception.is_pending())
            .finish()
    }
}

//! Generic function invocation
//!
//! Control flow of one call: build a [`CallFrame`] from evaluated
//! arguments, wrap it in a [`GenericCall`], run the native function, turn
//! the return slot (or a pending exception) into a [`CallOutcome`], then
//! tear the frame down.

mod registry;

pub use registry::{FunctionId, FunctionRegistry};

use crate::config::CoercionPolicy;
use crate::error::MarshalError;
use crate::exception::ScriptException;
use crate::frame::{ArgValue, CallFrame, OwnedObject};
use crate::generic::GenericCall;
use crate::logging::{log_generic_call, log_generic_return};
use crate::object::HandleRef;
use crate::stats;
use crate::types::{Primitive, PrimitiveValue, Signature};
use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// Native function under the generic calling convention
///
/// Takes the context and returns nothing; arguments and the return value
/// travel through the context.
pub type GenericFunction = fn(&mut GenericCall<'_>);

/// Value handed to the caller after a successful call
pub enum ReturnValue {
    Void,
    Primitive(PrimitiveValue),
    /// Value object constructed by the callee, owned by the caller
    Object(OwnedObject),
    /// Handle reference now owned by the caller (`None` for null)
    Handle(Option<HandleRef>),
    Reference(*mut u8),
}

impl ReturnValue {
    /// Primitive return as `T`, if that is the declared kind
    pub fn primitive<T: Primitive>(&self) -> Option<T> {
        match self {
            Self::Primitive(v) => T::from_value(*v),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<HandleRef> {
        match self {
            Self::Handle(handle) => handle,
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&OwnedObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "Void"),
            Self::Primitive(v) => write!(f, "Primitive({:?})", v),
            Self::Object(obj) => write!(f, "Object({:?})", obj),
            Self::Handle(handle) => write!(f, "Handle({:?})", handle),
            Self::Reference(ptr) => write!(f, "Reference({:?})", ptr),
        }
    }
}

/// Result of a generic call as seen by the caller
#[derive(Debug)]
pub enum CallOutcome {
    Returned(ReturnValue),
    /// The callee raised an exception; there is no return value
    Exception(ScriptException),
}

impl CallOutcome {
    pub fn into_result(self) -> Result<ReturnValue, ScriptException> {
        match self {
            Self::Returned(value) => Ok(value),
            Self::Exception(exception) => Err(exception),
        }
    }

    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }

    pub fn exception(&self) -> Option<&ScriptException> {
        match self {
            Self::Exception(exception) => Some(exception),
            Self::Returned(_) => None,
        }
    }
}

/// Registered generic function: signature, entry point and call options
pub struct FunctionCall {
    signature: Arc<Signature>,
    func: GenericFunction,
    policy: CoercionPolicy,
    auxiliary: Option<Arc<dyn Any + Send + Sync>>,
}

impl FunctionCall {
    pub fn new(signature: Signature, func: GenericFunction) -> Self {
        Self {
            signature: Arc::new(signature),
            func,
            policy: CoercionPolicy::default(),
            auxiliary: None,
        }
    }

    pub fn with_policy(mut self, policy: CoercionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach an object the function can read through
    /// [`GenericCall::auxiliary`]
    pub fn with_auxiliary<T: Any + Send + Sync>(mut self, auxiliary: T) -> Self {
        self.auxiliary = Some(Arc::new(auxiliary));
        self
    }

    #[inline]
    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    #[inline]
    pub fn policy(&self) -> CoercionPolicy {
        self.policy
    }

    /// Call a global function
    pub fn call(&self, args: &[ArgValue]) -> Result<CallOutcome, MarshalError> {
        self.invoke(None, args)
    }

    /// Call a method on `object`
    pub fn call_method(&self, object: *mut u8, args: &[ArgValue]) -> Result<CallOutcome, MarshalError> {
        self.invoke(Some(object), args)
    }

    fn invoke(&self, object: Option<*mut u8>, args: &[ArgValue]) -> Result<CallOutcome, MarshalError> {
        let name = self.signature.name();

        let mut frame = CallFrame::construct(Arc::clone(&self.signature), object, args, self.policy)
            .map_err(|err| {
                stats::record_error();
                err
            })?;

        log_generic_call(name, frame.argument_count());
        stats::record_call();

        {
            let mut gen = GenericCall::with_auxiliary(&mut frame, self.auxiliary.as_deref());
            (self.func)(&mut gen);
        }

        let outcome = frame.finish();
        match &outcome {
            Ok(CallOutcome::Exception(_)) => stats::record_exception(),
            Ok(CallOutcome::Returned(_)) => log_generic_return(name),
            Err(_) => stats::record_error(),
        }
        outcome
    }
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall")
            .field("signature", &self.signature.to_string())
            .field("policy", &self.policy)
            .field("auxiliary", &self.auxiliary.is_some())
            .finish()
    }
}

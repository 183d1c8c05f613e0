//! gencall - generic calling convention for script-to-native calls
//!
//! Native functions registered with the generic convention share one
//! signature, `fn(&mut GenericCall<'_>)`. The engine marshals evaluated
//! script arguments into a [`CallFrame`], the function reads them and
//! writes its return value through the [`GenericCall`] context, and handle
//! reference counts follow one protocol table ([`protocol`]) whatever the
//! outcome.

pub mod call;
pub mod config;
pub mod error;
pub mod exception;
pub mod frame;
pub mod generic;
pub mod logging;
pub mod object;
pub mod protocol;
pub mod stats;
pub mod types;

// Re-export commonly used items
pub use call::{CallOutcome, FunctionCall, FunctionId, FunctionRegistry, GenericFunction, ReturnValue};
pub use config::{CoercionPolicy, MarshalConfig};
pub use error::{ConfigError, MarshalError};
pub use exception::ScriptException;
pub use frame::{ArgValue, CallFrame, OutRef, OwnedObject};
pub use generic::GenericCall;
pub use object::{alloc_object, HandleRef};
pub use stats::{stats, CallStats};
pub use types::{
    ParamDescriptor, ParamModifier, Primitive, PrimitiveKind, PrimitiveValue, ReturnType, Signature,
    TypeBehaviours, TypeCategory, TypeDescriptor,
};

/// Build options, space separated
///
/// `MAX_PORTABILITY` is reported when only the generic convention is
/// available to the engine.
pub fn library_options() -> &'static str {
    if cfg!(feature = "max-portability") {
        "MAX_PORTABILITY GENERIC_CALLCONV"
    } else {
        "GENERIC_CALLCONV"
    }
}

/// Initialize logging from the environment
pub fn init() {
    logging::init();
}

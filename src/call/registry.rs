//! Function registry - generic functions resolved by id or qualified name
//!
//! Lookups are lock-free through `DashMap`; the name index sits behind a
//! `parking_lot` read-write lock and is only written at registration.

use super::{CallOutcome, FunctionCall, GenericFunction};
use crate::config::MarshalConfig;
use crate::error::MarshalError;
use crate::frame::ArgValue;
use crate::logging::debug;
use crate::types::Signature;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Identifier handed out at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

impl FunctionId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

pub struct FunctionRegistry {
    config: MarshalConfig,
    functions: DashMap<FunctionId, Arc<FunctionCall>>,
    names: RwLock<HashMap<String, FunctionId>>,
    next_id: AtomicU32,
}

impl FunctionRegistry {
    pub fn new(config: MarshalConfig) -> Self {
        Self {
            config,
            functions: DashMap::with_capacity(64),
            names: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Register a global function or method with the configured coercion policy
    pub fn register_function(&self, signature: Signature, func: GenericFunction) -> Result<FunctionId, MarshalError> {
        let call = FunctionCall::new(signature, func).with_policy(self.config.coercion());
        self.register(call)
    }

    /// Register a method; the signature must name its object type
    pub fn register_method(&self, signature: Signature, func: GenericFunction) -> Result<FunctionId, MarshalError> {
        if !signature.is_method() {
            return Err(MarshalError::NotAMethod {
                function: signature.qualified_name(),
            });
        }
        self.register_function(signature, func)
    }

    /// Register a prepared function descriptor as is
    ///
    /// Names are unique per registry: methods are keyed as `Type::name`.
    pub fn register(&self, call: FunctionCall) -> Result<FunctionId, MarshalError> {
        let name = call.signature().qualified_name();
        let mut names = self.names.write();
        if names.contains_key(&name) {
            return Err(MarshalError::DuplicateFunction(name));
        }

        let id = FunctionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            event = "register_function",
            function = %name,
            id = id.0,
            declaration = %call.signature(),
            "Generic function registered"
        );

        names.insert(name, id);
        self.functions.insert(id, Arc::new(call));
        Ok(id)
    }

    pub fn get(&self, id: FunctionId) -> Option<Arc<FunctionCall>> {
        self.functions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn find(&self, qualified_name: &str) -> Option<FunctionId> {
        self.names.read().get(qualified_name).copied()
    }

    pub fn call(&self, id: FunctionId, args: &[ArgValue]) -> Result<CallOutcome, MarshalError> {
        self.resolve(id)?.call(args)
    }

    pub fn call_method(&self, id: FunctionId, object: *mut u8, args: &[ArgValue]) -> Result<CallOutcome, MarshalError> {
        self.resolve(id)?.call_method(object, args)
    }

    /// Call by qualified name; `object` is required for methods
    pub fn call_by_name(
        &self,
        qualified_name: &str,
        object: Option<*mut u8>,
        args: &[ArgValue],
    ) -> Result<CallOutcome, MarshalError> {
        let id = self
            .find(qualified_name)
            .ok_or_else(|| MarshalError::UnknownFunction(qualified_name.to_string()))?;
        let call = self.resolve(id)?;
        match object {
            Some(object) => call.call_method(object, args),
            None => call.call(args),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    // The map guard is dropped before the call so re-entrant calls never
    // contend on a shard lock
    fn resolve(&self, id: FunctionId) -> Result<Arc<FunctionCall>, MarshalError> {
        self.get(id)
            .ok_or_else(|| MarshalError::UnknownFunction(format!("#{}", id.0)))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new(MarshalConfig::default())
    }
}

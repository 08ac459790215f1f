//! Native code registration tables.
//!
//! [`CodeRegistration`] is the reference [`NativeCodeLookup`]. Ahead-of-time compiled
//! code for generic methods is registered per instantiation (method token plus type
//! arguments). Code compiled once for all instantiations of a method (fully shared
//! generic code) is registered per token and used as a fallback when the lookup allows
//! generic sharing.
//!
//! Instance methods of value types may carry two entries: the raw body expecting an
//! unboxed `this`, and an adjustor thunk callable through vtables. A lookup with
//! `prefer_direct` returns the thunk when one is registered.

use dashmap::DashMap;

use crate::{
    metadata::{
        method::{GenericContext, InvokerPointer, MethodDefinition, MethodPointer},
        token::Token,
    },
    runtime::NativeCodeLookup,
};

/// Compiled entry points of one method body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodCode {
    /// The compiled body
    pub method: MethodPointer,
    /// Thunk adjusting a boxed `this` before entering `method`
    pub adjustor_thunk: Option<MethodPointer>,
}

impl MethodCode {
    /// Code without an adjustor thunk
    pub fn new(method: MethodPointer) -> Self {
        MethodCode {
            method,
            adjustor_thunk: None,
        }
    }

    /// Attach an adjustor thunk
    #[must_use]
    pub fn with_adjustor_thunk(mut self, thunk: MethodPointer) -> Self {
        self.adjustor_thunk = Some(thunk);
        self
    }

    fn select(&self, prefer_direct: bool) -> MethodPointer {
        match self.adjustor_thunk {
            Some(thunk) if prefer_direct => thunk,
            _ => self.method,
        }
    }
}

/// Registered native code, indexed by method token and type arguments
#[derive(Default)]
pub struct CodeRegistration {
    instances: DashMap<(Token, GenericContext), MethodCode>,
    shared: DashMap<Token, MethodCode>,
    invokers: DashMap<Token, InvokerPointer>,
}

impl CodeRegistration {
    /// Create empty tables
    pub fn new() -> Self {
        CodeRegistration {
            instances: DashMap::new(),
            shared: DashMap::new(),
            invokers: DashMap::new(),
        }
    }

    /// Register code compiled for one instantiation
    ///
    /// ## Arguments
    /// * `method`  - Token of the method definition
    /// * `context` - The type arguments the code was compiled for
    /// * `code`    - The entry points
    pub fn register_instance(&self, method: Token, context: GenericContext, code: MethodCode) {
        self.instances.insert((method, context), code);
    }

    /// Register code shared by every instantiation of a method
    pub fn register_shared(&self, method: Token, code: MethodCode) {
        self.shared.insert(method, code);
    }

    /// Register the invoker of a method
    pub fn register_invoker(&self, method: Token, invoker: InvokerPointer) {
        self.invokers.insert(method, invoker);
    }

    /// Number of per-instantiation registrations
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if no per-instantiation code is registered
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl NativeCodeLookup for CodeRegistration {
    fn method_pointer(
        &self,
        definition: &MethodDefinition,
        context: &GenericContext,
        prefer_direct: bool,
        allow_generic_sharing: bool,
    ) -> Option<MethodPointer> {
        if let Some(code) = self.instances.get(&(definition.token, context.clone())) {
            return Some(code.select(prefer_direct));
        }

        if !allow_generic_sharing {
            return None;
        }

        self.shared
            .get(&definition.token)
            .map(|code| code.select(prefer_direct))
    }

    fn invoker(
        &self,
        definition: &MethodDefinition,
        _context: &GenericContext,
    ) -> Option<InvokerPointer> {
        self.invokers.get(&definition.token).map(|entry| *entry.value())
    }
}

//! Contracts of the subsystems the instantiation engine calls into.
//!
//! Generic method construction depends on several parts of a runtime that are not part
//! of this crate's core: the generic class engine, signature inflation, runtime generic
//! context layout, the native code registration tables, the interpreter, and name
//! formatting for diagnostics. Each is reached through a narrow trait here and bundled in
//! [`Collaborators`].
//!
//! The default bundle wires in the reference implementations shipped with the crate.
//! Embedders replace individual entries with the `with_*` methods.
//!
//! # Reentrancy
//!
//! Collaborators are invoked while the metadata lock is held, from the constructing
//! thread. They may call back into the cache (e.g. to resolve a generic method referenced
//! by a signature); such a nested request for a key that is still being built receives
//! the pending descriptor.

use std::sync::Arc;

use crate::{
    metadata::{
        image::{ImageContextResolver, MetadataImage, RuntimeContextData},
        method::{
            GenericContext, InvokerPointer, MethodDefinition, MethodPointer, Parameter,
            PendingMethod,
        },
        token::Token,
        typesystem::{
            ContextInflater, FullNameFormatter, GenericClassRegistry, GenericInst, RuntimeType,
            RuntimeTypeRc, TypeSig,
        },
    },
    runtime::CodeRegistration,
    Result,
};

/// Realizes instantiated generic classes
pub trait GenericTypeRealizer: Send + Sync {
    /// Produce the realized instance of an open generic type.
    ///
    /// Repeated calls with the same arguments must return the same instance.
    ///
    /// ## Arguments
    /// * `definition`  - The open generic type definition
    /// * `class_inst`  - The generic arguments
    ///
    /// # Errors
    /// Returns an error if the instantiation is invalid, e.g. violates a constraint
    fn realize_type(&self, definition: &RuntimeTypeRc, class_inst: &GenericInst)
        -> Result<RuntimeTypeRc>;
}

/// Substitutes generic parameters in signatures
pub trait SignatureInflater: Send + Sync {
    /// Inflate a type, returning it unchanged if it references no generic parameter
    fn inflate_type(&self, ty: &TypeSig, context: &GenericContext) -> TypeSig;

    /// Inflate every parameter of a signature
    fn inflate_parameters(&self, params: &[Parameter], context: &GenericContext) -> Vec<Parameter>;
}

/// Produces the runtime generic context data of generic method instances
pub trait ContextDataResolver: Send + Sync {
    /// Inflate the RGCTX layout of the method `token` in `image`
    ///
    /// Returns `None` if the method has no layout.
    fn resolve_context_data(
        &self,
        image: &MetadataImage,
        token: Token,
        context: &GenericContext,
    ) -> Option<RuntimeContextData>;
}

/// Lookup of natively compiled code
pub trait NativeCodeLookup: Send + Sync {
    /// Find native code for an instantiation.
    ///
    /// ## Arguments
    /// * `definition`              - The method definition
    /// * `context`                 - The type arguments
    /// * `prefer_direct`           - Prefer the entry callable from vtables (adjusted for
    ///                               value-type instance methods) over the raw body
    /// * `allow_generic_sharing`   - Accept shared code compiled for reference-type arguments
    fn method_pointer(
        &self,
        definition: &MethodDefinition,
        context: &GenericContext,
        prefer_direct: bool,
        allow_generic_sharing: bool,
    ) -> Option<MethodPointer>;

    /// Find the reflection-style invoker for an instantiation
    fn invoker(&self, definition: &MethodDefinition, context: &GenericContext)
        -> Option<InvokerPointer>;
}

/// The interpreter backend
pub trait InterpreterModule: Send + Sync {
    /// Returns `true` if the method's image is executed by the interpreter
    fn is_interpreter_method(&self, method: &PendingMethod<'_>) -> bool;

    /// Returns `true` if the interpreter provides an implementation for a method whose
    /// image is otherwise compiled
    fn is_implemented_by_interpreter(&self, method: &PendingMethod<'_>) -> bool;

    /// Reflection-style invoker entering the interpreter
    fn method_invoker(&self, method: &PendingMethod<'_>) -> Option<InvokerPointer>;

    /// Raw interpreter entry point, expecting an unboxed `this`
    fn method_pointer(&self, method: &PendingMethod<'_>) -> Option<MethodPointer>;

    /// Adjustor thunk unboxing `this` before entering the interpreter
    fn adjustor_thunk_pointer(&self, method: &PendingMethod<'_>) -> Option<MethodPointer>;
}

/// Names for diagnostics
pub trait NameFormatter: Send + Sync {
    /// Full name of a runtime type
    fn type_name(&self, ty: &RuntimeType) -> String;

    /// Full name of a signature type
    fn type_sig_name(&self, sig: &TypeSig) -> String;

    /// Name of a method
    fn method_name(&self, method: &MethodDefinition) -> String;
}

/// [`InterpreterModule`] for runtimes without an interpreter: nothing is interpreted
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterpreter;

impl InterpreterModule for NoInterpreter {
    fn is_interpreter_method(&self, _method: &PendingMethod<'_>) -> bool {
        false
    }

    fn is_implemented_by_interpreter(&self, _method: &PendingMethod<'_>) -> bool {
        false
    }

    fn method_invoker(&self, _method: &PendingMethod<'_>) -> Option<InvokerPointer> {
        None
    }

    fn method_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        None
    }

    fn adjustor_thunk_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        None
    }
}

/// The set of subsystems a [`crate::runtime::GenericMethodCache`] calls into
#[derive(Clone)]
pub struct Collaborators {
    /// Realizes declaring types of class-level instantiations
    pub realizer: Arc<dyn GenericTypeRealizer>,
    /// Inflates return types and parameters
    pub inflater: Arc<dyn SignatureInflater>,
    /// Builds runtime generic context data for method-level instantiations
    pub context_data: Arc<dyn ContextDataResolver>,
    /// Native code tables
    pub native_code: Arc<dyn NativeCodeLookup>,
    /// Interpreter backend
    pub interpreter: Arc<dyn InterpreterModule>,
    /// Diagnostic names
    pub names: Arc<dyn NameFormatter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators {
            realizer: Arc::new(GenericClassRegistry::new()),
            inflater: Arc::new(ContextInflater::new()),
            context_data: Arc::new(ImageContextResolver::new()),
            native_code: Arc::new(CodeRegistration::new()),
            interpreter: Arc::new(NoInterpreter),
            names: Arc::new(FullNameFormatter),
        }
    }
}

impl Collaborators {
    /// Create the bundle of reference implementations
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the generic class realizer
    #[must_use]
    pub fn with_realizer(mut self, realizer: Arc<dyn GenericTypeRealizer>) -> Self {
        self.realizer = realizer;
        self
    }

    /// Replace the signature inflater
    #[must_use]
    pub fn with_inflater(mut self, inflater: Arc<dyn SignatureInflater>) -> Self {
        self.inflater = inflater;
        self
    }

    /// Replace the runtime generic context resolver
    #[must_use]
    pub fn with_context_data(mut self, context_data: Arc<dyn ContextDataResolver>) -> Self {
        self.context_data = context_data;
        self
    }

    /// Replace the native code lookup
    #[must_use]
    pub fn with_native_code(mut self, native_code: Arc<dyn NativeCodeLookup>) -> Self {
        self.native_code = native_code;
        self
    }

    /// Replace the interpreter backend
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: Arc<dyn InterpreterModule>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Replace the name formatter
    #[must_use]
    pub fn with_names(mut self, names: Arc<dyn NameFormatter>) -> Self {
        self.names = names;
        self
    }
}

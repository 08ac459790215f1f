//! Realized generic method descriptors.
//!
//! An [`InflatedMethod`] is the callable result of instantiating a
//! [`GenericMethod`](crate::metadata::method::GenericMethod) key. It is built in two steps:
//!
//! 1. The constructor allocates the descriptor with its identity fields (token, name,
//!    flags, slot, key back-reference) and registers it as pending. A recursive request
//!    for the same key receives this descriptor while it is still being built.
//! 2. Once the declaring type, signature and dispatch are resolved into a
//!    [`RealizationBuilder`], the builder is frozen into a [`Realization`] and published
//!    exactly once, right before the descriptor is inserted into the cache.
//!
//! After publication a descriptor never changes, and every cached descriptor is
//! published. Readers that obtained a descriptor through the recursion guard must only
//! rely on the identity fields until [`InflatedMethod::state`] reports
//! [`MethodState::Complete`].

use std::sync::{Arc, OnceLock};

use strum::Display;

use crate::{
    metadata::{
        image::RuntimeContextData,
        method::{
            Dispatch, GenericContext, GenericMethodRc, InvokerPointer, MethodDefinitionRc,
            MethodMetadataHandle, MethodModifiers, MethodPointer, Parameter,
        },
        token::Token,
        typesystem::{GenericContainerHandle, RuntimeTypeRc, TypeSig},
    },
    Error, Result,
};

/// Reference to an `InflatedMethod`
pub type InflatedMethodRc = Arc<InflatedMethod>;

/// Construction state of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MethodState {
    /// Allocated and registered, realization still running
    Pending,
    /// Realization published, the descriptor is immutable
    Complete,
}

/// Everything a descriptor learns during construction.
pub struct Realization {
    declaring_type: Option<RuntimeTypeRc>,
    return_type: Option<TypeSig>,
    parameters: Arc<[Parameter]>,
    is_generic: bool,
    generic_container: Option<GenericContainerHandle>,
    metadata_handle: Option<MethodMetadataHandle>,
    rgctx_data: Option<RuntimeContextData>,
    invoker: Option<InvokerPointer>,
    dispatch: Dispatch,
}

impl Realization {
    /// The (possibly instantiated) declaring type
    pub fn declaring_type(&self) -> Option<&RuntimeTypeRc> {
        self.declaring_type.as_ref()
    }

    /// Inflated return type, `None` for `void`
    pub fn return_type(&self) -> Option<&TypeSig> {
        self.return_type.as_ref()
    }

    /// Inflated parameters
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The resolved entry points
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Reflection-style invoker
    pub fn invoker(&self) -> Option<InvokerPointer> {
        self.invoker
    }
}

/// Mutable state filled in while a descriptor is pending.
///
/// Starts out with no declaring type, an empty signature and [`Dispatch::Unresolved`].
pub struct RealizationBuilder {
    pub(crate) declaring_type: Option<RuntimeTypeRc>,
    pub(crate) return_type: Option<TypeSig>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) is_generic: bool,
    pub(crate) generic_container: Option<GenericContainerHandle>,
    pub(crate) metadata_handle: Option<MethodMetadataHandle>,
    pub(crate) rgctx_data: Option<RuntimeContextData>,
    pub(crate) invoker: Option<InvokerPointer>,
    pub(crate) dispatch: Dispatch,
}

impl RealizationBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        RealizationBuilder {
            declaring_type: None,
            return_type: None,
            parameters: Vec::new(),
            is_generic: false,
            generic_container: None,
            metadata_handle: None,
            rgctx_data: None,
            invoker: None,
            dispatch: Dispatch::Unresolved,
        }
    }

    /// Freeze the builder
    pub fn build(self) -> Realization {
        Realization {
            declaring_type: self.declaring_type,
            return_type: self.return_type,
            parameters: self.parameters.into(),
            is_generic: self.is_generic,
            generic_container: self.generic_container,
            metadata_handle: self.metadata_handle,
            rgctx_data: self.rgctx_data,
            invoker: self.invoker,
            dispatch: self.dispatch,
        }
    }
}

impl Default for RealizationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A realized (or, while pending, partially realized) generic method instance
pub struct InflatedMethod {
    generic_method: Option<GenericMethodRc>,
    token: Token,
    name: String,
    flags: u32,
    impl_flags: u32,
    slot: u16,
    realization: OnceLock<Realization>,
}

impl InflatedMethod {
    /// Allocate a pending descriptor for a key, copying the definition's identity fields
    ///
    /// ## Arguments
    /// * `key` - The instantiation this descriptor realizes
    pub fn new(key: GenericMethodRc) -> Self {
        let definition = key.definition();
        InflatedMethod {
            token: definition.token,
            name: definition.name.clone(),
            flags: definition.flags,
            impl_flags: definition.impl_flags,
            slot: definition.slot,
            generic_method: Some(key),
            realization: OnceLock::new(),
        }
    }

    /// Create the placeholder returned for instantiations beyond the nesting limit.
    ///
    /// The placeholder has no key, zeroed identity fields, and an entry point that fails
    /// with [`Error::GenericNestingTooDeep`].
    pub fn nesting_too_deep() -> Self {
        let mut realization = RealizationBuilder::new();
        realization.dispatch = Dispatch::NestingTooDeep;

        InflatedMethod {
            generic_method: None,
            token: Token::default(),
            name: String::new(),
            flags: 0,
            impl_flags: 0,
            slot: 0,
            realization: OnceLock::from(realization.build()),
        }
    }

    /// Publish the realization, completing the descriptor
    ///
    /// ## Arguments
    /// * `builder` - The fully resolved construction state
    ///
    /// # Errors
    /// Returns [`Error::AlreadyRealized`] if the descriptor was already published
    pub fn publish(&self, builder: RealizationBuilder) -> Result<()> {
        self.realization
            .set(builder.build())
            .map_err(|_| Error::AlreadyRealized(self.token))
    }

    /// Current construction state
    pub fn state(&self) -> MethodState {
        match self.realization.get() {
            Some(_) => MethodState::Complete,
            None => MethodState::Pending,
        }
    }

    /// The published realization, `None` while pending
    pub fn realization(&self) -> Option<&Realization> {
        self.realization.get()
    }

    /// The key this descriptor realizes, `None` for the nesting placeholder
    pub fn generic_method(&self) -> Option<&GenericMethodRc> {
        self.generic_method.as_ref()
    }

    /// The instantiated method definition
    pub fn definition(&self) -> Option<&MethodDefinitionRc> {
        self.generic_method.as_ref().map(|key| key.definition())
    }

    /// The type arguments of this instance
    pub fn context(&self) -> Option<&GenericContext> {
        self.generic_method.as_ref().map(|key| key.context())
    }

    /// `MethodDef` token of the definition
    pub fn token(&self) -> Token {
        self.token
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw `MethodAttributes`
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Raw `MethodImplAttributes`
    pub fn impl_flags(&self) -> u32 {
        self.impl_flags
    }

    /// VTable slot
    pub fn slot(&self) -> u16 {
        self.slot
    }

    /// Always `true` except for the nesting placeholder
    pub fn is_inflated(&self) -> bool {
        self.generic_method.is_some()
    }

    /// Returns `true` if the method takes a `this` argument
    pub fn is_instance(&self) -> bool {
        !MethodModifiers::from_method_flags(self.flags).contains(MethodModifiers::STATIC)
    }

    /// `true` if the instance is still an open generic method (no method arguments were
    /// supplied for a generic method definition)
    pub fn is_generic(&self) -> bool {
        self.realization.get().is_some_and(|r| r.is_generic)
    }

    /// The (possibly instantiated) declaring type
    pub fn declaring_type(&self) -> Option<&RuntimeTypeRc> {
        self.realization.get().and_then(Realization::declaring_type)
    }

    /// Inflated return type, `None` for `void` or while pending
    pub fn return_type(&self) -> Option<&TypeSig> {
        self.realization.get().and_then(Realization::return_type)
    }

    /// Inflated parameters, empty while pending
    pub fn parameters(&self) -> &[Parameter] {
        self.realization
            .get()
            .map(Realization::parameters)
            .unwrap_or_default()
    }

    /// Number of parameters
    pub fn parameters_count(&self) -> usize {
        self.parameters().len()
    }

    /// Generic container handle, only for class-level instances of non-instantiated types
    pub fn generic_container(&self) -> Option<GenericContainerHandle> {
        self.realization.get().and_then(|r| r.generic_container)
    }

    /// Metadata record handle, only for instances without method arguments
    pub fn metadata_handle(&self) -> Option<MethodMetadataHandle> {
        self.realization.get().and_then(|r| r.metadata_handle)
    }

    /// Runtime generic context data, only for instances with method arguments
    pub fn rgctx_data(&self) -> Option<&RuntimeContextData> {
        self.realization.get().and_then(|r| r.rgctx_data.as_ref())
    }

    /// Reflection-style invoker
    pub fn invoker(&self) -> Option<InvokerPointer> {
        self.realization.get().and_then(Realization::invoker)
    }

    /// The resolved entry points, `None` while pending
    pub fn dispatch(&self) -> Option<Dispatch> {
        self.realization.get().map(Realization::dispatch)
    }

    /// Primary entry point
    pub fn method_pointer(&self) -> Option<MethodPointer> {
        self.dispatch().and_then(|d| d.method_pointer())
    }

    /// Entry point for direct calls from interpreted code
    pub fn method_pointer_call_by_interp(&self) -> Option<MethodPointer> {
        self.dispatch().and_then(|d| d.method_pointer_call_by_interp())
    }

    /// Entry point for vtable calls from interpreted code
    pub fn virtual_method_pointer_call_by_interp(&self) -> Option<MethodPointer> {
        self.dispatch()
            .and_then(|d| d.virtual_method_pointer_call_by_interp())
    }

    /// Returns `true` if the interpreter implements the method
    pub fn is_interpreter_impl(&self) -> bool {
        self.dispatch().is_some_and(|d| d.is_interpreter_impl())
    }

    /// Returns `true` once the interpreter-callable entry points are set up
    pub fn init_interp_call_method_pointer(&self) -> bool {
        self.dispatch()
            .is_some_and(|d| d.init_interp_call_method_pointer())
    }

    /// The address to jump to when invoking this method
    ///
    /// # Errors
    /// Returns [`Error::GenericNestingTooDeep`] for the nesting placeholder, and
    /// [`Error::MissingMethodPointer`] if the method has no code or is still pending.
    pub fn entry_point(&self) -> Result<MethodPointer> {
        match self.dispatch() {
            Some(Dispatch::NestingTooDeep) => Err(Error::GenericNestingTooDeep),
            Some(dispatch) => dispatch
                .method_pointer()
                .ok_or(Error::MissingMethodPointer(self.token)),
            None => Err(Error::MissingMethodPointer(self.token)),
        }
    }
}

impl std::fmt::Debug for InflatedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflatedMethod")
            .field("key", &self.generic_method)
            .field("state", &self.state())
            .field("dispatch", &self.dispatch())
            .finish()
    }
}

/// The view of a pending descriptor handed to collaborators during dispatch resolution.
///
/// Collaborators see the identity fields of the descriptor plus whatever has been resolved
/// so far. Nothing is published yet, so the descriptor itself still reports
/// [`MethodState::Pending`].
pub struct PendingMethod<'a> {
    method: &'a InflatedMethod,
    builder: &'a RealizationBuilder,
}

impl<'a> PendingMethod<'a> {
    pub(crate) fn new(method: &'a InflatedMethod, builder: &'a RealizationBuilder) -> Self {
        PendingMethod { method, builder }
    }

    /// The descriptor under construction
    pub fn method(&self) -> &'a InflatedMethod {
        self.method
    }

    /// The instantiated method definition
    pub fn definition(&self) -> Option<&'a MethodDefinitionRc> {
        self.method.definition()
    }

    /// The type arguments of the instance
    pub fn context(&self) -> Option<&'a GenericContext> {
        self.method.context()
    }

    /// The resolved declaring type
    pub fn declaring_type(&self) -> Option<&'a RuntimeTypeRc> {
        self.builder.declaring_type.as_ref()
    }

    /// The inflated parameters resolved so far
    pub fn parameters(&self) -> &'a [Parameter] {
        &self.builder.parameters
    }

    /// The inflated return type, `None` for `void`
    pub fn return_type(&self) -> Option<&'a TypeSig> {
        self.builder.return_type.as_ref()
    }

    /// Returns `true` for instance methods of value types, which need adjustor thunks
    /// for vtable calls
    pub fn is_adjustor_thunk_method(&self) -> bool {
        self.method.is_instance() && self.declaring_type().is_some_and(|ty| ty.valuetype)
    }
}

/// A method as it may appear in a vtable slot: either a plain definition or a realized
/// instance of a generic class method
#[derive(Debug, Clone)]
pub enum MethodRef {
    /// A method of a non-generic type, or an open generic definition
    Definition(MethodDefinitionRc),
    /// A realized instance
    Inflated(InflatedMethodRc),
}

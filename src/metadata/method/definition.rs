use std::{fmt, sync::Arc};

use crate::metadata::{
    image::MetadataImage,
    method::{MethodAccessFlags, MethodModifiers},
    token::Token,
    typesystem::{GenericContainerHandle, GenericParameter, RuntimeTypeRc, TypeSig},
};

/// Reference to a `MethodDefinition`
pub type MethodDefinitionRc = Arc<MethodDefinition>;

/// Opaque handle to the metadata record backing a method definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodMetadataHandle(pub u32);

/// A single parameter of a method signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (can be empty)
    pub name: String,
    /// 0-based position in the signature
    pub position: u16,
    /// `Param` token, or a null token for unnamed parameters
    pub token: Token,
    /// Parameter type, possibly referencing generic parameters
    pub ty: TypeSig,
}

impl Parameter {
    /// Create a parameter without a metadata token
    ///
    /// ## Arguments
    /// * `name`        - The parameter name
    /// * `position`    - The position in the signature
    /// * `ty`          - The parameter type
    pub fn new(name: impl Into<String>, position: u16, ty: TypeSig) -> Self {
        Parameter {
            name: name.into(),
            position,
            token: Token::default(),
            ty,
        }
    }
}

/// An unrealized method definition, as described by metadata.
///
/// Definitions are shared through [`MethodDefinitionRc`] and identified by pointer: a
/// [`crate::metadata::method::GenericMethod`] key refers to exactly one definition
/// instance.
pub struct MethodDefinition {
    /// `MethodDef` token
    pub token: Token,
    /// Method name
    pub name: String,
    /// The type that defines the method (an open generic for methods of generic classes)
    pub declaring_type: RuntimeTypeRc,
    /// Raw `MethodAttributes` (§II.23.1.10)
    pub flags: u32,
    /// Raw `MethodImplAttributes` (§II.23.1.11)
    pub impl_flags: u32,
    /// VTable slot, `u16::MAX` for non-virtual methods
    pub slot: u16,
    /// Return type, `None` for `void`
    pub return_type: Option<TypeSig>,
    /// Signature parameters
    pub parameters: Arc<[Parameter]>,
    /// Method-level generic parameters (empty unless this is a generic method definition)
    pub generic_params: Vec<GenericParameter>,
    /// Handle of the generic container owning the method's generic parameters
    pub generic_container: Option<GenericContainerHandle>,
    /// Handle of the metadata record, if the method came from loaded metadata
    pub metadata_handle: Option<MethodMetadataHandle>,
}

impl MethodDefinition {
    /// Create a new, non-generic, public instance method returning `void`
    ///
    /// ## Arguments
    /// * `token`           - The `MethodDef` token
    /// * `name`            - The method name
    /// * `declaring_type`  - The defining type
    pub fn new(token: Token, name: impl Into<String>, declaring_type: RuntimeTypeRc) -> Self {
        MethodDefinition {
            token,
            name: name.into(),
            declaring_type,
            flags: MethodAccessFlags::PUBLIC.bits(),
            impl_flags: 0,
            slot: u16::MAX,
            return_type: None,
            parameters: Arc::from(Vec::new()),
            generic_params: Vec::new(),
            generic_container: None,
            metadata_handle: None,
        }
    }

    /// Set the raw `MethodAttributes`
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Set the raw `MethodImplAttributes`
    #[must_use]
    pub fn with_impl_flags(mut self, impl_flags: u32) -> Self {
        self.impl_flags = impl_flags;
        self
    }

    /// Set the vtable slot
    #[must_use]
    pub fn with_slot(mut self, slot: u16) -> Self {
        self.slot = slot;
        self
    }

    /// Set the return type
    #[must_use]
    pub fn with_return_type(mut self, ty: TypeSig) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Set the signature parameters
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Declare method-level generic parameters, making this a generic method definition
    #[must_use]
    pub fn with_generic_params(mut self, params: Vec<GenericParameter>) -> Self {
        self.generic_params = params;
        self
    }

    /// Attach the handle of the method's generic container
    #[must_use]
    pub fn with_container(mut self, handle: GenericContainerHandle) -> Self {
        self.generic_container = Some(handle);
        self
    }

    /// Attach the metadata record handle
    #[must_use]
    pub fn with_metadata_handle(mut self, handle: MethodMetadataHandle) -> Self {
        self.metadata_handle = Some(handle);
        self
    }

    /// Returns `true` if the method declares its own generic parameters
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Returns `true` if the method takes a `this` argument
    pub fn is_instance(&self) -> bool {
        !self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Access flags of the method
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags)
    }

    /// Modifiers of the method
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }

    /// The image owning the declaring type, if known
    pub fn image(&self) -> Option<&Arc<MetadataImage>> {
        self.declaring_type.image.as_ref()
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("token", &self.token)
            .field("declaring_type", &self.declaring_type.fullname())
            .field("name", &self.name)
            .field("generic_params", &self.generic_params.len())
            .finish()
    }
}

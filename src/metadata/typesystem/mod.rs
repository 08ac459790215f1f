//! Runtime type representation used by generic method instantiation.
//!
//! This module provides the minimal slice of a managed runtime's type system that the
//! instantiation engine needs: class descriptors (open definitions and realized generic
//! instances), type signatures that may reference generic parameters, and generic argument
//! lists with structural identity.
//!
//! # Key Components
//!
//! - [`RuntimeType`]: A class descriptor, either a definition or a realized generic instance
//! - [`TypeSig`]: A type as it appears in a method signature, possibly open (`!0`, `!!0`)
//! - [`GenericInst`]: An immutable, hashable list of generic arguments
//! - [`GenericClassRegistry`]: Memoizing realizer for generic class instantiations
//! - [`ContextInflater`]: Substitutes generic parameters with concrete arguments
//! - [`FullNameFormatter`]: Diagnostic names for types and methods
//!
//! # Type Identity
//!
//! Runtime types are shared through [`RuntimeTypeRc`] and compared by pointer. Two
//! instantiations of the same generic definition with the same arguments are only
//! identical if the generic-type engine returns the same realized type for both, which
//! [`GenericClassRegistry`] guarantees by memoizing every realization.
//!
//! # Examples
//!
//! ```rust
//! use methodinst::metadata::typesystem::{GenericInst, RuntimeType, TypeSig};
//! use methodinst::metadata::token::Token;
//! use std::sync::Arc;
//!
//! let int32 = Arc::new(RuntimeType::new(Token::type_def(1), "System", "Int32", true));
//! let args = GenericInst::new(vec![TypeSig::Type(int32)]);
//!
//! assert_eq!(args.len(), 1);
//! assert_eq!(args.nesting_depth(), 1);
//! ```

mod hash;
mod inflate;
mod name;
mod registry;
mod signature;

use std::{fmt, sync::Arc};

use bitflags::bitflags;

pub use hash::SignatureHash;
pub use inflate::ContextInflater;
pub use name::{format_full_name, format_generic_arguments, FullNameFormatter};
pub use registry::GenericClassRegistry;
pub use signature::{GenericInst, TypeSig};

use crate::metadata::{image::MetadataImage, token::Token};

/// Reference to a `RuntimeType`
pub type RuntimeTypeRc = Arc<RuntimeType>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Flags of a generic parameter (`GenericParamAttributes`, §II.23.1.7)
    pub struct GenericParamAttributes: u16 {
        /// The generic parameter is covariant
        const COVARIANT = 0x0001;
        /// The generic parameter is contravariant
        const CONTRAVARIANT = 0x0002;
        /// The generic argument must be a reference type
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        /// The generic argument must be a non-nullable value type
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        /// The generic argument must have a public default constructor
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
    }
}

/// A single generic parameter of a type or method definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParameter {
    /// Parameter name, e.g. `T`
    pub name: String,
    /// 0-based position in the owning generic container
    pub number: u16,
    /// Variance and special constraints
    pub flags: GenericParamAttributes,
}

impl GenericParameter {
    /// Create an unconstrained generic parameter
    ///
    /// ## Arguments
    /// * `name`    - The parameter name
    /// * `number`  - The position in the owning container
    pub fn new(name: impl Into<String>, number: u16) -> Self {
        GenericParameter {
            name: name.into(),
            number,
            flags: GenericParamAttributes::empty(),
        }
    }

    /// Attach constraint / variance flags to this parameter
    #[must_use]
    pub fn with_flags(mut self, flags: GenericParamAttributes) -> Self {
        self.flags = flags;
        self
    }
}

/// Opaque handle to the generic container (parameter list) of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericContainerHandle(pub u32);

/// Relationship between a realized generic type and the definition it was built from
#[derive(Clone)]
pub struct GenericClass {
    /// The open generic type definition, e.g. `List<T>`
    pub definition: RuntimeTypeRc,
    /// The arguments substituted for the definition's parameters
    pub class_inst: GenericInst,
}

/// A runtime class descriptor.
///
/// Either a type definition (which may be an open generic such as `Pair<,>`) or a
/// realized instantiation of a generic definition (`Pair<Int32, String>`). Realized
/// instances are produced by a [`crate::runtime::GenericTypeRealizer`] and carry a
/// [`GenericClass`] back-reference.
pub struct RuntimeType {
    /// Token of the `TypeDef` (realized instances keep the definition's token)
    pub token: Token,
    /// `TypeNamespace` (can be empty)
    pub namespace: String,
    /// `TypeName`, without generic arity suffix
    pub name: String,
    /// Flags (a 4-byte bitmask of type `TypeAttributes`, §II.23.1.15)
    pub flags: u32,
    /// Instances of this type are value types (structs, enums, primitives)
    pub valuetype: bool,
    /// Generic parameters of an open definition (empty otherwise)
    pub generic_params: Vec<GenericParameter>,
    /// Handle of the definition's generic container
    pub generic_container: Option<GenericContainerHandle>,
    /// Image that owns this type's metadata
    pub image: Option<Arc<MetadataImage>>,
    generic_class: Option<GenericClass>,
    hash: u64,
}

impl RuntimeType {
    /// Create a new, non-generic type definition
    ///
    /// ## Arguments
    /// * `token`       - The `TypeDef` token
    /// * `namespace`   - The type namespace (may be empty)
    /// * `name`        - The type name
    /// * `valuetype`   - Whether instances are value types
    pub fn new(
        token: Token,
        namespace: impl Into<String>,
        name: impl Into<String>,
        valuetype: bool,
    ) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let hash = SignatureHash::new()
            .add_token(&token)
            .add_fullname(&namespace, &name)
            .finalize();

        RuntimeType {
            token,
            namespace,
            name,
            flags: 0,
            valuetype,
            generic_params: Vec::new(),
            generic_container: None,
            image: None,
            generic_class: None,
            hash,
        }
    }

    /// Build the realized instance of `definition` for the given arguments.
    ///
    /// Callers are expected to go through a [`crate::runtime::GenericTypeRealizer`] so that
    /// every `(definition, arguments)` pair yields exactly one shared instance.
    ///
    /// ## Arguments
    /// * `definition`  - The open generic definition
    /// * `class_inst`  - The generic arguments
    pub fn instantiate(definition: &RuntimeTypeRc, class_inst: GenericInst) -> Self {
        let hash = SignatureHash::new()
            .add_hash(definition.hash)
            .add_hash(class_inst.identity_hash())
            .finalize();

        RuntimeType {
            token: definition.token,
            namespace: definition.namespace.clone(),
            name: definition.name.clone(),
            flags: definition.flags,
            valuetype: definition.valuetype,
            generic_params: Vec::new(),
            generic_container: None,
            image: definition.image.clone(),
            generic_class: Some(GenericClass {
                definition: definition.clone(),
                class_inst,
            }),
            hash,
        }
    }

    /// Declare the generic parameters of this definition
    #[must_use]
    pub fn with_generic_params(mut self, params: Vec<GenericParameter>) -> Self {
        self.generic_params = params;
        self
    }

    /// Attach the handle of the definition's generic container
    #[must_use]
    pub fn with_container(mut self, handle: GenericContainerHandle) -> Self {
        self.generic_container = Some(handle);
        self
    }

    /// Attach the owning metadata image
    #[must_use]
    pub fn with_image(mut self, image: Arc<MetadataImage>) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the raw `TypeAttributes`
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the full name (Namespace.Name) of the type, or just the name in the global
    /// namespace
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// The generic definition and arguments, if this is a realized generic instance
    pub fn generic_class(&self) -> Option<&GenericClass> {
        self.generic_class.as_ref()
    }

    /// Returns `true` for realized instances of a generic definition
    pub fn is_generic_instance(&self) -> bool {
        self.generic_class.is_some()
    }

    /// Returns `true` for open generic definitions such as `List<T>`
    pub fn is_generic_definition(&self) -> bool {
        self.generic_class.is_none() && !self.generic_params.is_empty()
    }

    /// Precomputed identity hash, stable for the lifetime of the type
    pub fn identity_hash(&self) -> u64 {
        self.hash
    }

    /// Nesting depth contributed by this type when used as a generic argument
    pub fn nesting_depth(&self) -> usize {
        self.generic_class
            .as_ref()
            .map_or(0, |generic| generic.class_inst.nesting_depth())
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("token", &self.token)
            .field("name", &self.fullname())
            .field("valuetype", &self.valuetype)
            .field(
                "class_inst",
                &self.generic_class.as_ref().map(|g| &g.class_inst),
            )
            .finish()
    }
}

//! # methodinst Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! of the methodinst library. Import it to build metadata and request instantiations
//! without spelling out module paths.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all methodinst operations
pub use crate::Error;

/// The result type used throughout methodinst
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The instantiation cache, its configuration and its collaborators
pub use crate::runtime::{
    CacheConfig, Collaborators, GenericMethodCache, MethodRequest, StatsSnapshot,
};

/// The lock shared with the rest of the metadata subsystem
pub use crate::runtime::MetadataLock;

// ================================================================================================
// Collaborator Contracts
// ================================================================================================

/// Traits implemented by embedders
pub use crate::runtime::{
    ContextDataResolver, GenericTypeRealizer, InterpreterModule, NameFormatter,
    NativeCodeLookup, SignatureInflater,
};

/// Reference implementations
pub use crate::runtime::{CodeRegistration, MethodCode, NoInterpreter};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Type system
pub use crate::metadata::typesystem::{
    ContextInflater, FullNameFormatter, GenericClassRegistry, GenericInst, GenericParameter,
    RuntimeType, RuntimeTypeRc, TypeSig,
};

/// Methods, keys and realized descriptors
pub use crate::metadata::method::{
    Dispatch, DispatchKind, GenericContext, GenericMethod, GenericMethodRc, InflatedMethod,
    InflatedMethodRc, InvokerPointer, MethodDefinition, MethodDefinitionRc, MethodModifiers,
    MethodPointer, MethodRef, MethodState, Parameter, PendingMethod,
};

/// Images and runtime generic context
pub use crate::metadata::image::{MetadataImage, RgctxDefinition, RgctxEntry};

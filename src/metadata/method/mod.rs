//! Method definitions, instantiation keys and realized method descriptors.
//!
//! # Key Components
//!
//! - [`MethodDefinition`]: An unrealized method, possibly of a generic type or itself generic
//! - [`GenericMethod`]: The cache key of an instantiation, a definition plus a [`GenericContext`]
//! - [`InflatedMethod`]: The realized, callable descriptor of an instantiation
//! - [`Dispatch`]: The resolved native or interpreted entry points of a descriptor
//!
//! # Lifecycle
//!
//! ```text
//! MethodDefinition + GenericContext ──► GenericMethod (key)
//!                                            │
//!                                            ▼
//!                          InflatedMethod (Pending) ──► publish ──► InflatedMethod (Complete)
//! ```

mod definition;
mod dispatch;
mod generic;
mod inflated;
mod types;

pub use definition::{MethodDefinition, MethodDefinitionRc, MethodMetadataHandle, Parameter};
pub use dispatch::{Dispatch, DispatchKind, InvokerPointer, MethodPointer};
pub use generic::{GenericContext, GenericMethod, GenericMethodRc};
pub use inflated::{
    InflatedMethod, InflatedMethodRc, MethodRef, MethodState, PendingMethod, Realization,
    RealizationBuilder,
};
pub use types::*;

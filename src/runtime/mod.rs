//! Generic method instantiation runtime.
//!
//! This module hosts the [`GenericMethodCache`] together with everything it needs to
//! construct instances: the shared [`MetadataLock`], the concurrent
//! [`InstantiationMap`], the [`DispatchResolver`] choosing between native and interpreted
//! code, and the collaborator contracts through which the rest of a runtime is reached.
//!
//! # Key Components
//!
//! - [`GenericMethodCache`]: Lookup and recursion-safe construction of instances
//! - [`Collaborators`]: The bundle of subsystems used during construction
//! - [`CacheConfig`]: Nesting limit and key validation
//! - [`CodeRegistration`]: Reference table of natively compiled code
//! - [`InstantiationStats`]: Diagnostic counters

mod cache;
mod collaborators;
mod config;
mod generic_method;
mod lock;
mod registration;
mod resolver;
mod stats;

pub use cache::InstantiationMap;
pub use collaborators::{
    Collaborators, ContextDataResolver, GenericTypeRealizer, InterpreterModule,
    NameFormatter, NativeCodeLookup, NoInterpreter, SignatureInflater,
};
pub use config::CacheConfig;
pub use generic_method::{GenericMethodCache, MethodRequest};
pub use lock::{MetadataGuard, MetadataLock};
pub use registration::{CodeRegistration, MethodCode};
pub use resolver::{DispatchResolver, ResolvedDispatch};
pub use stats::{InstantiationStats, StatsSnapshot};

// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # methodinst
//!
//! A thread-safe cache and construction engine for generic method instantiations in a
//! managed-language runtime. Given a method definition and concrete type arguments,
//! `methodinst` produces a fully realized, callable method descriptor exactly once and
//! hands the same descriptor to every later caller.
//!
//! ## Features
//!
//! - **Lock-free hits** - Completed instantiations are served from a sharded concurrent map
//! - **Recursion safe** - Construction that recursively requests the method under construction
//!   receives the pending descriptor instead of deadlocking or looping
//! - **Native or interpreted** - Dispatch resolution picks natively compiled code when
//!   available and falls back to an interpreter, wiring adjustor thunks for value types
//! - **Bounded nesting** - Instantiations nested beyond a configurable depth yield a
//!   placeholder that fails when invoked
//! - **Pluggable** - The generic class engine, signature inflation, code tables,
//!   interpreter and name formatting are reached through traits
//!
//! ## Quick Start
//!
//! ```rust
//! use methodinst::prelude::*;
//! use std::sync::Arc;
//!
//! let pair = Arc::new(
//!     RuntimeType::new(Token::type_def(1), "", "Pair", false).with_generic_params(vec![
//!         GenericParameter::new("TFirst", 0),
//!         GenericParameter::new("TSecond", 1),
//!     ]),
//! );
//! let int32 = Arc::new(RuntimeType::new(Token::type_def(2), "", "Int32", true));
//! let string = Arc::new(RuntimeType::new(Token::type_def(3), "", "String", false));
//! let compare = Arc::new(MethodDefinition::new(Token::method_def(1), "Compare", pair));
//!
//! let cache = GenericMethodCache::new(Collaborators::new());
//! let key = Arc::new(GenericMethod::new(
//!     compare,
//!     GenericContext::new(
//!         Some(GenericInst::new(vec![TypeSig::Type(int32), TypeSig::Type(string)])),
//!         None,
//!     ),
//! ));
//!
//! let method = cache.get_method(&key, true)?;
//! assert!(method.declaring_type().unwrap().is_generic_instance());
//! assert_eq!(cache.format_full_name(&key), "Pair<Int32, String>::Compare");
//! # Ok::<(), methodinst::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Types, signatures, method definitions and realized descriptors
//! - [`runtime`] - The instantiation cache, dispatch resolution and collaborator contracts
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Construction returns [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use methodinst::{prelude::*, Error};
//!
//! fn resolve(cache: &GenericMethodCache, key: &GenericMethodRc) {
//!     match cache.get_method(key, true) {
//!         Ok(method) => println!("realized {}", method.name()),
//!         Err(Error::UnresolvableInstantiation { method, .. }) => {
//!             println!("cannot realize the declaring type of {}", method)
//!         }
//!         Err(e) => println!("other error: {}", e),
//!     }
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events and spans; install a
//! subscriber in the embedding application to see them.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use methodinst::prelude::*;
///
/// let cache = GenericMethodCache::new(Collaborators::new());
/// assert!(cache.is_empty());
/// ```
pub mod prelude;

/// Runtime metadata model: tokens, types, signatures and methods
pub mod metadata;

/// Generic method instantiation cache and its collaborators
pub mod runtime;

/// `methodinst` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `methodinst` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the
/// individual variants.
pub use error::Error;

pub use runtime::{CacheConfig, Collaborators, GenericMethodCache};

//! Metadata model consumed by the instantiation engine.
//!
//! This module contains the runtime-facing representation of types, methods and images.
//! Metadata is constructed programmatically (or by an embedding loader); nothing here
//! parses binary assemblies.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references
//! - [`typesystem`] - Runtime types, signatures and generic argument lists
//! - [`method`] - Method definitions, instantiation keys and realized descriptors
//! - [`image`] - Per-image runtime generic context layouts

/// Per-image metadata and runtime generic context layouts
pub mod image;
/// Method definitions, generic method keys and realized descriptors
pub mod method;
/// Commonly used metadata token type
pub mod token;
/// Runtime type representation
pub mod typesystem;

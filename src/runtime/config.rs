//! Configuration of the generic method cache
//!
//! This module provides the limits and checks applied while generic method
//! instantiations are requested and constructed.

/// Configuration for a [`crate::runtime::GenericMethodCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum generic nesting depth of a key's type arguments (default: 7)
    /// Requests for deeper keys receive a placeholder descriptor instead of being constructed
    pub max_generic_nesting: usize,

    /// Reject keys whose method-level argument count does not match the definition
    /// before any construction work is done
    pub validate_keys: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_generic_nesting: 7,
            validate_keys: true,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration suitable for production use
    ///
    /// Keeps the runtime's nesting limit but trusts keys produced by the compiler and
    /// metadata loader, skipping the per-construction argument count check.
    #[must_use]
    pub fn production() -> Self {
        Self {
            max_generic_nesting: 7, // Runtime default generic recursion limit
            validate_keys: false,   // Keys come from verified metadata
        }
    }

    /// Creates a configuration without a nesting limit
    ///
    /// **Warning**: Recursive generic code such as `F<T>() => F<List<T>>()` instantiates
    /// without bound under this configuration.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_generic_nesting: usize::MAX,
            validate_keys: true,
        }
    }

    /// Sets the maximum generic nesting depth
    #[must_use]
    pub fn with_max_generic_nesting(mut self, depth: usize) -> Self {
        self.max_generic_nesting = depth;
        self
    }

    /// Enables or disables key validation
    #[must_use]
    pub fn with_key_validation(mut self, enabled: bool) -> Self {
        self.validate_keys = enabled;
        self
    }

    /// Returns `true` if a key with the given nesting depth exceeds the limit
    #[must_use]
    pub fn exceeds_nesting_limit(&self, depth: usize) -> bool {
        depth > self.max_generic_nesting
    }
}

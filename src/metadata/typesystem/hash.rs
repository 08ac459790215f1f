//! Precomputed identity hashes.
//!
//! Every [`crate::metadata::typesystem::RuntimeType`],
//! [`crate::metadata::typesystem::GenericInst`] and
//! [`crate::metadata::method::GenericMethod`] computes its hash once, when it is built.
//! Cache probes then hash a key by reading a single `u64`.
//!
//! Components are folded in sequentially, so argument order is part of the identity:
//! `Pair<Int32, String>` and `Pair<String, Int32>` hash differently.

use crate::metadata::token::Token;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Order-sensitive hash builder
pub struct SignatureHash {
    state: u64,
}

impl SignatureHash {
    /// Start an empty hash
    #[must_use]
    pub fn new() -> Self {
        // FNV-1a 64-bit offset basis
        SignatureHash {
            state: 0xcbf2_9ce4_8422_2325_u64,
        }
    }

    // FNV-1a step followed by a murmur-style finalizer round, so equal values mixed
    // twice do not cancel
    fn mix(&mut self, value: u64) {
        self.state ^= value;
        self.state = self.state.wrapping_mul(0x0100_0000_01b3_u64);

        self.state ^= self.state >> 33;
        self.state = self.state.wrapping_mul(0xff51_afd7_ed55_8ccd_u64);
        self.state ^= self.state >> 33;
    }

    /// Fold in any hashable value, e.g. a discriminant or a generic parameter number
    #[must_use]
    pub fn add_component<T: Hash + ?Sized>(mut self, component: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.mix(hasher.finish());
        self
    }

    /// Fold in the identity hash of a nested type or argument list
    #[must_use]
    pub fn add_hash(mut self, hash: u64) -> Self {
        self.mix(hash);
        self
    }

    /// Fold in a type's namespace and name
    ///
    /// ## Arguments
    /// * `namespace`   - The namespace, empty for the global namespace
    /// * `name`        - The type name
    #[must_use]
    pub fn add_fullname(self, namespace: &str, name: &str) -> Self {
        self.add_component(namespace).add_component(name)
    }

    /// Fold in a definition token
    #[must_use]
    pub fn add_token(mut self, token: &Token) -> Self {
        self.mix(u64::from(token.value()));
        self
    }

    /// The finished hash
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.state
    }
}

impl Default for SignatureHash {
    fn default() -> Self {
        Self::new()
    }
}

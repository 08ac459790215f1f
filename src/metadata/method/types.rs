//! Method attribute flags.
//!
//! A method definition keeps its attributes as a raw 32-bit value, and an instantiation
//! copies it unchanged. Instantiation only needs two views of that value: the access
//! level, and the modifiers that decide whether the method takes a `this` argument.

use bitflags::bitflags;

/// Bitmask for `ACCESS` state extraction
pub const METHOD_ACCESS_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Access level of a method
    pub struct MethodAccessFlags: u32 {
        /// Not referenceable outside of compiler-generated code
        const COMPILER_CONTROLLED = 0x0000;
        /// Declaring type only
        const PRIVATE = 0x0001;
        /// Derived types within the same image
        const FAM_AND_ASSEM = 0x0002;
        /// Anyone within the same image
        const ASSEM = 0x0003;
        /// Declaring and derived types
        const FAMILY = 0x0004;
        /// Derived types anywhere, plus anyone in the same image
        const FAM_OR_ASSEM = 0x0005;
        /// Everyone
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract the access level from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & METHOD_ACCESS_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Modifiers of a method
    pub struct MethodModifiers: u32 {
        /// No `this` argument
        const STATIC = 0x0010;
        /// Cannot be overridden
        const FINAL = 0x0020;
        /// Occupies a vtable slot
        const VIRTUAL = 0x0040;
        /// No body, must be overridden
        const ABSTRACT = 0x0400;
    }
}

impl MethodModifiers {
    /// Extract the modifiers from raw method attributes, ignoring every other bit
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

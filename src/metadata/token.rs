//! Metadata tokens naming type and method definitions.

use std::fmt;

/// Table identifier of the `TypeDef` metadata table
pub const TABLE_TYPE_DEF: u8 = 0x02;
/// Table identifier of the `MethodDef` metadata table
pub const TABLE_METHOD_DEF: u8 = 0x06;

const ROW_MASK: u32 = 0x00FF_FFFF;

/// Reference to a row of a metadata table.
///
/// The high byte selects the table and the low 24 bits the 1-based row. Only `TypeDef`
/// and `MethodDef` rows are named here. An inflated method reports the token of its
/// definition, so two instantiations of one method share a token and a token never
/// identifies an instantiation on its own. The nesting placeholder uses the null token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Wrap a raw token value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// `MethodDef` token of `row`; rows beyond 24 bits are truncated
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Self::from_parts(TABLE_METHOD_DEF, row)
    }

    /// `TypeDef` token of `row`; rows beyond 24 bits are truncated
    #[must_use]
    pub fn type_def(row: u32) -> Self {
        Self::from_parts(TABLE_TYPE_DEF, row)
    }

    fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & ROW_MASK))
    }

    /// The raw value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Table identifier
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Row within the table
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & ROW_MASK
    }

    /// `true` for the null token, carried by the nesting placeholder
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// `true` if the token names a method definition
    #[must_use]
    pub fn is_method_def(&self) -> bool {
        self.table() == TABLE_METHOD_DEF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

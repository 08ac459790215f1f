//! Type signatures and generic argument lists.
//!
//! [`TypeSig`] is the shape of a type inside a method signature or a generic argument
//! list. Unlike a [`crate::metadata::typesystem::RuntimeType`], a signature can be *open*: it may refer to the
//! declaring class's generic parameters ([`TypeSig::Var`]) or the method's own generic
//! parameters ([`TypeSig::MVar`]). Inflation replaces these placeholders with concrete
//! arguments from a [`crate::metadata::method::GenericContext`].
//!
//! # Identity
//!
//! Equality is structural, except for the leaves: [`TypeSig::Type`] and the definition
//! of a [`TypeSig::GenericInst`] compare by pointer identity of the shared
//! [`RuntimeTypeRc`]. Signatures compute their hash on demand, while [`GenericInst`]
//! caches its identity hash so that instantiation keys hash in O(1).

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::metadata::typesystem::{RuntimeTypeRc, SignatureHash};

/// A type as it appears in a signature.
#[derive(Clone)]
pub enum TypeSig {
    /// A concrete runtime type (definition or realized generic instance)
    Type(RuntimeTypeRc),
    /// Generic parameter of the declaring class, by position (`!n`)
    Var(u16),
    /// Generic parameter of the method, by position (`!!n`)
    MVar(u16),
    /// An instantiation of a generic definition that has not been realized into a class
    GenericInst(RuntimeTypeRc, GenericInst),
    /// A single-dimensional, zero-based array
    SzArray(Box<TypeSig>),
    /// A managed reference (`T&`)
    ByRef(Box<TypeSig>),
    /// An unmanaged pointer (`T*`)
    Ptr(Box<TypeSig>),
}

impl TypeSig {
    /// Returns `true` if this signature references any class or method generic parameter
    pub fn is_open(&self) -> bool {
        match self {
            TypeSig::Type(_) => false,
            TypeSig::Var(_) | TypeSig::MVar(_) => true,
            TypeSig::GenericInst(_, args) => args.is_open(),
            TypeSig::SzArray(inner) | TypeSig::ByRef(inner) | TypeSig::Ptr(inner) => {
                inner.is_open()
            }
        }
    }

    /// Returns the concrete runtime type, if this signature is a plain type reference
    pub fn as_type(&self) -> Option<&RuntimeTypeRc> {
        match self {
            TypeSig::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Number of nested generic instantiation levels in this signature.
    ///
    /// `Int32` is 0, `List<Int32>` is 1, `List<List<Int32>>` is 2. Arrays, references and
    /// pointers are transparent.
    pub fn nesting_depth(&self) -> usize {
        match self {
            TypeSig::Type(ty) => ty.nesting_depth(),
            TypeSig::Var(_) | TypeSig::MVar(_) => 0,
            TypeSig::GenericInst(_, args) => args.nesting_depth(),
            TypeSig::SzArray(inner) | TypeSig::ByRef(inner) | TypeSig::Ptr(inner) => {
                inner.nesting_depth()
            }
        }
    }

    /// Deterministic hash consistent with the equality of this signature
    pub fn identity_hash(&self) -> u64 {
        match self {
            TypeSig::Type(ty) => SignatureHash::new()
                .add_component(&0u8)
                .add_hash(ty.identity_hash())
                .finalize(),
            TypeSig::Var(number) => SignatureHash::new()
                .add_component(&1u8)
                .add_component(number)
                .finalize(),
            TypeSig::MVar(number) => SignatureHash::new()
                .add_component(&2u8)
                .add_component(number)
                .finalize(),
            TypeSig::GenericInst(definition, args) => SignatureHash::new()
                .add_component(&3u8)
                .add_hash(definition.identity_hash())
                .add_hash(args.identity_hash())
                .finalize(),
            TypeSig::SzArray(inner) => SignatureHash::new()
                .add_component(&4u8)
                .add_hash(inner.identity_hash())
                .finalize(),
            TypeSig::ByRef(inner) => SignatureHash::new()
                .add_component(&5u8)
                .add_hash(inner.identity_hash())
                .finalize(),
            TypeSig::Ptr(inner) => SignatureHash::new()
                .add_component(&6u8)
                .add_hash(inner.identity_hash())
                .finalize(),
        }
    }
}

impl PartialEq for TypeSig {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeSig::Type(a), TypeSig::Type(b)) => Arc::ptr_eq(a, b),
            (TypeSig::Var(a), TypeSig::Var(b)) | (TypeSig::MVar(a), TypeSig::MVar(b)) => a == b,
            (TypeSig::GenericInst(def_a, args_a), TypeSig::GenericInst(def_b, args_b)) => {
                Arc::ptr_eq(def_a, def_b) && args_a == args_b
            }
            (TypeSig::SzArray(a), TypeSig::SzArray(b))
            | (TypeSig::ByRef(a), TypeSig::ByRef(b))
            | (TypeSig::Ptr(a), TypeSig::Ptr(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeSig {}

impl Hash for TypeSig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.identity_hash());
    }
}

impl fmt::Debug for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Type(ty) => write!(f, "{}", ty.fullname()),
            TypeSig::Var(number) => write!(f, "!{}", number),
            TypeSig::MVar(number) => write!(f, "!!{}", number),
            TypeSig::GenericInst(definition, args) => {
                write!(f, "{}{:?}", definition.fullname(), args)
            }
            TypeSig::SzArray(inner) => write!(f, "{:?}[]", inner),
            TypeSig::ByRef(inner) => write!(f, "{:?}&", inner),
            TypeSig::Ptr(inner) => write!(f, "{:?}*", inner),
        }
    }
}

/// An immutable list of generic arguments with a cached identity hash.
///
/// Cloning is cheap, the argument storage is shared.
#[derive(Clone)]
pub struct GenericInst {
    args: Arc<[TypeSig]>,
    hash: u64,
}

impl GenericInst {
    /// Create a new argument list
    ///
    /// ## Arguments
    /// * `args` - The generic arguments, in parameter order
    pub fn new(args: Vec<TypeSig>) -> Self {
        let hash = args
            .iter()
            .fold(SignatureHash::new().add_component(&args.len()), |hash, arg| {
                hash.add_hash(arg.identity_hash())
            })
            .finalize();

        GenericInst {
            args: args.into(),
            hash,
        }
    }

    /// The arguments in parameter order
    pub fn args(&self) -> &[TypeSig] {
        &self.args
    }

    /// Argument at the given parameter position
    pub fn get(&self, index: usize) -> Option<&TypeSig> {
        self.args.get(index)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Returns `true` if any argument references a generic parameter
    pub fn is_open(&self) -> bool {
        self.args.iter().any(TypeSig::is_open)
    }

    /// Nesting depth of the list: one level for the list itself plus the deepest argument
    pub fn nesting_depth(&self) -> usize {
        1 + self
            .args
            .iter()
            .map(TypeSig::nesting_depth)
            .max()
            .unwrap_or(0)
    }

    /// Precomputed identity hash
    pub fn identity_hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for GenericInst {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.args == other.args
    }
}

impl Eq for GenericInst {}

impl Hash for GenericInst {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for GenericInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        write!(f, ">")
    }
}

impl FromIterator<TypeSig> for GenericInst {
    fn from_iter<I: IntoIterator<Item = TypeSig>>(iter: I) -> Self {
        GenericInst::new(iter.into_iter().collect())
    }
}

//! Generic method instantiation keys.
//!
//! A [`GenericMethod`] names one instantiation of a method definition: the definition plus
//! the class-level and method-level type arguments it is instantiated with. It is the key
//! of the instantiation cache, so equality and hashing follow the identity rules of the
//! runtime: the definition is compared by pointer, the argument lists structurally.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::metadata::{
    method::MethodDefinitionRc,
    typesystem::{GenericInst, SignatureHash},
};

/// Reference to a `GenericMethod`
pub type GenericMethodRc = Arc<GenericMethod>;

/// The type arguments of an instantiation.
///
/// `class_inst` substitutes the declaring type's parameters (`!n`), `method_inst` the
/// method's own parameters (`!!n`). Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GenericContext {
    /// Arguments of the declaring generic class
    pub class_inst: Option<GenericInst>,
    /// Arguments of the generic method
    pub method_inst: Option<GenericInst>,
}

impl GenericContext {
    /// Create a new context
    ///
    /// ## Arguments
    /// * `class_inst`  - Class-level arguments, if any
    /// * `method_inst` - Method-level arguments, if any
    pub fn new(class_inst: Option<GenericInst>, method_inst: Option<GenericInst>) -> Self {
        GenericContext {
            class_inst,
            method_inst,
        }
    }

    /// Returns `true` if neither argument list is present
    pub fn is_empty(&self) -> bool {
        self.class_inst.is_none() && self.method_inst.is_none()
    }

    /// Deepest generic nesting of either argument list, 0 for an empty context
    pub fn nesting_depth(&self) -> usize {
        let class = self.class_inst.as_ref().map_or(0, GenericInst::nesting_depth);
        let method = self.method_inst.as_ref().map_or(0, GenericInst::nesting_depth);
        class.max(method)
    }

    fn identity_hash(&self) -> u64 {
        let mut hash = SignatureHash::new();
        for inst in [&self.class_inst, &self.method_inst] {
            hash = match inst {
                Some(inst) => hash.add_component(&1u8).add_hash(inst.identity_hash()),
                None => hash.add_component(&0u8),
            };
        }
        hash.finalize()
    }
}

/// Identity of one generic method instantiation.
///
/// # Examples
///
/// ```rust
/// use methodinst::metadata::{
///     method::{GenericContext, GenericMethod, MethodDefinition},
///     token::Token,
///     typesystem::{GenericInst, RuntimeType, TypeSig},
/// };
/// use std::sync::Arc;
///
/// let owner = Arc::new(RuntimeType::new(Token::type_def(1), "", "Helpers", false));
/// let int32 = Arc::new(RuntimeType::new(Token::type_def(2), "System", "Int32", true));
/// let map = Arc::new(MethodDefinition::new(Token::method_def(1), "Map", owner));
///
/// let context = GenericContext::new(None, Some(GenericInst::new(vec![TypeSig::Type(int32)])));
/// let first = GenericMethod::new(map.clone(), context.clone());
/// let second = GenericMethod::new(map, context);
///
/// assert_eq!(first, second);
/// ```
#[derive(Clone)]
pub struct GenericMethod {
    definition: MethodDefinitionRc,
    context: GenericContext,
    hash: u64,
}

impl GenericMethod {
    /// Create a new instantiation key
    ///
    /// ## Arguments
    /// * `definition`  - The method definition being instantiated
    /// * `context`     - The type arguments
    pub fn new(definition: MethodDefinitionRc, context: GenericContext) -> Self {
        let hash = SignatureHash::new()
            .add_token(&definition.token)
            .add_hash(definition.declaring_type.identity_hash())
            .add_hash(context.identity_hash())
            .finalize();

        GenericMethod {
            definition,
            context,
            hash,
        }
    }

    /// The method definition being instantiated
    pub fn definition(&self) -> &MethodDefinitionRc {
        &self.definition
    }

    /// The type arguments of this instantiation
    pub fn context(&self) -> &GenericContext {
        &self.context
    }

    /// Deepest generic nesting of the key's type arguments
    pub fn nesting_depth(&self) -> usize {
        self.context.nesting_depth()
    }

    /// Precomputed identity hash
    pub fn identity_hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for GenericMethod {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && Arc::ptr_eq(&self.definition, &other.definition)
            && self.context == other.context
    }
}

impl Eq for GenericMethod {}

impl Hash for GenericMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for GenericMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}",
            self.definition.declaring_type.fullname(),
            self.definition.name
        )?;
        if let Some(class_inst) = &self.context.class_inst {
            write!(f, " class{:?}", class_inst)?;
        }
        if let Some(method_inst) = &self.context.method_inst {
            write!(f, " method{:?}", method_inst)?;
        }
        Ok(())
    }
}

//! Memoizing realizer for generic class instantiations.
//!
//! This module provides the [`GenericClassRegistry`], the reference
//! [`GenericTypeRealizer`]. The instantiation engine asks it for the declaring type of
//! every generic method whose context carries class arguments, e.g. `Pair<Int32, String>`
//! for `Pair<,>::Compare`.
//!
//! # Guarantees
//!
//! - **One instance per instantiation**: repeated realizations of the same
//!   `(definition, arguments)` pair return the same [`RuntimeTypeRc`]
//! - **Validation before realization**: argument counts and the special constraints
//!   (`class`, `struct`) are checked before an instance is created, a rejected
//!   instantiation leaves no trace in the registry
//!
//! # Thread Safety
//!
//! Instances are stored in a `DashMap`; realization uses the entry API so two threads
//! racing on the same instantiation converge on a single instance.

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    metadata::typesystem::{
        GenericInst, GenericParamAttributes, GenericParameter, RuntimeType, RuntimeTypeRc,
        TypeSig,
    },
    runtime::GenericTypeRealizer,
    Result,
};

/// Key of a realized instance: the definition (by identity) plus its arguments
struct InstanceKey {
    definition: RuntimeTypeRc,
    class_inst: GenericInst,
}

impl PartialEq for InstanceKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.definition, &other.definition) && self.class_inst == other.class_inst
    }
}

impl Eq for InstanceKey {}

impl Hash for InstanceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.definition.identity_hash());
        state.write_u64(self.class_inst.identity_hash());
    }
}

/// Registry of realized generic class instances.
///
/// # Examples
///
/// ```rust
/// use methodinst::metadata::{
///     token::Token,
///     typesystem::{GenericClassRegistry, GenericInst, GenericParameter, RuntimeType, TypeSig},
/// };
/// use methodinst::runtime::GenericTypeRealizer;
/// use std::sync::Arc;
///
/// let list = Arc::new(
///     RuntimeType::new(Token::type_def(2), "System.Collections.Generic", "List", false)
///         .with_generic_params(vec![GenericParameter::new("T", 0)]),
/// );
/// let int32 = Arc::new(RuntimeType::new(Token::type_def(1), "System", "Int32", true));
///
/// let registry = GenericClassRegistry::new();
/// let args = GenericInst::new(vec![TypeSig::Type(int32)]);
/// let first = registry.realize_type(&list, &args)?;
/// let second = registry.realize_type(&list, &args)?;
///
/// assert!(Arc::ptr_eq(&first, &second));
/// # Ok::<(), methodinst::Error>(())
/// ```
#[derive(Default)]
pub struct GenericClassRegistry {
    instances: DashMap<InstanceKey, RuntimeTypeRc>,
}

impl GenericClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        GenericClassRegistry {
            instances: DashMap::new(),
        }
    }

    /// Look up an already realized instance without creating it
    ///
    /// ## Arguments
    /// * `definition`  - The open generic definition
    /// * `class_inst`  - The generic arguments
    pub fn get(&self, definition: &RuntimeTypeRc, class_inst: &GenericInst) -> Option<RuntimeTypeRc> {
        let key = InstanceKey {
            definition: definition.clone(),
            class_inst: class_inst.clone(),
        };
        self.instances.get(&key).map(|entry| entry.value().clone())
    }

    /// Number of realized instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing has been realized yet
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drop all realized instances
    pub fn clear(&self) {
        self.instances.clear();
    }

    fn check_arguments(definition: &RuntimeType, class_inst: &GenericInst) -> Result<()> {
        if !definition.is_generic_definition() {
            return Err(instantiation_error!(
                "{} is not a generic type definition",
                definition.fullname()
            ));
        }

        if definition.generic_params.len() != class_inst.len() {
            return Err(instantiation_error!(
                "{} expects {} generic arguments, got {}",
                definition.fullname(),
                definition.generic_params.len(),
                class_inst.len()
            ));
        }

        for (param, arg) in definition.generic_params.iter().zip(class_inst.args()) {
            Self::check_constraints(definition, param, arg)?;
        }

        Ok(())
    }

    fn check_constraints(owner: &RuntimeType, param: &GenericParameter, arg: &TypeSig) -> Result<()> {
        let valuetype = match arg {
            TypeSig::Type(ty) | TypeSig::GenericInst(ty, _) => Some(ty.valuetype),
            TypeSig::SzArray(_) => Some(false),
            TypeSig::ByRef(_) | TypeSig::Ptr(_) => {
                return Err(instantiation_error!(
                    "{:?} is not a valid generic argument for {}.{}",
                    arg,
                    owner.fullname(),
                    param.name
                ));
            }
            // Open arguments are checked when the shared instantiation is closed
            TypeSig::Var(_) | TypeSig::MVar(_) => None,
        };

        match valuetype {
            Some(false)
                if param
                    .flags
                    .contains(GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT) =>
            {
                Err(instantiation_error!(
                    "{:?} violates the struct constraint of {}.{}",
                    arg,
                    owner.fullname(),
                    param.name
                ))
            }
            Some(true)
                if param
                    .flags
                    .contains(GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT) =>
            {
                Err(instantiation_error!(
                    "{:?} violates the class constraint of {}.{}",
                    arg,
                    owner.fullname(),
                    param.name
                ))
            }
            _ => Ok(()),
        }
    }
}

impl GenericTypeRealizer for GenericClassRegistry {
    fn realize_type(
        &self,
        definition: &RuntimeTypeRc,
        class_inst: &GenericInst,
    ) -> Result<RuntimeTypeRc> {
        Self::check_arguments(definition, class_inst)?;

        let key = InstanceKey {
            definition: definition.clone(),
            class_inst: class_inst.clone(),
        };

        let instance = self
            .instances
            .entry(key)
            .or_insert_with(|| {
                tracing::trace!(
                    definition = %definition.fullname(),
                    args = ?class_inst,
                    "realized generic class"
                );
                Arc::new(RuntimeType::instantiate(definition, class_inst.clone()))
            })
            .value()
            .clone();

        Ok(instance)
    }
}

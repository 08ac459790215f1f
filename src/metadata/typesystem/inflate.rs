//! Generic parameter substitution for signatures.
//!
//! [`ContextInflater`] is the reference [`SignatureInflater`]: it walks a [`TypeSig`] and
//! replaces every `!n` with the n-th class argument and every `!!n` with the n-th method
//! argument of a [`GenericContext`]. Signatures that contain no generic parameters are
//! returned unchanged (the "inflate if needed" fast path).
//!
//! Parameters without a matching argument are left open. This is what happens when a
//! shared (open) instantiation is inflated with a partial context, and it keeps the
//! inflater total: inflation never fails.

use crate::{
    metadata::{
        method::{GenericContext, Parameter},
        typesystem::{GenericInst, TypeSig},
    },
    runtime::SignatureInflater,
};

/// Substitutes class and method generic parameters with context arguments
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextInflater;

impl ContextInflater {
    /// Create a new inflater
    pub fn new() -> Self {
        ContextInflater
    }

    /// Inflate every argument of a generic argument list
    ///
    /// ## Arguments
    /// * `inst`    - The argument list to inflate
    /// * `context` - The generic context providing the substitutions
    pub fn inflate_inst(&self, inst: &GenericInst, context: &GenericContext) -> GenericInst {
        if !inst.is_open() {
            return inst.clone();
        }

        inst.args()
            .iter()
            .map(|arg| self.inflate(arg, context))
            .collect()
    }

    fn inflate(&self, ty: &TypeSig, context: &GenericContext) -> TypeSig {
        match ty {
            TypeSig::Type(_) => ty.clone(),
            TypeSig::Var(number) => context
                .class_inst
                .as_ref()
                .and_then(|inst| inst.get(usize::from(*number)))
                .cloned()
                .unwrap_or_else(|| ty.clone()),
            TypeSig::MVar(number) => context
                .method_inst
                .as_ref()
                .and_then(|inst| inst.get(usize::from(*number)))
                .cloned()
                .unwrap_or_else(|| ty.clone()),
            TypeSig::GenericInst(definition, args) => {
                TypeSig::GenericInst(definition.clone(), self.inflate_inst(args, context))
            }
            TypeSig::SzArray(inner) => TypeSig::SzArray(Box::new(self.inflate(inner, context))),
            TypeSig::ByRef(inner) => TypeSig::ByRef(Box::new(self.inflate(inner, context))),
            TypeSig::Ptr(inner) => TypeSig::Ptr(Box::new(self.inflate(inner, context))),
        }
    }
}

impl SignatureInflater for ContextInflater {
    fn inflate_type(&self, ty: &TypeSig, context: &GenericContext) -> TypeSig {
        if !ty.is_open() {
            return ty.clone();
        }

        self.inflate(ty, context)
    }

    fn inflate_parameters(&self, params: &[Parameter], context: &GenericContext) -> Vec<Parameter> {
        params
            .iter()
            .map(|param| Parameter {
                name: param.name.clone(),
                position: param.position,
                token: param.token,
                ty: self.inflate_type(&param.ty, context),
            })
            .collect()
    }
}

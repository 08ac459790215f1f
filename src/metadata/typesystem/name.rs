//! Diagnostic names for types and generic method instantiations.
//!
//! Names are only used for logging and error messages. The format follows the managed
//! runtime's "full name" convention: `Namespace.Name`, generic arguments in angle
//! brackets separated by `", "`, and `Declaring::Method` for methods.

use crate::{
    metadata::{
        method::{GenericMethod, MethodDefinition},
        typesystem::{GenericInst, RuntimeType, TypeSig},
    },
    runtime::NameFormatter,
};

/// Reference [`NameFormatter`] producing full names
#[derive(Debug, Default, Clone, Copy)]
pub struct FullNameFormatter;

impl NameFormatter for FullNameFormatter {
    fn type_name(&self, ty: &RuntimeType) -> String {
        match ty.generic_class() {
            Some(generic) => format!(
                "{}{}",
                ty.fullname(),
                format_generic_arguments(self, Some(&generic.class_inst))
            ),
            None => ty.fullname(),
        }
    }

    fn type_sig_name(&self, sig: &TypeSig) -> String {
        match sig {
            TypeSig::Type(ty) => self.type_name(ty),
            TypeSig::Var(number) => format!("!{}", number),
            TypeSig::MVar(number) => format!("!!{}", number),
            TypeSig::GenericInst(definition, args) => format!(
                "{}{}",
                definition.fullname(),
                format_generic_arguments(self, Some(args))
            ),
            TypeSig::SzArray(inner) => format!("{}[]", self.type_sig_name(inner)),
            TypeSig::ByRef(inner) => format!("{}&", self.type_sig_name(inner)),
            TypeSig::Ptr(inner) => format!("{}*", self.type_sig_name(inner)),
        }
    }

    fn method_name(&self, method: &MethodDefinition) -> String {
        method.name.clone()
    }
}

/// Format a generic argument list as `<A, B>`.
///
/// `None` produces an empty string. A present list always gets brackets, so
/// `Some` of an empty list yields `<>`.
///
/// ## Arguments
/// * `names`   - Formatter used for each argument
/// * `inst`    - The argument list
pub fn format_generic_arguments<N: NameFormatter + ?Sized>(
    names: &N,
    inst: Option<&GenericInst>,
) -> String {
    let Some(inst) = inst else {
        return String::new();
    };

    let args = inst
        .args()
        .iter()
        .map(|arg| names.type_sig_name(arg))
        .collect::<Vec<_>>();

    format!("<{}>", args.join(", "))
}

/// Format `DeclaringType<ClassArgs>::Method<MethodArgs>` for a generic method key.
///
/// The declaring type is the method definition's (open) type, the class arguments come
/// from the key's context.
///
/// ## Arguments
/// * `names`   - Formatter for type and method names
/// * `key`     - The instantiation to describe
pub fn format_full_name<N: NameFormatter + ?Sized>(names: &N, key: &GenericMethod) -> String {
    let definition = key.definition();
    let context = key.context();

    let mut output = names.type_name(&definition.declaring_type);
    output.push_str(&format_generic_arguments(names, context.class_inst.as_ref()));
    output.push_str("::");
    output.push_str(&names.method_name(definition));
    output.push_str(&format_generic_arguments(names, context.method_inst.as_ref()));
    output
}

use std::sync::Arc;

use crate::{
    metadata::{
        method::{
            GenericContext, GenericMethod, GenericMethodRc, InvokerPointer, MethodDefinition,
            MethodDefinitionRc, MethodPointer, PendingMethod,
        },
        token::Token,
        typesystem::{GenericInst, GenericParameter, RuntimeType, RuntimeTypeRc, TypeSig},
    },
    runtime::InterpreterModule,
};

// Helper function to create a code address
pub fn ptr(address: usize) -> MethodPointer {
    MethodPointer::new(address).unwrap()
}

// Helper function to create a non-generic type in the `System` namespace
pub fn create_type(row: u32, name: &str, valuetype: bool) -> RuntimeTypeRc {
    Arc::new(RuntimeType::new(
        Token::type_def(row),
        "System",
        name,
        valuetype,
    ))
}

// Helper function to create an open generic reference type in the global namespace
pub fn create_generic_type(row: u32, name: &str, params: &[&str]) -> RuntimeTypeRc {
    let params = params
        .iter()
        .zip(0u16..)
        .map(|(name, number)| GenericParameter::new(*name, number))
        .collect();

    Arc::new(RuntimeType::new(Token::type_def(row), "", name, false).with_generic_params(params))
}

// Helper function to create a public instance method
pub fn create_method(row: u32, name: &str, declaring_type: RuntimeTypeRc) -> MethodDefinitionRc {
    Arc::new(MethodDefinition::new(
        Token::method_def(row),
        name,
        declaring_type,
    ))
}

// Helper function to create a context with method-level arguments only
pub fn create_method_context(args: Vec<RuntimeTypeRc>) -> GenericContext {
    GenericContext::new(
        None,
        Some(GenericInst::new(args.into_iter().map(TypeSig::Type).collect())),
    )
}

// Helper function to create `Helpers::<name><Int32>`, a fresh definition on every call
pub fn create_generic_method(name: &str) -> GenericMethodRc {
    let definition = Arc::new(
        MethodDefinition::new(Token::method_def(1), name, create_type(100, "Helpers", false))
            .with_generic_params(vec![GenericParameter::new("T", 0)])
            .with_parameters(vec![crate::metadata::method::Parameter::new(
                "value",
                0,
                TypeSig::MVar(0),
            )]),
    );

    Arc::new(GenericMethod::new(
        definition,
        create_method_context(vec![create_type(1, "Int32", true)]),
    ))
}

/// Interpreter claiming every method, with fixed entry points
#[derive(Debug, Clone, Copy)]
pub struct StubInterpreter {
    pub interpreted: bool,
    pub entry: MethodPointer,
    pub thunk: MethodPointer,
    pub invoker: InvokerPointer,
}

impl StubInterpreter {
    pub fn interpreting() -> Self {
        StubInterpreter {
            interpreted: true,
            entry: ptr(0xE000),
            thunk: ptr(0xE100),
            invoker: InvokerPointer::new(0xE200).unwrap(),
        }
    }
}

impl InterpreterModule for StubInterpreter {
    fn is_interpreter_method(&self, _method: &PendingMethod<'_>) -> bool {
        self.interpreted
    }

    fn is_implemented_by_interpreter(&self, _method: &PendingMethod<'_>) -> bool {
        false
    }

    fn method_invoker(&self, _method: &PendingMethod<'_>) -> Option<InvokerPointer> {
        Some(self.invoker)
    }

    fn method_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        Some(self.entry)
    }

    fn adjustor_thunk_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        Some(self.thunk)
    }
}

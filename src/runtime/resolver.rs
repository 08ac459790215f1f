//! Dispatch resolution for newly realized methods.
//!
//! The resolver decides which code a realized generic method runs: natively compiled code
//! if the code registration has any, otherwise the interpreter if it claims the method,
//! otherwise nothing. Instance methods of value types get special treatment in both
//! branches because vtable calls pass a boxed `this`:
//!
//! | Code        | Value-type instance method                       | Any other method          |
//! |-------------|--------------------------------------------------|---------------------------|
//! | Native      | interp-callable entry is the unadjusted body     | one entry for all paths   |
//! | Interpreter | primary entry is the adjustor thunk              | one entry for all paths   |

use crate::{
    metadata::method::{
        Dispatch, GenericContext, InvokerPointer, MethodDefinition, PendingMethod,
    },
    runtime::Collaborators,
};

/// The outcome of dispatch resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDispatch {
    /// Reflection-style invoker
    pub invoker: Option<InvokerPointer>,
    /// The entry points
    pub dispatch: Dispatch,
}

/// Picks native or interpreted entry points for a pending method
pub struct DispatchResolver<'a> {
    collaborators: &'a Collaborators,
}

impl<'a> DispatchResolver<'a> {
    /// Create a resolver over the given collaborators
    pub fn new(collaborators: &'a Collaborators) -> Self {
        DispatchResolver { collaborators }
    }

    /// Resolve the entry points of a method whose declaring type and signature are known
    ///
    /// ## Arguments
    /// * `definition`  - The method definition being instantiated
    /// * `context`     - The type arguments
    /// * `pending`     - The method under construction
    pub fn resolve(
        &self,
        definition: &MethodDefinition,
        context: &GenericContext,
        pending: &PendingMethod<'_>,
    ) -> ResolvedDispatch {
        let native = &self.collaborators.native_code;
        let adjustor = pending.is_adjustor_thunk_method();

        let invoker = native.invoker(definition, context);
        match native.method_pointer(definition, context, true, true) {
            Some(method) => {
                let call_by_interp = if adjustor {
                    native.method_pointer(definition, context, false, true)
                } else {
                    Some(method)
                };

                ResolvedDispatch {
                    invoker,
                    dispatch: Dispatch::NativeDirect {
                        method,
                        call_by_interp,
                    },
                }
            }
            None => self.resolve_interpreted(pending, adjustor).unwrap_or(ResolvedDispatch {
                invoker,
                dispatch: Dispatch::Unresolved,
            }),
        }
    }

    fn resolve_interpreted(
        &self,
        pending: &PendingMethod<'_>,
        adjustor: bool,
    ) -> Option<ResolvedDispatch> {
        let interpreter = &self.collaborators.interpreter;
        if !interpreter.is_interpreter_method(pending)
            && !interpreter.is_implemented_by_interpreter(pending)
        {
            return None;
        }

        let invoker = interpreter.method_invoker(pending);
        let entry = interpreter.method_pointer(pending);
        if entry.is_none() {
            tracing::warn!(
                token = %pending.method().token(),
                "interpreter claimed method without providing an entry point"
            );
        }

        let dispatch = if adjustor {
            let thunk = interpreter.adjustor_thunk_pointer(pending);
            if thunk.is_none() {
                tracing::warn!(
                    token = %pending.method().token(),
                    "no adjustor thunk for interpreted value-type instance method"
                );
            }
            Dispatch::InterpretedViaThunk { entry, thunk }
        } else {
            Dispatch::InterpretedDirect { entry }
        };

        Some(ResolvedDispatch { invoker, dispatch })
    }
}

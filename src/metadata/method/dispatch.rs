//! Entry points of a realized method.
//!
//! A realized method exposes up to three code addresses:
//!
//! - the primary pointer, used by native callers and vtables
//! - the interpreter-callable pointer, used when interpreted code calls the method
//! - the virtual interpreter-callable pointer, used when interpreted code calls the method
//!   through a vtable slot
//!
//! They differ for instance methods of value types, whose native code expects an unboxed
//! `this` while vtable dispatch passes a boxed one. An adjustor thunk bridges the two.
//! [`Dispatch`] records which of the possible shapes a method resolved to, and derives the
//! three addresses from that shape.

use std::{fmt, num::NonZeroUsize};

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// Address of callable code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodPointer(NonZeroUsize);

impl MethodPointer {
    /// Wrap a code address, `None` for a null address
    pub fn new(address: usize) -> Option<Self> {
        NonZeroUsize::new(address).map(MethodPointer)
    }

    /// The raw code address
    pub fn address(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for MethodPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodPointer(0x{:x})", self.0.get())
    }
}

/// Address of a reflection-style invoker stub
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvokerPointer(NonZeroUsize);

impl InvokerPointer {
    /// Wrap an invoker address, `None` for a null address
    pub fn new(address: usize) -> Option<Self> {
        NonZeroUsize::new(address).map(InvokerPointer)
    }

    /// The raw invoker address
    pub fn address(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for InvokerPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvokerPointer(0x{:x})", self.0.get())
    }
}

/// The shape a method's dispatch resolved to, without the addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum DispatchKind {
    /// Natively compiled code
    NativeDirect,
    /// Interpreter entry used for all call paths
    InterpretedDirect,
    /// Interpreter entry reached through an adjustor thunk for vtable calls
    InterpretedViaThunk,
    /// No code available
    Unresolved,
    /// Placeholder for a too deeply nested instantiation
    NestingTooDeep,
}

/// Resolved entry points of a realized method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The method has native code.
    ///
    /// `call_by_interp` equals `method` except for value-type instance methods, where it
    /// is the non-adjusted native variant (absent if there is none).
    NativeDirect {
        /// Primary native entry point
        method: MethodPointer,
        /// Entry point used by interpreted callers
        call_by_interp: Option<MethodPointer>,
    },
    /// The method is implemented by the interpreter, no thunk required.
    ///
    /// The interpreter may claim a method without handing out an entry point; the method
    /// still counts as interpreter-implemented but has no callable address.
    InterpretedDirect {
        /// Interpreter entry point
        entry: Option<MethodPointer>,
    },
    /// The method is a value-type instance method implemented by the interpreter.
    ///
    /// Without a thunk, vtable callers have no entry while direct interpreted calls still
    /// reach `entry`.
    InterpretedViaThunk {
        /// Raw interpreter entry point, expects an unboxed `this`
        entry: Option<MethodPointer>,
        /// Adjustor thunk unboxing `this` before jumping to `entry`
        thunk: Option<MethodPointer>,
    },
    /// Neither native code nor an interpreter implementation exists
    Unresolved,
    /// The method stands in for an instantiation beyond the nesting limit
    NestingTooDeep,
}

impl Dispatch {
    /// The shape of this dispatch
    pub fn kind(&self) -> DispatchKind {
        match self {
            Dispatch::NativeDirect { .. } => DispatchKind::NativeDirect,
            Dispatch::InterpretedDirect { .. } => DispatchKind::InterpretedDirect,
            Dispatch::InterpretedViaThunk { .. } => DispatchKind::InterpretedViaThunk,
            Dispatch::Unresolved => DispatchKind::Unresolved,
            Dispatch::NestingTooDeep => DispatchKind::NestingTooDeep,
        }
    }

    /// Primary entry point, used by native callers and vtables
    pub fn method_pointer(&self) -> Option<MethodPointer> {
        match *self {
            Dispatch::NativeDirect { method, .. } => Some(method),
            Dispatch::InterpretedDirect { entry } => entry,
            Dispatch::InterpretedViaThunk { thunk, .. } => thunk,
            Dispatch::Unresolved | Dispatch::NestingTooDeep => None,
        }
    }

    /// Entry point used by interpreted code for direct calls
    pub fn method_pointer_call_by_interp(&self) -> Option<MethodPointer> {
        match *self {
            Dispatch::NativeDirect { call_by_interp, .. } => call_by_interp,
            Dispatch::InterpretedDirect { entry } | Dispatch::InterpretedViaThunk { entry, .. } => {
                entry
            }
            Dispatch::Unresolved | Dispatch::NestingTooDeep => None,
        }
    }

    /// Entry point used by interpreted code for calls through a vtable slot
    pub fn virtual_method_pointer_call_by_interp(&self) -> Option<MethodPointer> {
        self.method_pointer()
    }

    /// Returns `true` if the interpreter implements the method
    pub fn is_interpreter_impl(&self) -> bool {
        matches!(
            self,
            Dispatch::InterpretedDirect { .. } | Dispatch::InterpretedViaThunk { .. }
        )
    }

    /// Returns `true` once the interpreter-callable entry points have been set up
    pub fn init_interp_call_method_pointer(&self) -> bool {
        !matches!(self, Dispatch::Unresolved | Dispatch::NestingTooDeep)
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind: &'static str = self.kind().into();
        f.write_str(kind)
    }
}

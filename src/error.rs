use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! instantiation_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidInstantiation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidInstantiation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Construction of a generic method instantiation has very few failure modes. The declaring
/// type of an instantiation may not be realizable, a key may be structurally invalid for the
/// definition it refers to, and a descriptor may carry no callable entry point at all. Memory
/// exhaustion is not represented here, the global allocator aborts the process instead.
///
/// # Error Categories
///
/// ## Construction Errors
/// - [`Error::UnresolvableInstantiation`] - The declaring type could not be realized
/// - [`Error::InvalidInstantiation`] - A key or generic argument list is malformed
/// - [`Error::NotGenericInstance`] - A method that carries no generic context was used as one
///
/// ## Invocation Errors
/// - [`Error::GenericNestingTooDeep`] - A depth-limited placeholder descriptor was invoked
/// - [`Error::MissingMethodPointer`] - A descriptor without native or interpreted code was invoked
///
/// # Examples
///
/// ```rust,no_run
/// use methodinst::{Error, prelude::*};
///
/// fn call(method: &InflatedMethod) {
///     match method.entry_point() {
///         Ok(pointer) => println!("jumping to 0x{:x}", pointer.address()),
///         Err(Error::GenericNestingTooDeep) => eprintln!("generic recursion too deep"),
///         Err(e) => eprintln!("cannot call {}: {}", method.name(), e),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The declaring type of a generic method instantiation could not be realized.
    ///
    /// Raised by the constructor when the generic-type engine refuses to produce the
    /// instantiated declaring type, e.g. because a generic constraint is violated. No cache
    /// entry is created, and a later request for the same key retries the realization.
    #[error("Unable to realize the declaring type of {method} - {source}")]
    UnresolvableInstantiation {
        /// Full diagnostic name of the requested instantiation
        method: String,
        /// The failure reported by the generic-type engine
        #[source]
        source: Box<Error>,
    },

    /// A generic instantiation is structurally invalid.
    ///
    /// This error includes the source location where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was invalid
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Invalid instantiation - {file}:{line}: {message}")]
    InvalidInstantiation {
        /// The message to be printed for the InvalidInstantiation error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A method without generic context was used where an instantiation was required.
    ///
    /// The associated [`Token`] identifies the offending method.
    #[error("Method {0} is not a generic method instance")]
    NotGenericInstance(Token),

    /// A method whose generic arguments were nested too deeply was invoked.
    ///
    /// Requests that exceed the configured nesting depth are answered with a placeholder
    /// descriptor instead of an error, so call sites keep receiving a method. Invoking the
    /// placeholder raises this error.
    #[error("A generic method which is too deeply nested was invoked")]
    GenericNestingTooDeep,

    /// The descriptor has neither native code nor an interpreter implementation.
    ///
    /// The associated [`Token`] identifies the method definition.
    #[error("No method pointer is available for method {0}")]
    MissingMethodPointer(Token),

    /// A realization was published twice for the same descriptor.
    ///
    /// Descriptors are mutable exactly once. Hitting this error means the constructor's
    /// single-writer invariant was broken.
    #[error("Method {0} has already been realized")]
    AlreadyRealized(Token),
}

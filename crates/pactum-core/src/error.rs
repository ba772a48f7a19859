//! The contract engine's error taxonomy.
//!
//! Uses `thiserror` for structured, matchable variants. Declaration errors
//! (`MalformedContract`) surface when a contract or shape is built; binding
//! errors and violations surface at call time. Errors a predicate or body
//! raises itself are passed through untouched.

use thiserror::Error;

use crate::value::ValueKind;
use crate::violation::ContractViolation;

/// Errors produced by declaring, binding, or enforcing contracts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    /// A contract, shape, or type derivation was declared incorrectly.
    #[error("malformed contract: {reason}")]
    MalformedContract { reason: String },

    /// A required parameter had no value after defaults, positional and
    /// keyword arguments were applied.
    #[error("{callable}() missing required argument: '{parameter}'")]
    MissingArgument { callable: String, parameter: String },

    /// A parameter was supplied both by position and by keyword.
    #[error("{callable}() got multiple values for argument '{parameter}'")]
    DuplicateArgument { callable: String, parameter: String },

    /// A keyword matched no parameter and the callable has no keyword tail.
    #[error("{callable}() got an unexpected keyword argument '{parameter}'")]
    UnexpectedArgument { callable: String, parameter: String },

    /// More positional arguments than parameters, with no positional tail.
    #[error("{callable}() takes {expected} positional arguments but {got} were given")]
    TooManyPositional {
        callable: String,
        expected: usize,
        got: usize,
    },

    /// A record was asked for an entry it does not hold.
    #[error("{callable}() has no argument named '{name}'")]
    UnknownArgument { callable: String, name: String },

    /// A record entry does not have the kind the reader expected.
    #[error("argument '{name}' of {callable}() is {got}, expected {expected}")]
    ArgumentType {
        callable: String,
        name: String,
        expected: ValueKind,
        got: ValueKind,
    },

    /// A precondition, postcondition, or invariant evaluated to false.
    #[error(transparent)]
    Violation(#[from] ContractViolation),

    /// Method lookup failed on a type and all of its bases.
    #[error("type '{type_name}' has no method '{method}'")]
    MethodNotFound { type_name: String, method: String },

    /// A method guarded by invariants was not given an instance receiver.
    #[error("{method}() must be called on an instance")]
    InvalidReceiver { method: String },

    /// An error raised by a callable body or a predicate.
    #[error("{message}")]
    Raised { message: String },
}

impl ContractError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ContractError::MalformedContract {
            reason: reason.into(),
        }
    }

    /// Error for bodies and predicates to raise on their own account.
    pub fn raised(message: impl Into<String>) -> Self {
        ContractError::Raised {
            message: message.into(),
        }
    }

    /// The violation, if this error is one.
    pub fn violation(&self) -> Option<&ContractViolation> {
        match self {
            ContractError::Violation(violation) => Some(violation),
            _ => None,
        }
    }
}

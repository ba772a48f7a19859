//! Contract kinds and violation diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ArgumentRecord;
use crate::value::Value;

/// The kind of a contract condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    /// Checked before the body runs; failure prevents the call.
    Precondition,
    /// Checked after the body returns; failure does not undo its effects.
    Postcondition,
    /// Checked on an instance around every qualifying method call.
    Invariant,
}

impl ContractKind {
    /// Number of arguments a predicate of this kind takes.
    pub fn arity(self) -> usize {
        match self {
            ContractKind::Precondition | ContractKind::Invariant => 1,
            ContractKind::Postcondition => 2,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::Precondition => "precondition",
            ContractKind::Postcondition => "postcondition",
            ContractKind::Invariant => "invariant",
        };
        f.write_str(name)
    }
}

/// A failed contract check.
///
/// Displays as the condition's description, verbatim. The remaining fields
/// are diagnostics: which callable, the record the predicate saw, and for
/// postconditions the value the body returned.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{description}")]
pub struct ContractViolation {
    pub kind: ContractKind,
    /// Callable (or `Type.method`) whose contract failed.
    pub callable: String,
    pub description: String,
    /// For invariants this is the instance's fields, not the call arguments.
    pub arguments: ArgumentRecord,
    pub actual_return: Option<Value>,
}

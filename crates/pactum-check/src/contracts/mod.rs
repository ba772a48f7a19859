//! Contract conditions: described predicates tagged with their kind.
//!
//! A [`Condition`] is validated when it is declared, never when it is first
//! evaluated. Predicates are pure functions of the bound
//! [`ArgumentRecord`] (and, for postconditions, the returned value); errors a
//! predicate raises propagate unchanged instead of counting as a violation.

pub mod chain;
pub mod transform;
pub mod types;

use std::fmt;
use std::sync::Arc;

use pactum_core::{ArgumentRecord, ContractError, ContractKind, ContractViolation, Value};

/// Predicate over the bound arguments (preconditions and invariants).
pub type UnaryPredicate =
    Arc<dyn Fn(&ArgumentRecord) -> Result<bool, ContractError> + Send + Sync>;

/// Predicate over the bound arguments and the returned value.
pub type BinaryPredicate =
    Arc<dyn Fn(&ArgumentRecord, &Value) -> Result<bool, ContractError> + Send + Sync>;

/// A predicate, carrying its arity in its variant.
#[derive(Clone)]
pub enum Predicate {
    Unary(UnaryPredicate),
    Binary(BinaryPredicate),
}

impl Predicate {
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&ArgumentRecord) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Predicate::Unary(Arc::new(f))
    }

    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(&ArgumentRecord, &Value) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Predicate::Binary(Arc::new(f))
    }

    pub fn arity(&self) -> usize {
        match self {
            Predicate::Unary(_) => 1,
            Predicate::Binary(_) => 2,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate(arity={})", self.arity())
    }
}

/// An immutable, described contract condition.
#[derive(Debug, Clone)]
pub struct Condition {
    description: Arc<str>,
    kind: ContractKind,
    predicate: Predicate,
}

impl Condition {
    /// Declares a condition, checking the description and that the
    /// predicate's arity fits `kind`.
    pub fn new(
        description: impl Into<String>,
        kind: ContractKind,
        predicate: Predicate,
    ) -> Result<Self, ContractError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ContractError::malformed(
                "contracts must have nonempty descriptions",
            ));
        }
        if predicate.arity() != kind.arity() {
            return Err(ContractError::malformed(format!(
                "{} predicates must take {} argument(s), '{}' takes {}",
                kind,
                kind.arity(),
                description,
                predicate.arity()
            )));
        }
        Ok(Condition {
            description: description.into(),
            kind,
            predicate,
        })
    }

    pub fn precondition<F>(description: impl Into<String>, predicate: F) -> Result<Self, ContractError>
    where
        F: Fn(&ArgumentRecord) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Condition::new(description, ContractKind::Precondition, Predicate::unary(predicate))
    }

    pub fn postcondition<F>(description: impl Into<String>, predicate: F) -> Result<Self, ContractError>
    where
        F: Fn(&ArgumentRecord, &Value) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Condition::new(description, ContractKind::Postcondition, Predicate::binary(predicate))
    }

    /// An invariant's predicate receives a snapshot of the instance's fields.
    pub fn invariant<F>(description: impl Into<String>, predicate: F) -> Result<Self, ContractError>
    where
        F: Fn(&ArgumentRecord) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Condition::new(description, ContractKind::Invariant, Predicate::unary(predicate))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Evaluates the condition, turning `false` into a violation.
    ///
    /// `result` is the body's return value and is only consulted by
    /// postconditions.
    pub(crate) fn enforce(
        &self,
        callable: &str,
        record: &ArgumentRecord,
        result: Option<&Value>,
    ) -> Result<(), ContractError> {
        let holds = match (&self.predicate, result) {
            (Predicate::Unary(predicate), _) => predicate(record)?,
            (Predicate::Binary(predicate), Some(result)) => predicate(record, result)?,
            (Predicate::Binary(_), None) => {
                return Err(ContractError::malformed(format!(
                    "'{}' needs a return value to check",
                    self.description
                )))
            }
        };
        if holds {
            return Ok(());
        }

        tracing::debug!(
            kind = %self.kind,
            callable,
            description = %self.description,
            "contract violated"
        );
        Err(ContractViolation {
            kind: self.kind,
            callable: callable.to_string(),
            description: self.description.to_string(),
            arguments: record.clone(),
            actual_return: result.cloned(),
        }
        .into())
    }
}

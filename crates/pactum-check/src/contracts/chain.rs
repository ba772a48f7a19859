//! Contract wrappers and chains.
//!
//! A [`Callable`] is a shared function value: its [`ParameterShape`], the
//! argument transforms that run right after binding, and a chain of
//! [`Invoke`] layers ending in the original body. Wrapping a callable with a
//! condition pushes a new outermost layer, so a chain is a strict onion:
//! preconditions run outside-in, postconditions inside-out.
//!
//! Arguments are bound once per call, at the outermost boundary, against the
//! shape of the original body. Every layer shares that shape by reference.

use std::fmt;
use std::sync::Arc;

use pactum_core::{bind, ArgumentRecord, CallArgs, ContractError, ContractKind, ParameterShape, Value};

use crate::contracts::transform::{self, Transform};
use crate::contracts::Condition;
use crate::enforcement::{self, EnforcementMode};
use crate::invariant::InvariantGuard;

/// One layer of a contract chain.
pub trait Invoke: Send + Sync {
    fn invoke(&self, record: &ArgumentRecord) -> Result<Value, ContractError>;
}

/// The innermost layer: the undecorated body.
struct Body<F>(F);

impl<F> Invoke for Body<F>
where
    F: Fn(&ArgumentRecord) -> Result<Value, ContractError> + Send + Sync,
{
    fn invoke(&self, record: &ArgumentRecord) -> Result<Value, ContractError> {
        (self.0)(record)
    }
}

/// A precondition or postcondition around the next layer.
struct Guarded {
    callable: Arc<str>,
    condition: Condition,
    next: Arc<dyn Invoke>,
}

impl Invoke for Guarded {
    fn invoke(&self, record: &ArgumentRecord) -> Result<Value, ContractError> {
        if self.condition.kind() == ContractKind::Precondition {
            self.condition.enforce(&self.callable, record, None)?;
        }

        let result = self.next.invoke(record)?;

        // Effects of the body stay in place if this fails.
        if self.condition.kind() == ContractKind::Postcondition {
            self.condition.enforce(&self.callable, record, Some(&result))?;
        }
        Ok(result)
    }
}

/// A function value with zero or more contract layers.
///
/// Cloning is cheap and shares the chain.
#[derive(Clone)]
pub struct Callable {
    shape: Arc<ParameterShape>,
    transforms: Arc<[Transform]>,
    chain: Arc<dyn Invoke>,
}

impl Callable {
    /// Creates an undecorated callable from its shape and body.
    pub fn new<F>(shape: ParameterShape, body: F) -> Self
    where
        F: Fn(&ArgumentRecord) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        Callable {
            shape: Arc::new(shape),
            transforms: Arc::from(Vec::new()),
            chain: Arc::new(Body(body)),
        }
    }

    /// The original callable's shape, shared by every layer.
    pub fn shape(&self) -> &Arc<ParameterShape> {
        &self.shape
    }

    pub fn name(&self) -> &str {
        self.shape.name()
    }

    /// Binds `args`, applies transforms, and runs the chain.
    pub fn call(&self, args: CallArgs) -> Result<Value, ContractError> {
        let mut record = bind(&self.shape, &args)?;
        for transform in self.transforms.iter() {
            record = transform.apply(record)?;
        }
        self.chain.invoke(&record)
    }

    /// Returns `true` if both values are the same callable, layer for layer.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.chain, &other.chain)
            && Arc::ptr_eq(&self.transforms, &other.transforms)
    }

    pub(crate) fn chain(&self) -> &Arc<dyn Invoke> {
        &self.chain
    }

    /// Same shape and transforms over a new chain.
    pub(crate) fn with_chain(&self, chain: Arc<dyn Invoke>) -> Callable {
        Callable {
            shape: Arc::clone(&self.shape),
            transforms: Arc::clone(&self.transforms),
            chain,
        }
    }

    /// Same shape and chain with `transform` running before the existing
    /// transforms.
    pub(crate) fn with_leading_transform(&self, transform: Transform) -> Callable {
        let transforms: Vec<Transform> = std::iter::once(transform)
            .chain(self.transforms.iter().cloned())
            .collect();
        Callable {
            shape: Arc::clone(&self.shape),
            transforms: Arc::from(transforms),
            chain: Arc::clone(&self.chain),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("shape", &self.shape)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

/// Wraps `callable` with `condition` as its new outermost layer.
///
/// Returns `callable` unchanged when enforcement is disabled. An invariant
/// condition is checked on the receiver (the first positional argument)
/// before and after the call.
pub fn wrap(callable: Callable, condition: Condition) -> Callable {
    wrap_with(enforcement::mode(), callable, condition)
}

pub(crate) fn wrap_with(mode: EnforcementMode, callable: Callable, condition: Condition) -> Callable {
    if !mode.is_enabled() {
        return callable;
    }

    let next = Arc::clone(callable.chain());
    let layer: Arc<dyn Invoke> = match condition.kind() {
        ContractKind::Invariant => Arc::new(InvariantGuard::new(
            callable.name(),
            callable.shape().receiver(),
            Arc::from(vec![condition]),
            true,
            next,
        )),
        _ => Arc::new(Guarded {
            callable: Arc::from(callable.name()),
            condition,
            next,
        }),
    };
    callable.with_chain(layer)
}

/// Declarative contract for a callable.
///
/// Conditions nest in declaration order: the first declared is the
/// outermost layer, so its precondition runs first and its postcondition
/// last. Transforms are hoisted in front of every condition and run in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    conditions: Vec<Condition>,
    transforms: Vec<Transform>,
}

impl Contract {
    pub fn new() -> Self {
        Contract::default()
    }

    /// Adds a precondition.
    pub fn require<F>(self, description: impl Into<String>, predicate: F) -> Result<Self, ContractError>
    where
        F: Fn(&ArgumentRecord) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Ok(self.condition(Condition::precondition(description, predicate)?))
    }

    /// Adds a postcondition.
    pub fn ensure<F>(self, description: impl Into<String>, predicate: F) -> Result<Self, ContractError>
    where
        F: Fn(&ArgumentRecord, &Value) -> Result<bool, ContractError> + Send + Sync + 'static,
    {
        Ok(self.condition(Condition::postcondition(description, predicate)?))
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds an argument transform.
    pub fn transform<F>(mut self, rewriter: F) -> Self
    where
        F: Fn(&ArgumentRecord) -> Result<ArgumentRecord, ContractError> + Send + Sync + 'static,
    {
        self.transforms.push(Transform::new(rewriter));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Layers this contract around `callable`.
    pub fn apply(&self, callable: Callable) -> Callable {
        self.apply_with(enforcement::mode(), callable)
    }

    pub(crate) fn apply_with(&self, mode: EnforcementMode, callable: Callable) -> Callable {
        if !mode.is_enabled() {
            return callable;
        }
        let wrapped = self
            .conditions
            .iter()
            .rev()
            .fold(callable, |inner, condition| wrap_with(mode, inner, condition.clone()));
        self.transforms
            .iter()
            .rev()
            .fold(wrapped, |inner, rewriter| transform::transform_with(mode, inner, rewriter.clone()))
    }
}

//! Class invariants.
//!
//! [`derive_invariant_type`] takes a [`Class`] and a list of invariant
//! conditions and returns a derived type of the same name whose qualifying
//! methods check every invariant, in declaration order, against a snapshot
//! of the receiver's fields:
//!
//! - before the call, except for the constructor (the instance is not yet
//!   valid),
//! - after the call, including the constructor.
//!
//! Methods that do not qualify (see [`qualifies`]) pass through unwrapped.
//! Methods attached to either type after derivation are never wrapped.

pub mod class;

use std::sync::Arc;

use pactum_core::{ArgumentRecord, ContractError, ContractKind, Object, Value};

use crate::contracts::chain::Invoke;
use crate::contracts::Condition;
use crate::enforcement::{self, EnforcementMode};
use class::{Class, Method, MethodKind};

/// Name under which a type's constructor is registered.
pub const CONSTRUCTOR: &str = "__init__";

/// Special names that are still wrapped: the constructor, indexing and
/// comparisons.
const ALLOWED_SPECIAL: [&str; 9] = [
    "__getitem__",
    "__setitem__",
    "__lt__",
    "__le__",
    "__eq__",
    "__ne__",
    "__gt__",
    "__ge__",
    CONSTRUCTOR,
];

fn is_special(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__")
}

fn is_constructor(name: &str, method: &Method) -> bool {
    name == CONSTRUCTOR || method.kind() == MethodKind::Constructor
}

/// The record an invariant predicate sees: the object's fields by name.
pub(crate) fn snapshot(object: &Object) -> ArgumentRecord {
    ArgumentRecord::from_object(object)
}

/// Whether a method of this name and kind gets invariant checks.
///
/// Type-level (static) methods never do. Special `__name__` methods do only
/// if allow-listed. Everything else does, including single-underscore
/// private names.
pub fn qualifies(name: &str, method: &Method) -> bool {
    if method.kind() == MethodKind::Static {
        return false;
    }
    !is_special(name) || ALLOWED_SPECIAL.contains(&name)
}

/// Checks invariants on the receiver around the next layer.
pub(crate) struct InvariantGuard {
    method: String,
    receiver: Option<String>,
    invariants: Arc<[Condition]>,
    check_before: bool,
    next: Arc<dyn Invoke>,
}

impl InvariantGuard {
    pub(crate) fn new(
        method: &str,
        receiver: Option<&str>,
        invariants: Arc<[Condition]>,
        check_before: bool,
        next: Arc<dyn Invoke>,
    ) -> Self {
        InvariantGuard {
            method: method.to_string(),
            receiver: receiver.map(str::to_string),
            invariants,
            check_before,
            next,
        }
    }

    fn receiver<'r>(&self, record: &'r ArgumentRecord) -> Result<&'r Object, ContractError> {
        self.receiver
            .as_deref()
            .and_then(|name| record.get(name).ok())
            .and_then(Value::as_object)
            .ok_or_else(|| ContractError::InvalidReceiver {
                method: self.method.clone(),
            })
    }

    /// Evaluates every invariant in order, stopping at the first failure.
    fn check(&self, callable: &str, receiver: &Object) -> Result<(), ContractError> {
        let snapshot = snapshot(receiver);
        for invariant in self.invariants.iter() {
            invariant.enforce(callable, &snapshot, None)?;
        }
        Ok(())
    }
}

impl Invoke for InvariantGuard {
    fn invoke(&self, record: &ArgumentRecord) -> Result<Value, ContractError> {
        let receiver = self.receiver(record)?;
        let callable = format!("{}.{}", receiver.type_name(), self.method);

        if self.check_before {
            self.check(&callable, receiver)?;
        }
        let result = self.next.invoke(record)?;
        self.check(&callable, receiver)?;
        Ok(result)
    }
}

/// Derives a type whose qualifying methods enforce `invariants`.
///
/// Returns `source` itself when enforcement is disabled or there are no
/// invariants. Every condition must be of kind
/// [`ContractKind::Invariant`], and every qualifying method must take a
/// receiver.
pub fn derive_invariant_type(
    source: &Class,
    invariants: impl IntoIterator<Item = Condition>,
) -> Result<Class, ContractError> {
    derive_with(enforcement::mode(), source, invariants)
}

pub(crate) fn derive_with(
    mode: EnforcementMode,
    source: &Class,
    invariants: impl IntoIterator<Item = Condition>,
) -> Result<Class, ContractError> {
    let invariants: Vec<Condition> = invariants.into_iter().collect();
    if let Some(wrong) = invariants
        .iter()
        .find(|c| c.kind() != ContractKind::Invariant)
    {
        return Err(ContractError::malformed(format!(
            "'{}' is a {}, not an invariant",
            wrong.description(),
            wrong.kind()
        )));
    }
    if !mode.is_enabled() || invariants.is_empty() {
        return Ok(source.clone());
    }

    let invariants: Arc<[Condition]> = Arc::from(invariants);
    let derived = Class::subclass(source.name(), source);
    let mut wrapped = 0usize;

    for (name, method) in source.resolved_methods() {
        if !qualifies(&name, &method) {
            tracing::trace!(type_name = source.name(), method = %name, "method exempt from invariants");
            continue;
        }
        let callable = method.callable();
        let receiver = callable.shape().receiver().ok_or_else(|| {
            ContractError::malformed(format!(
                "{}.{}() takes no receiver and cannot check invariants",
                source.name(),
                name
            ))
        })?;
        let guard = InvariantGuard::new(
            &name,
            Some(receiver),
            Arc::clone(&invariants),
            !is_constructor(&name, &method),
            Arc::clone(callable.chain()),
        );
        derived.attach(name, method.with_callable(callable.with_chain(Arc::new(guard))));
        wrapped += 1;
    }

    tracing::debug!(
        type_name = source.name(),
        invariants = invariants.len(),
        wrapped,
        "derived invariant type"
    );
    Ok(derived)
}

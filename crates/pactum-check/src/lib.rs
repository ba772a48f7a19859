//! Runtime contract enforcement for callables and types.
//!
//! Preconditions, postconditions and class invariants are declared once and
//! checked automatically at call boundaries:
//!
//! - [`Condition`] is a described predicate tagged with its [`ContractKind`].
//! - [`Callable`] is a function value; [`wrap`] and [`Contract`] layer
//!   conditions around it, first declared outermost.
//! - [`Transform`] rewrites the bound arguments before any condition sees
//!   them.
//! - [`derive_invariant_type`] produces a [`Class`] whose qualifying methods
//!   check the type's invariants before and after they run.
//! - [`enforcement`] fixes, once per process, whether any of this happens.
//!   When disabled every construction step above returns its input
//!   unchanged.
//!
//! # Usage
//!
//! ```ignore
//! let add2 = Contract::new()
//!     .require("`i` must be positive", |args| Ok(args.int("i")? > 0))?
//!     .ensure("the result must exceed `i`", |args, result| {
//!         Ok(result.as_int() > Some(args.int("i")?))
//!     })?
//!     .apply(Callable::new(shape, |args| Ok(Value::Int(args.int("i")? + args.int("j")?))));
//! add2.call(CallArgs::new().arg(1).arg(3))?;
//! ```

pub mod contracts;
pub mod enforcement;
pub mod invariant;

pub use contracts::chain::{wrap, Callable, Contract, Invoke};
pub use contracts::transform::{transform, Transform};
pub use contracts::types::{types, TYPES_DESCRIPTION};
pub use contracts::{Condition, Predicate};
pub use enforcement::{EnforcementError, EnforcementMode};
pub use invariant::class::{Class, Instance, Method, MethodKind};
pub use invariant::{derive_invariant_type, qualifies, CONSTRUCTOR};

pub use pactum_core::{
    ArgumentRecord, CallArgs, ContractError, ContractKind, ContractViolation, ParameterShape,
    Value, ValueKind,
};

//! Argument transforms.
//!
//! A transform rewrites the bound record once per call, before the first
//! condition sees it, and the body then runs on the rewritten values. The
//! typical use is materializing a one-shot [`Stream`](pactum_core::Stream)
//! argument into a list so that a precondition can inspect it without
//! starving the body.

use std::fmt;
use std::sync::Arc;

use pactum_core::{ArgumentRecord, ContractError};

use crate::contracts::chain::Callable;
use crate::enforcement::{self, EnforcementMode};

type Rewriter = Arc<dyn Fn(&ArgumentRecord) -> Result<ArgumentRecord, ContractError> + Send + Sync>;

/// A pure rewrite of an argument record.
#[derive(Clone)]
pub struct Transform {
    rewriter: Rewriter,
}

impl Transform {
    pub fn new<F>(rewriter: F) -> Self
    where
        F: Fn(&ArgumentRecord) -> Result<ArgumentRecord, ContractError> + Send + Sync + 'static,
    {
        Transform {
            rewriter: Arc::new(rewriter),
        }
    }

    /// Runs the rewriter. The output must name the same entries as the
    /// input.
    pub fn apply(&self, record: ArgumentRecord) -> Result<ArgumentRecord, ContractError> {
        let rewritten = (self.rewriter)(&record)?;
        if !rewritten.same_names(&record) {
            return Err(ContractError::malformed(format!(
                "transform on {}() must keep its argument names",
                record.callable()
            )));
        }
        Ok(rewritten)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform")
    }
}

/// Makes `transform` the first thing `callable` does with its bound
/// arguments. Returns `callable` unchanged when enforcement is disabled.
pub fn transform(callable: Callable, transform: Transform) -> Callable {
    transform_with(enforcement::mode(), callable, transform)
}

pub(crate) fn transform_with(
    mode: EnforcementMode,
    callable: Callable,
    transform: Transform,
) -> Callable {
    if !mode.is_enabled() {
        return callable;
    }
    callable.with_leading_transform(transform)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pactum_core::{CallArgs, ParameterShape, Stream, Value};

    use super::*;
    use crate::contracts::chain::Contract;

    fn enabled() {
        enforcement::init(EnforcementMode::Enabled).unwrap();
    }

    fn iota(n: i64) -> Stream {
        Stream::new((1..n).map(Value::Int))
    }

    fn my_func() -> Callable {
        let shape = ParameterShape::builder("my_func").param("l").build().unwrap();
        Callable::new(shape, |args| {
            let total: i64 = args.items("l")?.iter().filter_map(Value::as_int).sum();
            Ok(Value::Int(total))
        })
    }

    fn all_positive() -> Contract {
        Contract::new()
            .require("every item in `l` must be > 0", |args| {
                Ok(args.items("l")?.iter().all(|x| x.as_int().is_some_and(|x| x > 0)))
            })
            .unwrap()
    }

    fn materialize(args: &ArgumentRecord) -> Result<ArgumentRecord, ContractError> {
        let items = args.items("l")?;
        args.rewrite([("l", Value::List(items))])
    }

    #[test]
    fn precondition_exhausts_an_untransformed_stream() {
        enabled();
        let callable = all_positive().apply(my_func());
        assert_eq!(callable.call(CallArgs::new().arg(iota(5))).unwrap(), Value::Int(0));
    }

    #[test]
    fn transform_materializes_before_preconditions() {
        enabled();
        let callable = all_positive().transform(materialize).apply(my_func());
        assert_eq!(callable.call(CallArgs::new().arg(iota(5))).unwrap(), Value::Int(10));

        let err = callable
            .call(CallArgs::new().arg(vec![Value::Int(0), Value::Int(-1), Value::Int(2)]))
            .unwrap_err();
        assert_eq!(err.to_string(), "every item in `l` must be > 0");
    }

    #[test]
    fn transform_hoists_in_front_of_later_conditions() {
        enabled();
        // The precondition is layered outside the transform, yet sees the
        // materialized list.
        let callable = all_positive().apply(transform(my_func(), Transform::new(materialize)));
        assert_eq!(callable.call(CallArgs::new().arg(iota(4))).unwrap(), Value::Int(6));
    }

    #[test]
    fn rewriter_runs_once_per_call() {
        enabled();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callable = all_positive()
            .transform(move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                materialize(args)
            })
            .apply(my_func());

        callable.call(CallArgs::new().arg(iota(3))).unwrap();
        callable.call(CallArgs::new().arg(iota(3))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn transforms_run_in_declaration_order() {
        enabled();
        let shape = ParameterShape::builder("echo").param("x").build().unwrap();
        let echo = Callable::new(shape, |args| Ok(args.get("x")?.clone()));
        let callable = Contract::new()
            .transform(|args| {
                let x = args.int("x")?;
                args.rewrite([("x", Value::Int(x * 10))])
            })
            .transform(|args| {
                let x = args.int("x")?;
                args.rewrite([("x", Value::Int(x + 1))])
            })
            .apply(echo);

        assert_eq!(callable.call(CallArgs::new().arg(2)).unwrap(), Value::Int(21));
    }

    #[test]
    fn rewritten_record_must_keep_names() {
        enabled();
        let other = ParameterShape::builder("other").param("y").build().unwrap();
        let callable = transform(
            my_func(),
            Transform::new(move |_| pactum_core::bind(&other, &CallArgs::new().arg(1))),
        );
        let err = callable.call(CallArgs::new().arg(Vec::<Value>::new())).unwrap_err();
        assert!(matches!(err, ContractError::MalformedContract { .. }));
    }

    #[test]
    fn disabled_transform_is_identity() {
        let base = my_func();
        let same = transform_with(EnforcementMode::Disabled, base.clone(), Transform::new(materialize));
        assert!(same.ptr_eq(&base));
    }
}

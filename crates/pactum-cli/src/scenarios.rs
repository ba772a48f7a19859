//! Demonstration scenarios.
//!
//! Each scenario declares its contracts when it runs, so the enforcement
//! mode must be fixed before calling one.

use pactum_check::{
    derive_invariant_type, CallArgs, Callable, Class, Condition, Contract, ContractError, Method,
    ParameterShape, Value, CONSTRUCTOR,
};
use pactum_core::Stream;

/// Opens an account with `balance` and withdraws `amount` from it.
pub fn bank(balance: i64, amount: i64) -> Result<Value, ContractError> {
    let init = ParameterShape::builder(CONSTRUCTOR)
        .param("self")
        .param_default("balance", 0)
        .build()?;
    let withdraw = ParameterShape::builder("withdraw")
        .param("self")
        .param("amount")
        .build()?;

    let source = Class::new("BankAccount")
        .constructor(Callable::new(init, |args| {
            args.object("self")?.set("balance", args.int("balance")?);
            Ok(Value::Unit)
        }))
        .method(
            "withdraw",
            Method::instance(Callable::new(withdraw, |args| {
                let this = args.object("self")?;
                let left = this.get("balance").and_then(|v| v.as_int()).unwrap_or(0)
                    - args.int("amount")?;
                this.set("balance", left);
                Ok(Value::Int(left))
            })),
        );
    let account = derive_invariant_type(
        &source,
        [Condition::invariant("balance must be non-negative", |this| {
            Ok(this.int("balance")? >= 0)
        })?],
    )?;

    let account = account.instantiate(CallArgs::new().kwarg("balance", balance))?;
    account.call("withdraw", CallArgs::new().arg(amount))
}

/// Adds two positive integers. Deliberately wrong when `i` is 7.
pub fn add(i: i64, j: i64) -> Result<Value, ContractError> {
    let shape = ParameterShape::builder("add2").param("i").param("j").build()?;
    let add2 = Contract::new()
        .require("`i` must be a positive integer", |args| Ok(args.int("i")? > 0))?
        .require("`j` must be a positive integer", |args| Ok(args.int("j")? > 0))?
        .ensure("the result must be greater than either `i` or `j`", |args, result| {
            let result = result.as_int().unwrap_or(i64::MIN);
            Ok(result > args.int("i")? && result > args.int("j")?)
        })?
        .apply(Callable::new(shape, |args| {
            let i = match args.int("i")? {
                7 => -7,
                i => i,
            };
            Ok(Value::Int(i + args.int("j")?))
        }));

    add2.call(CallArgs::new().arg(i).arg(j))
}

/// Sums the one-shot stream `1..n` under an "all positive" precondition.
///
/// Without `materialize` the precondition consumes the stream and the body
/// sums nothing.
pub fn sum_stream(n: i64, materialize: bool) -> Result<Value, ContractError> {
    let shape = ParameterShape::builder("sum").param("l").build()?;
    let mut contract = Contract::new();
    if materialize {
        contract = contract.transform(|args| {
            let items = args.items("l")?;
            args.rewrite([("l", Value::List(items))])
        });
    }
    let sum = contract
        .require("every item in `l` must be > 0", |args| {
            Ok(args.items("l")?.iter().all(|x| x.as_int().is_some_and(|x| x > 0)))
        })?
        .apply(Callable::new(shape, |args| {
            Ok(Value::Int(args.items("l")?.iter().filter_map(Value::as_int).sum()))
        }));

    sum.call(CallArgs::new().arg(Stream::new((1..n).map(Value::Int))))
}

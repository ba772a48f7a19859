//! End-to-end bank account scenario with contracts enforced.

use pactum_check::enforcement;
use pactum_check::{
    derive_invariant_type, CallArgs, Callable, Class, Condition, Contract, ContractKind,
    EnforcementMode, Instance, Method, ParameterShape, Value, CONSTRUCTOR,
};

fn bank_account() -> Class {
    let init = ParameterShape::builder(CONSTRUCTOR)
        .param("self")
        .param_default("balance", 0)
        .build()
        .unwrap();
    let withdraw = ParameterShape::builder("withdraw")
        .param("self")
        .param("amount")
        .build()
        .unwrap();

    let withdraw = Contract::new()
        .require("`amount` must be positive", |args| Ok(args.int("amount")? > 0))
        .unwrap()
        .apply(Callable::new(withdraw, |args| {
            let this = args.object("self")?;
            let balance = this.get("balance").and_then(|v| v.as_int()).unwrap_or(0);
            let balance = balance - args.int("amount")?;
            this.set("balance", balance);
            Ok(Value::Int(balance))
        }));

    let source = Class::new("BankAccount")
        .constructor(Callable::new(init, |args| {
            args.object("self")?.set("balance", args.int("balance")?);
            Ok(Value::Unit)
        }))
        .method("withdraw", Method::instance(withdraw));

    derive_invariant_type(
        &source,
        [Condition::invariant("balance must be non-negative", |this| {
            Ok(this.int("balance")? >= 0)
        })
        .unwrap()],
    )
    .unwrap()
}

fn open(balance: i64) -> Instance {
    enforcement::init(EnforcementMode::Enabled).unwrap();
    bank_account()
        .instantiate(CallArgs::new().kwarg("balance", balance))
        .unwrap()
}

#[test]
fn overdraft_violates_the_invariant() {
    let account = open(100);
    let err = account
        .call("withdraw", CallArgs::new().arg(150))
        .unwrap_err();

    let violation = err.violation().expect("an invariant violation");
    assert_eq!(violation.kind, ContractKind::Invariant);
    assert_eq!(violation.description, "balance must be non-negative");
    assert_eq!(err.to_string(), "balance must be non-negative");
    // No rollback: the body's effect stays.
    assert_eq!(account.get("balance"), Some(Value::Int(-50)));
}

#[test]
fn valid_withdrawals_succeed() {
    let account = open(100);
    assert_eq!(
        account.call("withdraw", CallArgs::new().arg(40)).unwrap(),
        Value::Int(60)
    );
    assert_eq!(
        account.call("withdraw", CallArgs::new().kwarg("amount", 60)).unwrap(),
        Value::Int(0)
    );
}

#[test]
fn method_preconditions_run_inside_the_invariant_checks() {
    let account = open(10);
    let err = account.call("withdraw", CallArgs::new().arg(-5)).unwrap_err();
    assert_eq!(err.violation().unwrap().kind, ContractKind::Precondition);
    assert_eq!(account.get("balance"), Some(Value::Int(10)));
}

#[test]
fn violation_report_serializes() {
    let account = open(100);
    let err = account.call("withdraw", CallArgs::new().arg(150)).unwrap_err();
    insta::assert_json_snapshot!(err.violation().unwrap(), @r###"
    {
      "kind": "Invariant",
      "callable": "BankAccount.withdraw",
      "description": "balance must be non-negative",
      "arguments": {
        "balance": {
          "Int": -50
        }
      },
      "actual_return": null
    }
    "###);
}

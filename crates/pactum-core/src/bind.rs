//! The argument binder.
//!
//! Turns a caller's positional and keyword arguments into the canonical
//! [`ArgumentRecord`] for a [`ParameterShape`]. Overlay order is: defaults,
//! then positional values, then the positional tail, then keywords. Anything
//! ambiguous or incomplete fails loudly; no partial record is ever produced.

use indexmap::IndexMap;

use crate::error::ContractError;
use crate::record::{ArgumentRecord, CallArgs};
use crate::shape::ParameterShape;
use crate::value::Value;

/// Binds `args` against `shape`.
pub fn bind(shape: &ParameterShape, args: &CallArgs) -> Result<ArgumentRecord, ContractError> {
    let callable = shape.name();
    let positional = args.positional();
    let named = shape.positional().len();

    // Slots in record order; `None` marks a parameter still unresolved.
    let mut slots: IndexMap<String, Option<Value>> = IndexMap::with_capacity(shape.record_len());
    for param in shape.positional() {
        slots.insert(param.name.clone(), param.default.clone());
    }
    for (param, value) in shape.positional().iter().zip(positional) {
        slots.insert(param.name.clone(), Some(value.clone()));
    }

    let extra = positional.get(named..).unwrap_or(&[]);
    match shape.var_positional() {
        Some(tail) => {
            slots.insert(tail.to_string(), Some(Value::List(extra.to_vec())));
        }
        None if !extra.is_empty() => {
            return Err(ContractError::TooManyPositional {
                callable: callable.to_string(),
                expected: named,
                got: positional.len(),
            });
        }
        None => {}
    }

    for param in shape.keyword_only() {
        slots.insert(param.name.clone(), param.default.clone());
    }

    let mut keyword_tail = IndexMap::new();
    for (name, value) in args.keyword() {
        if shape.parameter(name).is_some() {
            if shape.position(name).is_some_and(|index| index < positional.len()) {
                return Err(ContractError::DuplicateArgument {
                    callable: callable.to_string(),
                    parameter: name.clone(),
                });
            }
            slots.insert(name.clone(), Some(value.clone()));
        } else if shape.var_keyword().is_some() {
            keyword_tail.insert(name.clone(), value.clone());
        } else {
            return Err(ContractError::UnexpectedArgument {
                callable: callable.to_string(),
                parameter: name.clone(),
            });
        }
    }
    if let Some(tail) = shape.var_keyword() {
        slots.insert(tail.to_string(), Some(Value::Map(keyword_tail)));
    }

    let mut entries = IndexMap::with_capacity(slots.len());
    for (name, slot) in slots {
        match slot {
            Some(value) => {
                entries.insert(name, value);
            }
            None => {
                return Err(ContractError::MissingArgument {
                    callable: callable.to_string(),
                    parameter: name,
                });
            }
        }
    }

    Ok(ArgumentRecord::new(callable, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn abc() -> ParameterShape {
        ParameterShape::builder("func")
            .param("a")
            .param("b")
            .param_default("c", "x")
            .build()
            .unwrap()
    }

    fn entries(record: &ArgumentRecord) -> Vec<(String, Value)> {
        record
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn calling_convention_does_not_change_the_record() {
        let shape = abc();
        let by_position = bind(&shape, &CallArgs::new().arg(1).arg(2)).unwrap();
        let with_default = bind(&shape, &CallArgs::new().arg(1).arg(2).arg("x")).unwrap();
        let by_keyword = bind(&shape, &CallArgs::new().kwarg("a", 1).kwarg("b", 2)).unwrap();
        let mut expanded = CallArgs::new();
        for (name, value) in [("a", 1), ("b", 2)] {
            expanded = expanded.kwarg(name, value);
        }
        let from_mapping = bind(&shape, &expanded).unwrap();

        assert_eq!(by_position, with_default);
        assert_eq!(by_position, by_keyword);
        assert_eq!(by_position, from_mapping);
        assert_eq!(
            entries(&by_position),
            vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
                ("c".to_string(), Value::from("x")),
            ]
        );
    }

    #[test]
    fn keyword_overrides_default() {
        let record = bind(&abc(), &CallArgs::new().arg(1).arg(2).kwarg("c", "y")).unwrap();
        assert_eq!(record.str("c").unwrap(), "y");
    }

    #[test]
    fn missing_required_argument() {
        let shape = ParameterShape::builder("add2").param("i").param("j").build().unwrap();
        let err = bind(&shape, &CallArgs::new().arg(1)).unwrap_err();
        assert_eq!(
            err,
            ContractError::MissingArgument {
                callable: "add2".into(),
                parameter: "j".into(),
            }
        );
        insta::assert_snapshot!(err.to_string(), @"add2() missing required argument: 'j'");
    }

    #[test]
    fn positional_and_keyword_collision_fails() {
        let err = bind(&abc(), &CallArgs::new().arg(1).arg(2).kwarg("a", 3)).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateArgument { ref parameter, .. } if parameter == "a"));
    }

    #[test]
    fn unknown_keyword_fails_without_keyword_tail() {
        let err = bind(&abc(), &CallArgs::new().arg(1).arg(2).kwarg("d", 3)).unwrap_err();
        assert!(matches!(err, ContractError::UnexpectedArgument { ref parameter, .. } if parameter == "d"));
    }

    #[test]
    fn positional_overflow_fails_without_tail() {
        let err = bind(&abc(), &CallArgs::new().arg(1).arg(2).arg(3).arg(4)).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"func() takes 3 positional arguments but 4 were given");
    }

    #[test]
    fn positional_tail_captures_extras() {
        let shape = ParameterShape::builder("func")
            .param("a")
            .param_default("b", "Foo")
            .var_positional("c")
            .build()
            .unwrap();

        let record = bind(&shape, &CallArgs::new().arg(1).arg(2).arg(3).arg(4)).unwrap();
        assert_eq!(record.int("a").unwrap(), 1);
        assert_eq!(record.int("b").unwrap(), 2);
        assert_eq!(record.list("c").unwrap(), &[Value::Int(3), Value::Int(4)]);

        let record = bind(&shape, &CallArgs::new().arg(1)).unwrap();
        assert_eq!(record.str("b").unwrap(), "Foo");
        assert!(record.list("c").unwrap().is_empty());
    }

    #[test]
    fn keyword_tail_captures_unknown_keywords() {
        let shape = ParameterShape::builder("configure")
            .param("name")
            .keyword_only_default("strict", false)
            .var_keyword("options")
            .build()
            .unwrap();

        let record = bind(
            &shape,
            &CallArgs::new().arg("db").kwarg("retries", 3).kwarg("strict", true),
        )
        .unwrap();
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["name", "strict", "options"]);
        assert!(record.bool("strict").unwrap());
        assert_eq!(record.map("options").unwrap()["retries"], Value::Int(3));
    }

    #[test]
    fn keyword_only_cannot_be_positional() {
        let shape = ParameterShape::builder("f")
            .param("a")
            .keyword_only("key")
            .build()
            .unwrap();

        let err = bind(&shape, &CallArgs::new().arg(1).arg(2)).unwrap_err();
        assert!(matches!(err, ContractError::TooManyPositional { .. }));

        let err = bind(&shape, &CallArgs::new().arg(1)).unwrap_err();
        assert!(matches!(err, ContractError::MissingArgument { ref parameter, .. } if parameter == "key"));

        let record = bind(&shape, &CallArgs::new().arg(1).kwarg("key", "k")).unwrap();
        assert_eq!(record.str("key").unwrap(), "k");
    }

    proptest! {
        #[test]
        fn binding_is_calling_convention_invariant(
            a in any::<i64>(),
            b in any::<i64>(),
            a_by_keyword in any::<bool>(),
            b_by_keyword in any::<bool>(),
            pass_default in any::<bool>(),
        ) {
            let shape = abc();
            let expected = bind(&shape, &CallArgs::new().arg(a).arg(b)).unwrap();

            // A keyword for `a` forces `b` to be a keyword too.
            let mut args = CallArgs::new();
            if a_by_keyword {
                args = args.kwarg("a", a).kwarg("b", b);
            } else if b_by_keyword {
                args = args.arg(a).kwarg("b", b);
            } else {
                args = args.arg(a).arg(b);
            }
            if pass_default {
                args = args.kwarg("c", "x");
            }

            prop_assert_eq!(bind(&shape, &args).unwrap(), expected);
        }
    }
}

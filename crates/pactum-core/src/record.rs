//! Call arguments and the canonical argument record.
//!
//! [`CallArgs`] is what a caller hands over: positional values plus keyword
//! values. [`ArgumentRecord`] is what predicates see after binding: every
//! parameter by name, defaults resolved, tails captured.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::ContractError;
use crate::object::Object;
use crate::value::{Stream, Value, ValueKind};

/// Arguments of one call, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: SmallVec<[Value; 4]>,
    keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        CallArgs::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument. A repeated name replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Prepends a receiver in front of the positional arguments.
    pub fn with_receiver(mut self, receiver: impl Into<Value>) -> Self {
        self.positional.insert(0, receiver.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(positional: Vec<Value>) -> Self {
        CallArgs {
            positional: SmallVec::from_vec(positional),
            keyword: IndexMap::new(),
        }
    }
}

/// Immutable, name-keyed snapshot of one call's bound arguments.
///
/// Entries keep declaration order: positional parameters, the positional
/// tail, keyword-only parameters, then the keyword tail. A record is never
/// partial; binding fails instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentRecord {
    callable: String,
    entries: IndexMap<String, Value>,
}

impl ArgumentRecord {
    pub(crate) fn new(callable: impl Into<String>, entries: IndexMap<String, Value>) -> Self {
        ArgumentRecord {
            callable: callable.into(),
            entries,
        }
    }

    /// Snapshot of an object's fields, the record invariant predicates see.
    pub fn from_object(object: &Object) -> Self {
        ArgumentRecord::new(object.type_name(), object.fields())
    }

    /// Name of the callable (or type) the record belongs to.
    pub fn callable(&self) -> &str {
        &self.callable
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Result<&Value, ContractError> {
        self.entries
            .get(name)
            .ok_or_else(|| ContractError::UnknownArgument {
                callable: self.callable.clone(),
                name: name.to_string(),
            })
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: ValueKind,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, ContractError> {
        let value = self.get(name)?;
        extract(value).ok_or_else(|| ContractError::ArgumentType {
            callable: self.callable.clone(),
            name: name.to_string(),
            expected,
            got: value.kind(),
        })
    }

    pub fn int(&self, name: &str) -> Result<i64, ContractError> {
        self.typed(name, ValueKind::Int, Value::as_int)
    }

    pub fn float(&self, name: &str) -> Result<f64, ContractError> {
        self.typed(name, ValueKind::Float, Value::as_float)
    }

    /// Reads an `Int` or `Float` entry as `f64`.
    pub fn number(&self, name: &str) -> Result<f64, ContractError> {
        self.typed(name, ValueKind::Float, Value::as_number)
    }

    pub fn bool(&self, name: &str) -> Result<bool, ContractError> {
        self.typed(name, ValueKind::Bool, Value::as_bool)
    }

    pub fn str(&self, name: &str) -> Result<&str, ContractError> {
        self.typed(name, ValueKind::Str, Value::as_str)
    }

    pub fn list(&self, name: &str) -> Result<&[Value], ContractError> {
        self.typed(name, ValueKind::List, Value::as_list)
    }

    pub fn map(&self, name: &str) -> Result<&IndexMap<String, Value>, ContractError> {
        self.typed(name, ValueKind::Map, Value::as_map)
    }

    pub fn object(&self, name: &str) -> Result<&Object, ContractError> {
        self.typed(name, ValueKind::Object, Value::as_object)
    }

    pub fn stream(&self, name: &str) -> Result<&Stream, ContractError> {
        self.typed(name, ValueKind::Stream, Value::as_stream)
    }

    /// Items of a sequence entry. Lists are copied; streams are drained, so
    /// reading a stream here exhausts it for everyone else.
    pub fn items(&self, name: &str) -> Result<Vec<Value>, ContractError> {
        match self.get(name)? {
            Value::List(items) => Ok(items.clone()),
            Value::Stream(stream) => Ok(stream.drain()),
            other => Err(ContractError::ArgumentType {
                callable: self.callable.clone(),
                name: name.to_string(),
                expected: ValueKind::List,
                got: other.kind(),
            }),
        }
    }

    /// Returns a copy with the named entries replaced.
    ///
    /// Rewriting cannot add or remove entries; naming an entry the record
    /// does not hold is an error.
    pub fn rewrite<I, K>(&self, updates: I) -> Result<ArgumentRecord, ContractError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut entries = self.entries.clone();
        for (name, value) in updates {
            let name = name.as_ref();
            match entries.get_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    return Err(ContractError::UnknownArgument {
                        callable: self.callable.clone(),
                        name: name.to_string(),
                    })
                }
            }
        }
        Ok(ArgumentRecord::new(self.callable.clone(), entries))
    }

    /// Returns `true` if both records hold the same entry names in the same
    /// order.
    pub fn same_names(&self, other: &ArgumentRecord) -> bool {
        self.names().eq(other.names())
    }
}

impl Serialize for ArgumentRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

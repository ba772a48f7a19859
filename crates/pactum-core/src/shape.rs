//! Parameter shapes: the static signature of a callable.
//!
//! A [`ParameterShape`] is built once per callable and shared by reference
//! through every contract layer wrapped around it, so binding always sees the
//! original signature no matter how many layers sit on top.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::value::Value;

/// How a declared parameter may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Supplied by position or by keyword.
    PositionalOrKeyword,
    /// Supplied by keyword only.
    KeywordOnly,
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Value used when the caller supplies nothing. `None` = required.
    pub default: Option<Value>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Ordered description of a callable's parameters.
///
/// Positional-or-keyword parameters come first, in declaration order,
/// followed by keyword-only parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterShape {
    name: String,
    params: Vec<Parameter>,
    positional_count: usize,
    var_positional: Option<String>,
    var_keyword: Option<String>,
}

impl ParameterShape {
    /// Starts a shape for the callable called `name`.
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder {
            name: name.into(),
            positional: Vec::new(),
            keyword_only: Vec::new(),
            var_positional: None,
            var_keyword: None,
        }
    }

    /// Name of the callable this shape describes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All named parameters: positional-or-keyword, then keyword-only.
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn positional(&self) -> &[Parameter] {
        &self.params[..self.positional_count]
    }

    pub fn keyword_only(&self) -> &[Parameter] {
        &self.params[self.positional_count..]
    }

    /// Name of the variadic positional tail, if declared.
    pub fn var_positional(&self) -> Option<&str> {
        self.var_positional.as_deref()
    }

    /// Name of the variadic keyword tail, if declared.
    pub fn var_keyword(&self) -> Option<&str> {
        self.var_keyword.as_deref()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Index of a positional-or-keyword parameter.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positional().iter().position(|p| p.name == name)
    }

    /// The first positional parameter, which receives the instance when the
    /// callable is used as a method.
    pub fn receiver(&self) -> Option<&str> {
        self.positional().first().map(|p| p.name.as_str())
    }

    /// Number of entries a bound record for this shape holds.
    pub fn record_len(&self) -> usize {
        self.params.len()
            + usize::from(self.var_positional.is_some())
            + usize::from(self.var_keyword.is_some())
    }
}

/// Incremental [`ParameterShape`] construction. Validated by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    positional: Vec<Parameter>,
    keyword_only: Vec<Parameter>,
    var_positional: Option<String>,
    var_keyword: Option<String>,
}

impl ShapeBuilder {
    /// Adds a required positional-or-keyword parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.positional.push(Parameter {
            name: name.into(),
            kind: ParameterKind::PositionalOrKeyword,
            default: None,
        });
        self
    }

    /// Adds a positional-or-keyword parameter with a default.
    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.positional.push(Parameter {
            name: name.into(),
            kind: ParameterKind::PositionalOrKeyword,
            default: Some(default.into()),
        });
        self
    }

    /// Adds a required keyword-only parameter.
    pub fn keyword_only(mut self, name: impl Into<String>) -> Self {
        self.keyword_only.push(Parameter {
            name: name.into(),
            kind: ParameterKind::KeywordOnly,
            default: None,
        });
        self
    }

    pub fn keyword_only_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.keyword_only.push(Parameter {
            name: name.into(),
            kind: ParameterKind::KeywordOnly,
            default: Some(default.into()),
        });
        self
    }

    /// Declares the variadic positional tail.
    pub fn var_positional(mut self, name: impl Into<String>) -> Self {
        self.var_positional = Some(name.into());
        self
    }

    /// Declares the variadic keyword tail.
    pub fn var_keyword(mut self, name: impl Into<String>) -> Self {
        self.var_keyword = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ParameterShape, ContractError> {
        if self.name.trim().is_empty() {
            return Err(ContractError::malformed("callables must have a name"));
        }

        let mut seen = HashSet::new();
        let names = self
            .positional
            .iter()
            .chain(&self.keyword_only)
            .map(|p| p.name.as_str())
            .chain(self.var_positional.as_deref())
            .chain(self.var_keyword.as_deref());
        for name in names {
            if name.is_empty() {
                return Err(ContractError::malformed(format!(
                    "{}() declares a parameter with an empty name",
                    self.name
                )));
            }
            if !seen.insert(name) {
                return Err(ContractError::malformed(format!(
                    "{}() declares parameter '{}' more than once",
                    self.name, name
                )));
            }
        }

        let mut defaulted: Option<&str> = None;
        for param in &self.positional {
            match (&param.default, defaulted) {
                (Some(_), _) => defaulted = Some(&param.name),
                (None, Some(previous)) => {
                    return Err(ContractError::malformed(format!(
                        "{}(): parameter '{}' without a default follows defaulted parameter '{}'",
                        self.name, param.name, previous
                    )));
                }
                (None, None) => {}
            }
        }

        let positional_count = self.positional.len();
        let mut params = self.positional;
        params.extend(self.keyword_only);

        Ok(ParameterShape {
            name: self.name,
            params,
            positional_count,
            var_positional: self.var_positional,
            var_keyword: self.var_keyword,
        })
    }
}

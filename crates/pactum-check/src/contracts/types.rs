//! Type-requirement preconditions.

use pactum_core::{ContractError, ValueKind};

use crate::contracts::Condition;

/// Description carried by every [`types`] precondition.
pub const TYPES_DESCRIPTION: &str = "the types of arguments must be valid";

/// Builds a precondition requiring each named argument to be one of the
/// listed kinds.
///
/// Naming an argument the call does not bind is a predicate error
/// (`UnknownArgument`), not a violation.
pub fn types(requirements: &[(&str, &[ValueKind])]) -> Result<Condition, ContractError> {
    let mut requirements: Vec<(String, Vec<ValueKind>)> = requirements
        .iter()
        .map(|(name, kinds)| (name.to_string(), kinds.to_vec()))
        .collect();
    requirements.sort_by(|a, b| a.0.cmp(&b.0));

    if let Some((name, _)) = requirements.iter().find(|(_, kinds)| kinds.is_empty()) {
        return Err(ContractError::malformed(format!(
            "type requirement for '{name}' lists no kinds"
        )));
    }

    Condition::precondition(TYPES_DESCRIPTION, move |args| {
        for (name, kinds) in &requirements {
            if !kinds.contains(&args.get(name)?.kind()) {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

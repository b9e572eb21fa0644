//! Parameter reconciliation
//!
//! A stack's parameters are known from three places that rarely agree on
//! their key sets: the deployed template's declarations (defaults), the live
//! stack (current values) and the change set (proposed values). Each source
//! becomes a [`ParameterSet`]; a key present with `None` means the source
//! knows the parameter but has no value for it.

use crate::cloud::{ParameterDeclaration, StackParameter};
use crate::model::ParameterRow;
use std::collections::{BTreeMap, BTreeSet};

pub type ParameterSet = BTreeMap<String, Option<String>>;

/// Merge the three sources into one row per parameter name, sorted by name
pub fn reconcile(
    defaults: &ParameterSet,
    current: &ParameterSet,
    proposed: &ParameterSet,
) -> Vec<ParameterRow> {
    let names: BTreeSet<&String> = defaults
        .keys()
        .chain(current.keys())
        .chain(proposed.keys())
        .collect();

    names
        .into_iter()
        .map(|name| ParameterRow {
            name: name.clone(),
            default: lookup(defaults, name),
            current_value: lookup(current, name),
            new_value: lookup(proposed, name),
        })
        .collect()
}

fn lookup(set: &ParameterSet, name: &str) -> Option<String> {
    set.get(name).cloned().flatten()
}

/// Declared parameters with their template defaults
pub fn declared_defaults(declarations: &[ParameterDeclaration]) -> ParameterSet {
    declarations
        .iter()
        .map(|d| (d.key.clone(), d.default_value.clone()))
        .collect()
}

/// Values currently applied to a stack
pub fn stack_values(parameters: &[StackParameter]) -> ParameterSet {
    parameters
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

/// Values a change set would apply.
///
/// Parameters flagged `UsePreviousValue` without an explicit value resolve
/// to the stack's current value.
pub fn proposed_values(parameters: &[StackParameter], current: &ParameterSet) -> ParameterSet {
    parameters
        .iter()
        .map(|p| {
            let value = match (&p.value, p.use_previous_value) {
                (Some(value), _) => Some(value.clone()),
                (None, true) => lookup(current, &p.key),
                (None, false) => None,
            };
            (p.key.clone(), value)
        })
        .collect()
}

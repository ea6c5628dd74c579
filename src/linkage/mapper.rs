//! Parameter mapper: derives the target parameter bag from the source payload.

use serde_json::Value;
use tracing::warn;

use crate::{
    LinkflowError, Result,
    common::Vars,
    linkage::runner::HandlerRunner,
    model::{MappingType, ParameterMapping},
};

/// Resolve a mapping list against the source payload.
///
/// With no mappings configured the whole payload passes through as a fresh
/// shallow copy. Otherwise the bag starts from that copy and each mapping is
/// applied in order, so unmapped payload fields remain present and later
/// mappings overwrite earlier writes to the same target parameter.
///
/// A failed or null resolution substitutes the mapping's `default_value` for
/// that target parameter only; it never aborts the rest of the list.
pub fn resolve_mappings(
    mappings: &[ParameterMapping],
    source_value: &Value,
) -> Vars {
    if mappings.is_empty() {
        return shallow_copy(source_value);
    }

    let mut bag = shallow_copy(source_value);
    for mapping in mappings {
        let value = match resolve_one(mapping, source_value) {
            Ok(v) if !v.is_null() => v,
            Ok(_) => mapping.default_value.clone().unwrap_or(Value::Null),
            Err(err) => {
                warn!(target_param = %mapping.target_param, "parameter mapping failed: {}", err);
                mapping.default_value.clone().unwrap_or(Value::Null)
            }
        };
        bag.set_value(&mapping.target_param, value);
    }

    bag
}

/// Read a dot-delimited path out of a JSON value.
///
/// An empty path yields the whole value. Traversal stops with `None` as soon
/// as a segment is missing or the current value is not an object.
pub fn nested_value<'a>(
    value: &'a Value,
    path: &str,
) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for key in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(key)?,
            _ => return None,
        }
    }

    Some(current)
}

fn resolve_one(
    mapping: &ParameterMapping,
    source_value: &Value,
) -> Result<Value> {
    match mapping.mapping_type {
        MappingType::Direct | MappingType::Rename => Ok(nested_value(source_value, &mapping.source_field).cloned().unwrap_or(Value::Null)),
        MappingType::Fixed => Ok(mapping.fixed_value.clone().unwrap_or(Value::Null)),
        MappingType::Expression => {
            let expression = mapping
                .expression
                .as_deref()
                .ok_or_else(|| LinkflowError::Mapping(format!("expression mapping for '{}' has no expression", mapping.target_param)))?;
            HandlerRunner::eval_expression(expression, source_value)
                .map_err(|e| LinkflowError::Mapping(format!("expression for '{}' failed: {}", mapping.target_param, e)))
        }
    }
}

// A non-object payload has no fields to copy and yields an empty bag.
fn shallow_copy(source_value: &Value) -> Vars {
    match source_value {
        Value::Object(map) => Vars::from(map.clone()),
        _ => Vars::new(),
    }
}

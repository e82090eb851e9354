//! Context-variable substitution: a `":name"` string anywhere in `params` or
//! a `return_value_test.value` is replaced by `context[name]` at evaluation
//! time. Substitution does not recurse — the resolved value is used as-is,
//! even if it happens to itself look like `":other"`.

use crate::value::ConditionValue;
use serde_json::Value;
use std::collections::HashMap;
use threshold_errors::{NodeError, Result};

/// The request-scoped variables available for substitution.
pub type Context = HashMap<String, Value>;

pub fn is_context_variable(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.starts_with(':'))
}

fn variable_name(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if s.starts_with(':') => Some(&s[1..]),
        _ => None,
    }
}

/// Resolve a single JSON value, substituting it if it is a context variable.
pub fn resolve(value: &Value, context: &Context) -> Result<Value> {
    if let Some(name) = variable_name(value) {
        return context
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::RequiredInput(name.to_string()));
    }
    Ok(value.clone())
}

/// Resolve every element of a params array, substituting context variables.
pub fn resolve_params(params: &[Value], context: &Context) -> Result<Vec<Value>> {
    params.iter().map(|p| resolve(p, context)).collect()
}

/// Resolve a `return_value_test.value`, which may itself be a list.
pub fn resolve_condition_value(value: &Value, context: &Context) -> Result<ConditionValue> {
    let resolved = resolve(value, context)?;
    Ok(ConditionValue::from(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_context_variables() {
        assert!(is_context_variable(&Value::String(":name".into())));
        assert!(!is_context_variable(&Value::String("name".into())));
        assert!(!is_context_variable(&Value::Bool(true)));
    }

    #[test]
    fn missing_variable_is_required_input() {
        let context = Context::new();
        let err = resolve(&Value::String(":missing".into()), &context).unwrap_err();
        assert!(matches!(err, NodeError::RequiredInput(name) if name == "missing"));
    }

    #[test]
    fn resolves_present_variable() {
        let mut context = Context::new();
        context.insert("amount".into(), Value::from(42));
        let resolved = resolve(&Value::String(":amount".into()), &context).unwrap();
        assert_eq!(resolved, Value::from(42));
    }
}

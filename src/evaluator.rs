//! Single-step reduction.
//!
//! [`eval`] performs exactly one head reduction on a statement and returns the rewritten
//! value; the driver is responsible for stepping to a normal form. Failures are returned
//! as error tables so they flow through reduction like any other value.

use crate::{Error, MAX_EVAL_DEPTH};
use crate::ast::{Statement, Value};

const NOT_A_TABLE: &str = "Expected a table for lookup";
const KEY_NOT_FOUND: &str = "Could not find key in table";
const SUBSTITUTION_MISMATCH: &str = "Mismatch between substitution key and expression";

/// Exact-match lookup of `key` in `map`
pub fn lookup(map: &Value, key: &Value) -> Result<Value, Error> {
    let table = map
        .as_table()
        .ok_or_else(|| Error::lookup_error(NOT_A_TABLE, map, key))?;
    table
        .get(key)
        .cloned()
        .ok_or_else(|| Error::lookup_error(KEY_NOT_FOUND, map, key))
}

/// Fallback lookup treating `map` as a one-argument function of its placeholder key.
///
/// The body bound to the placeholder has every occurrence of that placeholder replaced by
/// `key`. Substitution is shallow: a statement body has its positional slots substituted,
/// nested statements and tables are left alone.
pub fn universal_lookup(map: &Value, key: &Value) -> Result<Value, Error> {
    let table = map
        .as_table()
        .ok_or_else(|| Error::lookup_error(NOT_A_TABLE, map, key))?;
    let (placeholder, body) = table
        .placeholder_entry()
        .ok_or_else(|| Error::lookup_error(KEY_NOT_FOUND, map, key))?;

    let substitute = |value: &Value| -> Result<Value, Error> {
        match value {
            Value::Placeholder(_) if value == placeholder => Ok(key.clone()),
            Value::Placeholder(_) => Err(Error::lookup_error(SUBSTITUTION_MISMATCH, map, key)),
            other => Ok(other.clone()),
        }
    };

    match body.as_statement() {
        Some(statement) => {
            let elements = statement
                .iter()
                .map(substitute)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::statement_exact(elements))
        }
        None => substitute(body),
    }
}

/// Perform one reduction step on `expr`
pub fn eval(expr: &Value) -> Value {
    eval_with_depth_tracking(expr, 0)
}

/// One reduction step, bounding the recursion through nested heads and keys
fn eval_with_depth_tracking(expr: &Value, depth: usize) -> Value {
    if depth >= MAX_EVAL_DEPTH {
        return Error::eval_error(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        ))
        .into();
    }

    match expr.as_statement() {
        None => expr.clone(),
        Some(statement) if statement.len() == 1 => {
            eval_with_depth_tracking(statement.head(), depth + 1)
        }
        Some(statement) => eval_application(&statement, depth),
    }
}

/// Reduce `(m k rest...)` by looking `k` up in `m` and re-applying the result to `rest`
fn eval_application(statement: &Statement<'_>, depth: usize) -> Value {
    let mut elements = statement.iter();
    let (Some(head), Some(argument)) = (elements.next(), elements.next()) else {
        return Value::statement_exact(statement.to_vec());
    };

    let map = eval_with_depth_tracking(head, depth + 1);
    if map.is_error() {
        return map;
    }
    let key = eval_with_depth_tracking(argument, depth + 1);
    if key.is_error() {
        return key;
    }

    // Statements are tables too, so a statement-valued head is looked up like any other
    let result = lookup(&map, &key).or_else(|err| {
        if map.is_table() {
            universal_lookup(&map, &key)
        } else {
            Err(err)
        }
    });

    match result {
        Err(err) => err.into(),
        Ok(value) if statement.len() == 2 => value,
        Ok(value) => Value::statement_exact(
            std::iter::once(value).chain(elements.cloned()).collect(),
        ),
    }
}

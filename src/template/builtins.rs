//! Intrinsic functions available in every template
//!
//! `and` and `or` short-circuit, so the evaluator handles them itself; the
//! rest take fully evaluated arguments.

use std::cmp::Ordering;

use crate::error::RenderError;
use crate::numeric;
use crate::value::{Value, ValueKind};

pub const INTRINSICS: &[&str] = &[
    "not", "and", "or", "eq", "ne", "lt", "le", "gt", "ge", "len", "print", "println",
];

pub fn is_intrinsic(name: &str) -> bool {
    INTRINSICS.contains(&name)
}

fn arity(name: &str, expected: usize, args: &[Value]) -> Result<(), RenderError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RenderError::WrongArgumentCount {
            function: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn equal(a: &Value, b: &Value) -> Result<bool, RenderError> {
    if let Some(ord) = numeric::compare(a, b) {
        return Ok(ord == Ordering::Equal);
    }
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => Ok(a == b),
        _ if a.kind() == b.kind() => Ok(a == b),
        _ => Err(RenderError::mismatch(a.kind().as_str(), b.kind())),
    }
}

fn order(a: &Value, b: &Value) -> Result<Ordering, RenderError> {
    if a.kind().is_numeric() && b.kind().is_numeric() {
        // NaN compares as unordered
        return numeric::compare(a, b).ok_or_else(|| RenderError::mismatch("ordered number", ValueKind::Float));
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::String(_), other) => Err(RenderError::mismatch("string", other.kind())),
        (x, _) if x.kind().is_numeric() => Err(RenderError::mismatch("number", b.kind())),
        (x, _) => Err(RenderError::mismatch("number or string", x.kind())),
    }
}

fn length(value: &Value) -> Result<usize, RenderError> {
    match value {
        Value::String(s) => Ok(s.len()),
        Value::Sequence(items) => Ok(items.len()),
        Value::Mapping(map) => Ok(map.len()),
        other => Err(RenderError::mismatch("string, sequence or mapping", other.kind())),
    }
}

/// Concatenate like Go's `fmt.Sprint`: a space between operands when neither is a string
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, Value::String(_));
        if i > 0 && !is_string && !matches!(args[i - 1], Value::String(_)) {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}

fn sprintln(args: &[Value]) -> String {
    let mut out = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
    out.push('\n');
    out
}

/// Call an intrinsic other than `and`/`or`
pub fn call(name: &str, args: &[Value]) -> Result<Value, RenderError> {
    match name {
        "not" => {
            arity(name, 1, args)?;
            Ok(Value::Bool(!args[0].is_truthy()))
        }
        "eq" => {
            // eq a b c is true when a equals any of the rest
            if args.len() < 2 {
                return arity(name, 2, args).map(|_| Value::Null);
            }
            for other in &args[1..] {
                if equal(&args[0], other)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "ne" => {
            arity(name, 2, args)?;
            Ok(Value::Bool(!equal(&args[0], &args[1])?))
        }
        "lt" | "le" | "gt" | "ge" => {
            arity(name, 2, args)?;
            let ord = order(&args[0], &args[1])?;
            Ok(Value::Bool(match name {
                "lt" => ord == Ordering::Less,
                "le" => ord != Ordering::Greater,
                "gt" => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        "len" => {
            arity(name, 1, args)?;
            let n = length(&args[0])?;
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "print" => Ok(Value::String(sprint(args))),
        "println" => Ok(Value::String(sprintln(args))),
        other => Err(RenderError::syntax(0..0, format!("function {:?} not defined", other))),
    }
}

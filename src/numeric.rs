//! Numeric coercion and arithmetic over inventory values
//!
//! Operands are classified into integer (`Int`/`UInt`) or floating (`Float`)
//! numbers and combined according to a fixed promotion table:
//!
//! | left \ right | Int   | UInt  | Float |
//! |--------------|-------|-------|-------|
//! | Int          | Int   | Int   | Float |
//! | UInt         | Int   | UInt* | Float |
//! | Float        | Float | Float | Float |
//!
//! `*` an unsigned result that goes negative is returned as `Int` when it
//! fits. Integer results that fit neither kind fail with
//! [`RenderError::ArithmeticOverflow`] instead of wrapping.
//!
//! Template call order: for `op first second` the *second* argument is the
//! left-hand operand. With a pipeline, `{{ 6 | subtract 2 }}` calls
//! `subtract 2 6` and evaluates `6 - 2`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::RenderError;
use crate::value::Value;

/// The arithmetic template functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithOp {
    pub const ALL: [ArithOp; 5] = [
        ArithOp::Add,
        ArithOp::Subtract,
        ArithOp::Multiply,
        ArithOp::Divide,
        ArithOp::Modulo,
    ];

    /// Template function name
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Subtract => "subtract",
            ArithOp::Multiply => "multiply",
            ArithOp::Divide => "divide",
            ArithOp::Modulo => "modulo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument position in the template call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandPosition {
    First,
    Second,
}

impl fmt::Display for OperandPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandPosition::First => f.write_str("first"),
            OperandPosition::Second => f.write_str("second"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::UInt(n) => Some(Number::UInt(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            _ => None,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Exact widening of either integer kind; `None` for floats
    fn as_i128(self) -> Option<i128> {
        match self {
            Number::Int(n) => Some(n.into()),
            Number::UInt(n) => Some(n.into()),
            Number::Float(_) => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::UInt(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

fn classify(op: ArithOp, value: &Value, position: OperandPosition) -> Result<Number, RenderError> {
    Number::from_value(value).ok_or(RenderError::UnsupportedOperand {
        op,
        kind: value.kind(),
        position,
    })
}

/// Apply `op` to two template arguments in call order
pub fn apply(op: ArithOp, first: &Value, second: &Value) -> Result<Value, RenderError> {
    let right = classify(op, first, OperandPosition::First)?;
    let left = classify(op, second, OperandPosition::Second)?;

    if op == ArithOp::Modulo {
        let float_position = if right.is_float() {
            Some(OperandPosition::First)
        } else if left.is_float() {
            Some(OperandPosition::Second)
        } else {
            None
        };
        if let Some(position) = float_position {
            return Err(RenderError::UnsupportedOperand {
                op,
                kind: crate::value::ValueKind::Float,
                position,
            });
        }
    }

    match (left.as_i128(), right.as_i128()) {
        (Some(l), Some(r)) => {
            let unsigned = matches!((left, right), (Number::UInt(_), Number::UInt(_)));
            integer_op(op, l, r, unsigned)
        }
        _ => Ok(Value::Float(float_op(op, left.as_f64(), right.as_f64()))),
    }
}

fn integer_op(op: ArithOp, left: i128, right: i128, unsigned: bool) -> Result<Value, RenderError> {
    let wide = match op {
        ArithOp::Add => left.checked_add(right),
        ArithOp::Subtract => left.checked_sub(right),
        ArithOp::Multiply => left.checked_mul(right),
        ArithOp::Divide | ArithOp::Modulo if right == 0 => {
            return Err(RenderError::DivideByZero(op))
        }
        ArithOp::Divide => left.checked_div(right),
        ArithOp::Modulo => left.checked_rem(right),
    }
    .ok_or(RenderError::ArithmeticOverflow(op))?;

    if unsigned {
        if let Ok(n) = u64::try_from(wide) {
            return Ok(Value::UInt(n));
        }
    }
    i64::try_from(wide)
        .map(Value::Int)
        .map_err(|_| RenderError::ArithmeticOverflow(op))
}

fn float_op(op: ArithOp, left: f64, right: f64) -> f64 {
    match op {
        ArithOp::Add => left + right,
        ArithOp::Subtract => left - right,
        ArithOp::Multiply => left * right,
        ArithOp::Divide => left / right,
        // rejected before promotion
        ArithOp::Modulo => left % right,
    }
}

pub fn add(first: &Value, second: &Value) -> Result<Value, RenderError> {
    apply(ArithOp::Add, first, second)
}

pub fn subtract(first: &Value, second: &Value) -> Result<Value, RenderError> {
    apply(ArithOp::Subtract, first, second)
}

pub fn multiply(first: &Value, second: &Value) -> Result<Value, RenderError> {
    apply(ArithOp::Multiply, first, second)
}

pub fn divide(first: &Value, second: &Value) -> Result<Value, RenderError> {
    apply(ArithOp::Divide, first, second)
}

pub fn modulo(first: &Value, second: &Value) -> Result<Value, RenderError> {
    apply(ArithOp::Modulo, first, second)
}

/// Order two values numerically, across numeric kinds
///
/// Returns `None` if either value is not a number or a float is NaN.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let (a, b) = (Number::from_value(a)?, Number::from_value(b)?);
    match (a.as_i128(), b.as_i128()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

//! Registry of the template functions available to `.gg` sources

use tracing::trace;

use crate::env::{self, Environment};
use crate::error::RenderError;
use crate::inventory::Inventory;
use crate::numeric::{self, ArithOp};
use crate::template::FunctionTable;
use crate::value::Value;
use crate::yaml;

use super::indent::{indent_with_spaces, MAX_INDENT};

/// Kind constraint on a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    String,
    /// Non-negative integer (`int` or `uint`)
    Count,
    /// Any numeric kind; checked by the coercion engine
    Number,
    /// Integer kinds only; checked by the coercion engine
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// Kind of value a function returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Any,
    String,
    /// Numeric kind chosen by promotion of the operands
    Number,
    Integer,
}

/// Name, parameters and result of a template function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub params: &'static [Param],
    pub returns: ReturnKind,
    /// Whether a call can fail for reasons other than bad arguments
    pub fallible: bool,
}

impl FunctionSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

const KEY: &[Param] = &[Param {
    name: "key",
    kind: ParamKind::String,
}];

const NUMBERS: &[Param] = &[
    Param {
        name: "b",
        kind: ParamKind::Number,
    },
    Param {
        name: "a",
        kind: ParamKind::Number,
    },
];

const INTEGERS: &[Param] = &[
    Param {
        name: "b",
        kind: ParamKind::Integer,
    },
    Param {
        name: "a",
        kind: ParamKind::Integer,
    },
];

/// Every function the registry provides; names are part of the template contract
pub const SIGNATURES: &[FunctionSignature] = &[
    FunctionSignature {
        name: "var",
        params: KEY,
        returns: ReturnKind::Any,
        fallible: true,
    },
    FunctionSignature {
        name: "getenv",
        params: KEY,
        returns: ReturnKind::String,
        fallible: false,
    },
    FunctionSignature {
        name: "getenvRequired",
        params: KEY,
        returns: ReturnKind::String,
        fallible: true,
    },
    FunctionSignature {
        name: "yaml",
        params: &[Param {
            name: "value",
            kind: ParamKind::Any,
        }],
        returns: ReturnKind::String,
        fallible: true,
    },
    FunctionSignature {
        name: "indentWithSpaces",
        params: &[
            Param {
                name: "count",
                kind: ParamKind::Count,
            },
            Param {
                name: "text",
                kind: ParamKind::String,
            },
        ],
        returns: ReturnKind::String,
        fallible: true,
    },
    FunctionSignature {
        name: "add",
        params: NUMBERS,
        returns: ReturnKind::Number,
        fallible: true,
    },
    FunctionSignature {
        name: "subtract",
        params: NUMBERS,
        returns: ReturnKind::Number,
        fallible: true,
    },
    FunctionSignature {
        name: "multiply",
        params: NUMBERS,
        returns: ReturnKind::Number,
        fallible: true,
    },
    FunctionSignature {
        name: "divide",
        params: NUMBERS,
        returns: ReturnKind::Number,
        fallible: true,
    },
    FunctionSignature {
        name: "modulo",
        params: INTEGERS,
        returns: ReturnKind::Integer,
        fallible: true,
    },
];

/// Template functions bound to one inventory and one environment
///
/// Built per render call; it only borrows its inputs.
#[derive(Clone, Copy)]
pub struct FunctionRegistry<'a> {
    inventory: Inventory<'a>,
    env: &'a dyn Environment,
}

impl<'a> FunctionRegistry<'a> {
    pub fn new(inventory: Inventory<'a>, env: &'a dyn Environment) -> Self {
        Self { inventory, env }
    }

    /// Look up the signature of a registered function
    pub fn signature(name: &str) -> Option<&'static FunctionSignature> {
        SIGNATURES.iter().find(|s| s.name == name)
    }

    /// Names of all registered functions
    pub fn names() -> impl Iterator<Item = &'static str> {
        SIGNATURES.iter().map(|s| s.name)
    }

    /// `var`: strict top-level inventory lookup
    pub fn var(&self, key: &str) -> Result<Value, RenderError> {
        self.inventory.lookup(key).cloned()
    }

    pub fn getenv(&self, key: &str) -> String {
        env::getenv(self.env, key)
    }

    pub fn getenv_required(&self, key: &str) -> Result<String, RenderError> {
        env::getenv_required(self.env, key)
    }

    pub fn yaml(&self, value: &Value) -> Result<String, RenderError> {
        yaml::to_yaml(value)
    }

    pub fn indent_with_spaces(&self, count: usize, text: &str) -> Result<String, RenderError> {
        indent_with_spaces(count, text)
    }

    /// Arithmetic in template call order (see [`crate::numeric`])
    pub fn arithmetic(&self, op: ArithOp, first: &Value, second: &Value) -> Result<Value, RenderError> {
        numeric::apply(op, first, second)
    }
}

fn count_arg(value: &Value) -> Result<usize, RenderError> {
    let count = match value {
        Value::Int(n) => u64::try_from(*n).ok(),
        Value::UInt(n) => Some(*n),
        _ => None,
    };
    let count = count.ok_or_else(|| RenderError::mismatch("non-negative integer", value.kind()))?;
    usize::try_from(count)
        .ok()
        .filter(|&n| n <= MAX_INDENT)
        .ok_or(RenderError::IndentTooWide {
            count,
            max: MAX_INDENT,
        })
}

fn not_defined(name: &str) -> RenderError {
    RenderError::syntax(0..0, format!("function {:?} not defined", name))
}

impl FunctionTable for FunctionRegistry<'_> {
    fn contains(&self, name: &str) -> bool {
        Self::signature(name).is_some()
    }

    fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, RenderError> {
        let Some(signature) = Self::signature(name) else {
            return Err(not_defined(name));
        };
        if args.len() != signature.arity() {
            return Err(RenderError::WrongArgumentCount {
                function: name.to_string(),
                expected: signature.arity(),
                found: args.len(),
            });
        }
        trace!(function = name, args = args.len(), "calling template function");

        match name {
            "var" => self.var(args[0].as_str()?),
            "getenv" => Ok(Value::String(self.getenv(args[0].as_str()?))),
            "getenvRequired" => self.getenv_required(args[0].as_str()?).map(Value::String),
            "yaml" => self.yaml(&args[0]).map(Value::String),
            "indentWithSpaces" => {
                let count = count_arg(&args[0])?;
                self.indent_with_spaces(count, args[1].as_str()?)
                    .map(Value::String)
            }
            other => match ArithOp::from_name(other) {
                Some(op) => self.arithmetic(op, &args[0], &args[1]),
                None => Err(not_defined(other)),
            },
        }
    }
}

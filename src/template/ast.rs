//! AST types for parsed templates

use crate::error::Span;
use crate::value::Value;

/// A node with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A piece of template output
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output
    Text(String),
    /// `{{ pipeline }}`: printed unless it declares or assigns a variable
    Action(Spanned<Pipeline>),
    /// `{{ if }}`; `else if` chains are nested in `otherwise`
    If {
        cond: Spanned<Pipeline>,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        pipeline: Spanned<Pipeline>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        pipeline: Spanned<Pipeline>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Commands joined by `|`, with an optional variable binding in front
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub binding: Option<VarBinding>,
    pub commands: Vec<Spanned<Command>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarBinding {
    /// `$x :=` or, in `range`, `$i, $e :=`
    Declare(Vec<String>),
    /// `$x =`
    Assign(String),
}

/// One pipeline stage: a function with its arguments, or a single operand
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operands: Vec<Spanned<Operand>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    /// `.A.B` relative to dot
    Field(Vec<String>),
    /// `$name.A.B`
    Variable { name: String, fields: Vec<String> },
    Function(String),
    Literal(Value),
    /// `(pipeline).A.B`
    Pipeline {
        pipeline: Box<Pipeline>,
        fields: Vec<String>,
    },
}

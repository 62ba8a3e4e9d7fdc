//! Text templates with Go template syntax
//!
//! Only the subset used by `.gg` sources is supported: substitution with
//! pipelines, field chains, variables, `if`/`range`/`with` blocks, comments
//! and trim markers. Missing keys are always errors.

pub mod ast;
mod builtins;
mod eval;
mod grammar;
pub mod lexer;
mod scanner;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RenderError, Span, TemplateSyntaxError};
use crate::value::Value;

use ast::{Node, Operand, Pipeline, VarBinding};

pub use builtins::INTRINSICS;

/// Left and right action delimiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelimiterPair {
    pub left: String,
    pub right: String,
}

impl Default for DelimiterPair {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl DelimiterPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Functions a template can call besides the intrinsics
pub trait FunctionTable {
    fn contains(&self, name: &str) -> bool;

    /// Call `name` with fully evaluated arguments, piped value last
    fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, RenderError>;
}

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str, delimiters: &DelimiterPair) -> Result<Self, TemplateSyntaxError> {
        let nodes = grammar::parse(source, delimiters)?;
        debug!(nodes = nodes.len(), "parsed template");
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Check that every function exists and every variable is declared before use
    pub fn validate<F: FunctionTable + ?Sized>(&self, functions: &F) -> Result<(), TemplateSyntaxError> {
        let mut checker = Checker {
            functions,
            scope: Vec::new(),
        };
        checker.nodes(&self.nodes)
    }

    /// Render against `root`, which is both `.` and `$`
    pub fn execute<F: FunctionTable + ?Sized>(&self, root: &Value, functions: &F) -> Result<String, RenderError> {
        eval::Evaluator::new(functions, root).execute(&self.nodes)
    }
}

/// Static checks run before evaluation
struct Checker<'f, F: ?Sized> {
    functions: &'f F,
    scope: Vec<String>,
}

impl<F: FunctionTable + ?Sized> Checker<'_, F> {
    fn nodes(&mut self, nodes: &[Node]) -> Result<(), TemplateSyntaxError> {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Action(p) => self.pipeline(&p.node, false)?,
                Node::If {
                    cond: head,
                    then: body,
                    otherwise,
                }
                | Node::With {
                    pipeline: head,
                    body,
                    otherwise,
                } => {
                    let mark = self.scope.len();
                    self.pipeline(&head.node, false)?;
                    self.block(body)?;
                    self.block(otherwise)?;
                    self.scope.truncate(mark);
                }
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let mark = self.scope.len();
                    self.pipeline(&pipeline.node, true)?;
                    self.block(body)?;
                    self.block(otherwise)?;
                    self.scope.truncate(mark);
                }
            }
        }
        Ok(())
    }

    fn block(&mut self, nodes: &[Node]) -> Result<(), TemplateSyntaxError> {
        let mark = self.scope.len();
        self.nodes(nodes)?;
        self.scope.truncate(mark);
        Ok(())
    }

    fn pipeline(&mut self, pipeline: &Pipeline, in_range: bool) -> Result<(), TemplateSyntaxError> {
        for (stage, command) in pipeline.commands.iter().enumerate() {
            let operands = &command.node.operands;
            let head_is_function = matches!(
                operands.first().map(|o| &o.node),
                Some(Operand::Function(_))
            );
            if !head_is_function && stage > 0 {
                return Err(TemplateSyntaxError::new(
                    command.span.clone(),
                    format!("non executable command in pipeline stage {}", stage + 1),
                ));
            }
            if !head_is_function && operands.len() > 1 {
                return Err(TemplateSyntaxError::new(
                    command.span.clone(),
                    "can't give argument to non-function",
                ));
            }
            for operand in operands {
                match &operand.node {
                    Operand::Function(name) => {
                        if !self.functions.contains(name) && !builtins::is_intrinsic(name) {
                            return Err(TemplateSyntaxError::new(
                                operand.span.clone(),
                                format!("function {:?} not defined", name),
                            ));
                        }
                    }
                    Operand::Variable { name, .. } => self.variable(name, &operand.span)?,
                    Operand::Pipeline { pipeline, .. } => self.pipeline(pipeline, false)?,
                    _ => {}
                }
            }
        }

        let span = pipeline
            .commands
            .first()
            .map(|c| c.span.clone())
            .unwrap_or_default();
        match &pipeline.binding {
            None => {}
            Some(VarBinding::Declare(names)) => {
                if names.len() > 1 && !in_range {
                    return Err(TemplateSyntaxError::new(span, "too many declarations"));
                }
                self.scope.extend(names.iter().cloned());
            }
            Some(VarBinding::Assign(name)) => {
                if in_range {
                    return Err(TemplateSyntaxError::new(
                        span,
                        "range can only initialize variables",
                    ));
                }
                self.variable(name, &span)?;
            }
        }
        Ok(())
    }

    fn variable(&self, name: &str, span: &Span) -> Result<(), TemplateSyntaxError> {
        if name == "$" || self.scope.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(TemplateSyntaxError::new(
                span.clone(),
                format!("undefined variable {:?}", name),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFunctions;

    impl FunctionTable for NoFunctions {
        fn contains(&self, _name: &str) -> bool {
            false
        }

        fn call(&self, name: &str, _args: Vec<Value>) -> Result<Value, RenderError> {
            Err(RenderError::syntax(0..0, format!("function {:?} not defined", name)))
        }
    }

    fn validate(source: &str) -> Result<(), TemplateSyntaxError> {
        Template::parse(source, &DelimiterPair::default())?.validate(&NoFunctions)
    }

    #[test]
    fn test_delimiter_pair_serde_names() {
        let pair: DelimiterPair = serde_json::from_str(r#"{"Left":"[[","Right":"]]"}"#).unwrap();
        assert_eq!(pair, DelimiterPair::new("[[", "]]"));
    }

    #[test]
    fn test_unknown_function() {
        let err = validate(r#"{{ printf "%d" 1 }}"#).unwrap_err();
        assert_eq!(err.message, r#"function "printf" not defined"#);
        assert_eq!(err.span, 3..9);
    }

    #[test]
    fn test_intrinsics_are_defined() {
        assert!(validate("{{ if and (eq 1 1) (not false) }}{{ len \"x\" }}{{ end }}").is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let err = validate("{{ $x }}").unwrap_err();
        assert_eq!(err.message, r#"undefined variable "$x""#);
        assert!(validate("{{ $x := 1 }}{{ $x }}").is_ok());
    }

    #[test]
    fn test_block_scope_ends_at_end() {
        assert!(validate("{{ range $e := . }}{{ $e }}{{ end }}").is_ok());
        assert!(validate("{{ range $e := . }}{{ end }}{{ $e }}").is_err());
        assert!(validate("{{ if true }}{{ $y := 1 }}{{ end }}{{ $y }}").is_err());
    }

    #[test]
    fn test_non_function_stage() {
        let err = validate("{{ 1 | 2 }}").unwrap_err();
        assert_eq!(err.message, "non executable command in pipeline stage 2");
        assert!(validate("{{ 1 2 }}").is_err());
    }

    #[test]
    fn test_two_declarations_outside_range() {
        assert!(validate("{{ $a, $b := 1 }}").is_err());
    }
}

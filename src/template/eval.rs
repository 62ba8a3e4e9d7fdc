//! Tree-walking evaluator
//!
//! Missing keys are always errors. Output goes into a buffer that is only
//! returned when the whole template succeeds.

use crate::error::{RenderError, Span};
use crate::value::Value;

use super::ast::{Command, Node, Operand, Pipeline, Spanned, VarBinding};
use super::builtins;
use super::FunctionTable;

/// Follow a field chain through nested mappings
fn walk_fields<'v>(mut value: &'v Value, fields: &[String]) -> Result<&'v Value, RenderError> {
    for key in fields {
        value = match value {
            Value::Mapping(map) => map
                .get(key)
                .ok_or_else(|| RenderError::MissingKey(key.clone()))?,
            other => return Err(RenderError::mismatch("mapping", other.kind())),
        };
    }
    Ok(value)
}

pub struct Evaluator<'t, F: FunctionTable + ?Sized> {
    functions: &'t F,
    root: &'t Value,
    /// Declared variables, innermost last; `$` is the root and is not stored
    vars: Vec<(String, Value)>,
}

impl<'t, F: FunctionTable + ?Sized> Evaluator<'t, F> {
    pub fn new(functions: &'t F, root: &'t Value) -> Self {
        Self {
            functions,
            root,
            vars: Vec::new(),
        }
    }

    pub fn execute(mut self, nodes: &[Node]) -> Result<String, RenderError> {
        let mut out = String::new();
        let root = self.root;
        self.nodes(nodes, root, &mut out)?;
        Ok(out)
    }

    fn nodes(&mut self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.pipeline(&pipeline.node, dot)?;
                    if pipeline.node.binding.is_none() {
                        out.push_str(&value.to_string());
                    }
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let mark = self.vars.len();
                    let branch = if self.pipeline(&cond.node, dot)?.is_truthy() {
                        then
                    } else {
                        otherwise
                    };
                    self.nodes(branch, dot, out)?;
                    self.vars.truncate(mark);
                }
                Node::With {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let mark = self.vars.len();
                    let value = self.pipeline(&pipeline.node, dot)?;
                    if value.is_truthy() {
                        self.nodes(body, &value, out)?;
                    } else {
                        self.nodes(otherwise, dot, out)?;
                    }
                    self.vars.truncate(mark);
                }
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => self.range(pipeline, body, otherwise, dot, out)?,
            }
        }
        Ok(())
    }

    fn range(
        &mut self,
        pipeline: &Spanned<Pipeline>,
        body: &[Node],
        otherwise: &[Node],
        dot: &Value,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let value = self.pipeline_value(&pipeline.node, dot)?;
        let names: &[String] = match &pipeline.node.binding {
            Some(VarBinding::Declare(names)) => names,
            _ => &[],
        };

        let items: Vec<(Value, &Value)> = match &value {
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect(),
            Value::Mapping(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                entries
                    .into_iter()
                    .map(|(key, item)| (Value::String(key.clone()), item))
                    .collect()
            }
            Value::Null => Vec::new(),
            other => return Err(RenderError::mismatch("sequence or mapping", other.kind())),
        };

        if items.is_empty() {
            return self.nodes(otherwise, dot, out);
        }

        for (key, item) in items {
            let mark = self.vars.len();
            match names {
                [elem] => self.vars.push((elem.clone(), item.clone())),
                [index, elem] => {
                    self.vars.push((index.clone(), key));
                    self.vars.push((elem.clone(), item.clone()));
                }
                _ => {}
            }
            self.nodes(body, item, out)?;
            self.vars.truncate(mark);
        }
        Ok(())
    }

    /// Evaluate a pipeline and apply its variable binding
    fn pipeline(&mut self, pipeline: &Pipeline, dot: &Value) -> Result<Value, RenderError> {
        let value = self.pipeline_value(pipeline, dot)?;
        match &pipeline.binding {
            None => {}
            Some(VarBinding::Declare(names)) => {
                if let Some(name) = names.last() {
                    self.vars.push((name.clone(), value.clone()));
                }
            }
            Some(VarBinding::Assign(name)) => {
                let span = pipeline
                    .commands
                    .first()
                    .map(|c| c.span.clone())
                    .unwrap_or_default();
                let slot = self
                    .vars
                    .iter_mut()
                    .rev()
                    .find(|(n, _)| n == name)
                    .ok_or_else(|| undefined_variable(name, span))?;
                slot.1 = value.clone();
            }
        }
        Ok(value)
    }

    /// Run the commands of a pipeline, feeding each result into the next
    fn pipeline_value(&mut self, pipeline: &Pipeline, dot: &Value) -> Result<Value, RenderError> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, dot, piped)?);
        }
        Ok(piped.unwrap_or_default())
    }

    fn command(
        &mut self,
        command: &Spanned<Command>,
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, RenderError> {
        let Some((head, args)) = command.node.operands.split_first() else {
            return Ok(Value::Null);
        };
        match &head.node {
            Operand::Function(name) => self.call(name, &head.span, args, dot, piped),
            _ if !args.is_empty() || piped.is_some() => Err(RenderError::syntax(
                command.span.clone(),
                "can't give argument to non-function",
            )),
            _ => self.operand(head, dot),
        }
    }

    fn call(
        &mut self,
        name: &str,
        span: &Span,
        args: &[Spanned<Operand>],
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, RenderError> {
        if name == "and" || name == "or" {
            return self.short_circuit(name, args, dot, piped);
        }

        let mut values = args
            .iter()
            .map(|arg| self.operand(arg, dot))
            .collect::<Result<Vec<_>, _>>()?;
        values.extend(piped);

        if self.functions.contains(name) {
            self.functions.call(name, values)
        } else if builtins::is_intrinsic(name) {
            builtins::call(name, &values)
        } else {
            Err(RenderError::syntax(
                span.clone(),
                format!("function {:?} not defined", name),
            ))
        }
    }

    /// `and` returns the first falsy argument, `or` the first truthy one,
    /// otherwise the last argument; later arguments are not evaluated
    fn short_circuit(
        &mut self,
        name: &str,
        args: &[Spanned<Operand>],
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, RenderError> {
        let decisive = name == "or";
        let found = args.len() + usize::from(piped.is_some());
        if found == 0 {
            return Err(RenderError::WrongArgumentCount {
                function: name.to_string(),
                expected: 1,
                found,
            });
        }

        let mut last = Value::Null;
        for arg in args {
            let value = self.operand(arg, dot)?;
            if value.is_truthy() == decisive {
                return Ok(value);
            }
            last = value;
        }
        Ok(piped.unwrap_or(last))
    }

    fn variable(&self, name: &str, span: &Span) -> Result<&Value, RenderError> {
        if name == "$" {
            return Ok(self.root);
        }
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
            .ok_or_else(|| undefined_variable(name, span.clone()))
    }

    fn operand(&mut self, operand: &Spanned<Operand>, dot: &Value) -> Result<Value, RenderError> {
        match &operand.node {
            Operand::Dot => Ok(dot.clone()),
            Operand::Field(fields) => walk_fields(dot, fields).cloned(),
            Operand::Variable { name, fields } => {
                walk_fields(self.variable(name, &operand.span)?, fields).cloned()
            }
            Operand::Literal(value) => Ok(value.clone()),
            // A bare function name as an argument is called without arguments
            Operand::Function(name) => self.call(name, &operand.span, &[], dot, None),
            Operand::Pipeline { pipeline, fields } => {
                let value = self.pipeline(pipeline, dot)?;
                walk_fields(&value, fields).cloned()
            }
        }
    }
}

fn undefined_variable(name: &str, span: Span) -> RenderError {
    RenderError::syntax(span, format!("undefined variable {:?}", name))
}

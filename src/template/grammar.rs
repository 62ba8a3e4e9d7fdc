//! Template parser using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::TemplateSyntaxError;
use crate::value::Value;

use super::ast::*;
use super::lexer::{lex, TemplateToken, Token};
use super::DelimiterPair;

type Extra<'a> = extra::Err<Rich<'a, TemplateToken>>;

/// Parse template source into a node list
pub fn parse(source: &str, delimiters: &DelimiterPair) -> Result<Vec<Node>, TemplateSyntaxError> {
    let len = source.len();
    let tokens = lex(source, delimiters)?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(TemplateSyntaxError::from)
                .unwrap_or_else(|| TemplateSyntaxError::new(0..len, "invalid template"))
        })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Match a token inside an action
fn kw<'a, I>(tok: Token) -> impl Parser<'a, I, TemplateToken, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = TemplateToken, Span = SimpleSpan>,
{
    just(TemplateToken::Action(tok))
}

fn pipeline_parser<'a, I>() -> impl Parser<'a, I, Pipeline, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = TemplateToken, Span = SimpleSpan>,
{
    recursive(|pipeline| {
        let field_chain = select! {
            TemplateToken::Action(Token::Field(names)) => names,
        };

        let simple = select! {
            TemplateToken::Action(Token::Dot) => Operand::Dot,
            TemplateToken::Action(Token::Field(names)) => Operand::Field(names),
            TemplateToken::Action(Token::Variable(var)) => Operand::Variable {
                name: var.name,
                fields: var.fields,
            },
            TemplateToken::Action(Token::Ident(name)) => Operand::Function(name),
            TemplateToken::Action(Token::Nil) => Operand::Literal(Value::Null),
            TemplateToken::Action(Token::Bool(b)) => Operand::Literal(Value::Bool(b)),
            TemplateToken::Action(Token::Int(n)) => Operand::Literal(Value::from(n)),
            TemplateToken::Action(Token::Float(n)) => Operand::Literal(Value::Float(n)),
            TemplateToken::Action(Token::String(s)) => Operand::Literal(Value::String(s)),
        };

        let parenthesised = pipeline
            .delimited_by(kw(Token::ParenOpen), kw(Token::ParenClose))
            .then(field_chain.or_not())
            .map(|(pipeline, fields): (Pipeline, Option<Vec<String>>)| Operand::Pipeline {
                pipeline: Box::new(pipeline),
                fields: fields.unwrap_or_default(),
            });

        let operand = choice((parenthesised, simple))
            .map_with(|op, e| Spanned::new(op, span_range(&e.span())));

        let command = operand
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|operands| Command { operands })
            .map_with(|cmd, e| Spanned::new(cmd, span_range(&e.span())));

        // Only plain `$name` can be bound, never `$name.Field`
        let var_name = select! {
            TemplateToken::Action(Token::Variable(var)) if var.fields.is_empty() => var.name,
        };

        let binding = choice((
            var_name
                .clone()
                .separated_by(kw(Token::Comma))
                .at_least(1)
                .at_most(2)
                .collect::<Vec<_>>()
                .then_ignore(kw(Token::Declare))
                .map(VarBinding::Declare),
            var_name
                .then_ignore(kw(Token::Assign))
                .map(VarBinding::Assign),
        ));

        binding
            .or_not()
            .then(
                command
                    .separated_by(kw(Token::Pipe))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .map(|(binding, commands)| Pipeline { binding, commands })
    })
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Vec<Node>, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = TemplateToken, Span = SimpleSpan>,
{
    let open = just(TemplateToken::Open);
    let close = just(TemplateToken::Close);

    let pipeline = pipeline_parser().map_with(|p, e| Spanned::new(p, span_range(&e.span())));

    let end_action = open.clone().then(kw(Token::End)).then(close.clone());
    let else_action = open.clone().then(kw(Token::Else)).then(close.clone());

    let nodes = recursive(|nodes| {
        let text = select! {
            TemplateToken::Text(s) => Some(Node::Text(s)),
        };

        let action = pipeline
            .clone()
            .delimited_by(open.clone(), close.clone())
            .map(|p| Some(Node::Action(p)));

        let otherwise = else_action
            .clone()
            .ignore_then(nodes.clone())
            .or_not()
            .map(Option::unwrap_or_default);

        let else_if = open
            .clone()
            .ignore_then(kw(Token::Else))
            .ignore_then(kw(Token::If))
            .ignore_then(pipeline.clone())
            .then_ignore(close.clone())
            .then(nodes.clone());

        let if_block = open
            .clone()
            .ignore_then(kw(Token::If))
            .ignore_then(pipeline.clone())
            .then_ignore(close.clone())
            .then(nodes.clone())
            .then(else_if.repeated().collect::<Vec<_>>())
            .then(otherwise.clone())
            .then_ignore(end_action.clone())
            .map(|(((cond, then), else_ifs), otherwise)| {
                // Fold `else if` chains from the innermost outwards
                let otherwise = else_ifs
                    .into_iter()
                    .rev()
                    .fold(otherwise, |otherwise, (cond, then)| {
                        vec![Node::If {
                            cond,
                            then,
                            otherwise,
                        }]
                    });
                Some(Node::If {
                    cond,
                    then,
                    otherwise,
                })
            })
            .boxed();

        let range_block = open
            .clone()
            .ignore_then(kw(Token::Range))
            .ignore_then(pipeline.clone())
            .then_ignore(close.clone())
            .then(nodes.clone())
            .then(otherwise.clone())
            .then_ignore(end_action.clone())
            .map(|((pipeline, body), otherwise)| {
                Some(Node::Range {
                    pipeline,
                    body,
                    otherwise,
                })
            })
            .boxed();

        let with_block = open
            .clone()
            .ignore_then(kw(Token::With))
            .ignore_then(pipeline.clone())
            .then_ignore(close.clone())
            .then(nodes.clone())
            .then(otherwise)
            .then_ignore(end_action.clone())
            .map(|((pipeline, body), otherwise)| {
                Some(Node::With {
                    pipeline,
                    body,
                    otherwise,
                })
            })
            .boxed();

        choice((text, if_block, range_block, with_block, action))
            .repeated()
            .collect::<Vec<Option<Node>>>()
            .map(|nodes| nodes.into_iter().flatten().collect::<Vec<Node>>())
            .boxed()
    });

    nodes.then_ignore(end())
}

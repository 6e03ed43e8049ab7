// Template parser, a state machine driven by the lexer's tokens

use std::mem;
use std::str::FromStr;

use super::ast::{Ast, Expression, Modifier, Operator, Part, VarRef};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Raw,
    MaybeOp,
    Expr,
    AfterVar,
    Length,
}

pub struct TemplateParser<'a> {
    tokens: Lexer<'a>,
    state: State,
    parts: Vec<Part>,
    literal: Vec<u8>,
    operator: Operator,
    vars: Vec<VarRef>,
    path: Vec<String>,
    modifier: Modifier,
    /// Where the current prefix length starts
    length_offset: usize,
}

impl<'a> TemplateParser<'a> {
    pub fn parse(template: &'a str) -> Result<Ast, ParseError> {
        let parser = Self {
            tokens: Lexer::new(template),
            state: State::Raw,
            parts: Vec::new(),
            literal: Vec::new(),
            operator: Operator::Simple,
            vars: Vec::new(),
            path: Vec::new(),
            modifier: Modifier::None,
            length_offset: 0,
        };

        match parser.parse_template() {
            Ok(ast) => {
                tracing::debug!(
                    template,
                    parts = ast.parts().len(),
                    variables = ast.variables().len(),
                    "parsed template"
                );
                Ok(ast)
            }
            Err(err) => {
                tracing::debug!(template, offset = err.offset, error = %err.kind, "invalid template");
                Err(err)
            }
        }
    }

    fn parse_template(mut self) -> Result<Ast, ParseError> {
        while let Some(token) = self.tokens.next() {
            tracing::trace!(state = ?self.state, token = %token, offset = token.offset);
            if let TokenKind::Error(kind) = token.kind {
                return Err(ParseError::new(ParseErrorKind::Lex(kind), token.offset));
            }
            if let Some(ast) = self.step(token)? {
                return Ok(ast);
            }
        }
        unreachable!("the lexer always ends with an EOF or error token")
    }

    fn step(&mut self, token: Token<'a>) -> Result<Option<Ast>, ParseError> {
        match self.state {
            State::Raw => return Ok(self.parse_raw(token)),
            State::MaybeOp => {
                if let TokenKind::Operator(op) = token.kind {
                    self.operator = op;
                    self.state = State::Expr;
                } else {
                    self.parse_expr(token)?;
                }
            }
            State::Expr => self.parse_expr(token)?,
            State::AfterVar => self.parse_after_var(token)?,
            State::Length => self.parse_length(token),
        }
        Ok(None)
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(Part::Literal(mem::take(&mut self.literal)));
        }
    }

    fn close_var(&mut self) {
        let path = mem::take(&mut self.path);
        let modifier = mem::take(&mut self.modifier);
        self.vars.push(VarRef { path, modifier });
    }

    fn unexpected(&self, token: &Token<'_>) -> ! {
        unreachable!(
            "parser state {:?} cannot accept token {} at offset {}",
            self.state, token, token.offset
        )
    }

    fn parse_raw(&mut self, token: Token<'a>) -> Option<Ast> {
        match &token.kind {
            TokenKind::Raw(bytes) => self.literal.extend_from_slice(bytes),
            TokenKind::Separator => {
                self.flush_literal();
                // Consecutive slashes collapse into one separator
                if self.parts.last() != Some(&Part::Separator) {
                    self.parts.push(Part::Separator);
                }
            }
            TokenKind::LeftBrace => {
                self.flush_literal();
                self.operator = Operator::Simple;
                self.vars.clear();
                self.path.clear();
                self.modifier = Modifier::None;
                self.state = State::MaybeOp;
            }
            TokenKind::Eof => {
                self.flush_literal();
                return Some(Ast::new(mem::take(&mut self.parts)));
            }
            _ => self.unexpected(&token),
        }
        None
    }

    fn parse_expr(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::Variable(name) => {
                self.path.push(name.to_string());
                self.state = State::AfterVar;
                Ok(())
            }
            TokenKind::Comma
            | TokenKind::Dot
            | TokenKind::RightBrace
            | TokenKind::Explode
            | TokenKind::Prefix => Err(ParseError::new(
                ParseErrorKind::ExpectedVariable,
                token.offset,
            )),
            _ => self.unexpected(&token),
        }
    }

    fn parse_after_var(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::RightBrace => {
                self.close_var();
                let vars = mem::take(&mut self.vars);
                self.parts
                    .push(Part::Expression(Expression::new(self.operator, vars)));
                self.state = State::Raw;
            }
            TokenKind::Dot if self.modifier == Modifier::None => self.state = State::Expr,
            TokenKind::Comma => {
                self.close_var();
                self.state = State::Expr;
            }
            TokenKind::Prefix | TokenKind::Explode if self.modifier != Modifier::None => {
                return Err(ParseError::new(
                    ParseErrorKind::DoubleModifier,
                    token.offset,
                ));
            }
            TokenKind::Prefix => self.state = State::Length,
            TokenKind::Explode => self.modifier = Modifier::Explode,
            // A fifth length digit is lexed as the start of a variable name
            TokenKind::Variable(name)
                if matches!(self.modifier, Modifier::Prefix(_))
                    && name.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                return Err(ParseError::new(
                    ParseErrorKind::LengthOver9999,
                    self.length_offset,
                ));
            }
            TokenKind::Variable(_) | TokenKind::Dot => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedAfterVariable,
                    token.offset,
                ));
            }
            _ => self.unexpected(&token),
        }
        Ok(())
    }

    fn parse_length(&mut self, token: Token<'a>) {
        match token.kind {
            TokenKind::Length { value, .. } => {
                self.modifier = Modifier::Prefix(value);
                self.length_offset = token.offset;
                self.state = State::AfterVar;
            }
            _ => self.unexpected(&token),
        }
    }
}

/// Parses a URI template.
pub fn parse(template: &str) -> Result<Ast, ParseError> {
    TemplateParser::parse(template)
}

impl FromStr for Ast {
    type Err = ParseError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        parse(template)
    }
}

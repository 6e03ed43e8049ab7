// Template scanner, yielding tokens one at a time

use std::borrow::Cow;
use std::fmt;

use super::ast::Operator;
use crate::error::{LexError, LexErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// `/` outside of an expression
    Separator,
    LeftBrace,
    RightBrace,
    /// One of `+#./;?&`
    Operator(Operator),
    Explode,
    Prefix,
    /// Prefix length, at most four digits
    Length { value: u16, digits: usize },
    Dot,
    Comma,
    /// Literal bytes, either a run of the input or one percent-decoded byte
    Raw(Cow<'a, [u8]>),
    Variable(&'a str),
    Eof,
    Error(LexErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Byte offset of the token, or of the error
    pub offset: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind<'a>, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, TokenKind::Eof | TokenKind::Error(_))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Separator => f.write_str("/"),
            TokenKind::LeftBrace => f.write_str("{"),
            TokenKind::RightBrace => f.write_str("}"),
            TokenKind::Operator(op) => match op.as_char() {
                Some(c) => write!(f, "{}", c),
                None => Ok(()),
            },
            TokenKind::Explode => f.write_str("*"),
            TokenKind::Prefix => f.write_str(":"),
            TokenKind::Length { value, digits } => write!(f, "{:0width$}", value, width = *digits),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Raw(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            TokenKind::Variable(name) => write!(f, "'{}'", name),
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Error(kind) => write!(f, "ERROR {}", kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Path,
    Raw,
    Percent,
    BeginExpr,
    InExpr,
    Length,
    Done,
}

/// Characters allowed in variable names
pub(crate) fn is_varchar(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_illegal_raw(c: u8) -> bool {
    c <= b' ' || b"\"'<>\\^|}`".contains(&c)
}

/// Scans a URI template.
///
/// The lexer only does work when asked for the next token. The last token it
/// yields is always [`TokenKind::Eof`] or [`TokenKind::Error`]; after that it
/// returns `None`. A lexer cannot be restarted.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    state: State,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            state: State::Path,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn error(&mut self, kind: LexErrorKind, offset: usize) -> Token<'a> {
        tracing::debug!(offset, error = %kind, "lexer error");
        self.state = State::Done;
        Token::new(TokenKind::Error(kind), offset)
    }

    fn lex_path(&mut self) -> Option<Token<'a>> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            self.state = State::Done;
            return Some(Token::new(TokenKind::Eof, start));
        };
        match c {
            b'/' => {
                self.pos += 1;
                Some(Token::new(TokenKind::Separator, start))
            }
            b'%' => {
                self.pos += 1;
                self.state = State::Percent;
                None
            }
            b'{' => {
                self.pos += 1;
                self.state = State::BeginExpr;
                Some(Token::new(TokenKind::LeftBrace, start))
            }
            _ => {
                self.state = State::Raw;
                None
            }
        }
    }

    fn lex_raw(&mut self) -> Token<'a> {
        let start = self.pos;
        let bytes = self.bytes();
        let end = bytes[start..]
            .iter()
            .position(|c| matches!(c, b'/' | b'{' | b'%'))
            .map_or(bytes.len(), |i| start + i);

        if let Some(i) = bytes[start..end].iter().position(|&c| is_illegal_raw(c)) {
            return self.error(LexErrorKind::IllegalCharacter(bytes[start + i]), start + i);
        }

        self.pos = end;
        self.state = State::Path;
        Token::new(TokenKind::Raw(Cow::Borrowed(&bytes[start..end])), start)
    }

    /// `self.pos` is right after the `%` sign.
    fn lex_percent(&mut self) -> Token<'a> {
        let percent = self.pos - 1;
        let bytes = self.bytes();
        let Some(digits) = bytes.get(self.pos..self.pos + 2) else {
            return self.error(LexErrorKind::UnfinishedPercent, percent);
        };

        let mut decoded = 0u8;
        for (i, &c) in digits.iter().enumerate() {
            let Some(nibble) = char::from(c).to_digit(16) else {
                return self.error(LexErrorKind::IllegalPercent(c), self.pos + i);
            };
            decoded = decoded << 4 | nibble as u8;
        }

        self.pos += 2;
        self.state = State::Path;
        Token::new(TokenKind::Raw(Cow::Owned(vec![decoded])), percent)
    }

    /// `self.pos` is right after the `{` delimiter.
    fn lex_begin_expr(&mut self) -> Option<Token<'a>> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Some(self.error(LexErrorKind::UnfinishedExpression, start));
        };
        match c {
            b'}' => Some(self.error(LexErrorKind::EmptyExpression, start)),
            c if is_varchar(c) => {
                self.state = State::InExpr;
                None
            }
            b'=' | b',' | b'!' | b'@' | b'|' => {
                Some(self.error(LexErrorKind::ReservedOperator(c), start))
            }
            _ => match Operator::from_byte(c) {
                Some(op) => {
                    self.pos += 1;
                    self.state = State::InExpr;
                    Some(Token::new(TokenKind::Operator(op), start))
                }
                None => Some(self.error(LexErrorKind::Unexpected(c), start)),
            },
        }
    }

    fn lex_in_expr(&mut self) -> Token<'a> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.error(LexErrorKind::UnfinishedExpression, start);
        };
        self.pos += 1;
        let kind = match c {
            b'}' => {
                self.state = State::Path;
                TokenKind::RightBrace
            }
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'*' => TokenKind::Explode,
            b':' => {
                self.state = State::Length;
                TokenKind::Prefix
            }
            c if is_varchar(c) => {
                while self.peek().is_some_and(is_varchar) {
                    self.pos += 1;
                }
                TokenKind::Variable(&self.input[start..self.pos])
            }
            _ => return self.error(LexErrorKind::Unexpected(c), start),
        };
        Token::new(kind, start)
    }

    /// Scans between one and four ASCII digits.
    fn lex_length(&mut self) -> Token<'a> {
        let start = self.pos;
        let mut value = 0u16;
        while self.pos < start + 4 {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    value = value * 10 + u16::from(c - b'0');
                    self.pos += 1;
                }
                _ => break,
            }
        }

        if self.pos == start {
            return self.error(LexErrorKind::ExpectedLength, start);
        }

        self.state = State::InExpr;
        Token::new(
            TokenKind::Length {
                value,
                digits: self.pos - start,
            },
            start,
        )
    }

    /// Collects the rest of the stream, terminal token included.
    pub fn collect_tokens(self) -> Vec<Token<'a>> {
        self.collect()
    }

    /// The first error in the stream, if any.
    pub fn check(self) -> Result<(), LexError> {
        for token in self {
            if let TokenKind::Error(kind) = token.kind {
                return Err(LexError {
                    kind,
                    offset: token.offset,
                });
            }
        }
        Ok(())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let token = match self.state {
                State::Done => return None,
                State::Path => self.lex_path(),
                State::Raw => Some(self.lex_raw()),
                State::Percent => Some(self.lex_percent()),
                State::BeginExpr => self.lex_begin_expr(),
                State::InExpr => Some(self.lex_in_expr()),
                State::Length => Some(self.lex_length()),
            };
            if token.is_some() {
                return token;
            }
        }
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Lexes `input` lazily.
pub fn lex(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}

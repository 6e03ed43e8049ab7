// Error handling for uritemplate

use std::fmt;
use std::io;

/// Formats a byte the way diagnostics quote characters: `U+0041 'A'`, or
/// just `U+000A` when the character is not printable.
pub(crate) fn unicode_escape(byte: u8) -> String {
    let ch = char::from(byte);
    if ch.is_control() {
        format!("U+{:04X}", byte)
    } else {
        format!("U+{:04X} '{}'", byte, ch)
    }
}

/// What went wrong while scanning a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    IllegalCharacter(u8),
    UnfinishedPercent,
    IllegalPercent(u8),
    UnfinishedExpression,
    EmptyExpression,
    ReservedOperator(u8),
    Unexpected(u8),
    ExpectedLength,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::IllegalCharacter(c) => {
                write!(f, "found illegal character «{}»", char::from(*c))
            }
            LexErrorKind::UnfinishedPercent => write!(f, "expected two hex digits"),
            LexErrorKind::IllegalPercent(c) => {
                write!(f, "expected two hex digits, got {}", unicode_escape(*c))
            }
            LexErrorKind::UnfinishedExpression => write!(f, "expected '}}', got EOF"),
            LexErrorKind::EmptyExpression => write!(f, "empty expression"),
            LexErrorKind::ReservedOperator(c) => {
                write!(f, "unexpected reserved operator {}", unicode_escape(*c))
            }
            LexErrorKind::Unexpected(c) => write!(f, "unexpected {}", unicode_escape(*c)),
            LexErrorKind::ExpectedLength => write!(f, "expected length"),
        }
    }
}

/// A scanning error and the byte offset it was raised at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub offset: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Lex(LexErrorKind),
    /// A variable name must follow `{`, an operator, a comma or a dot
    ExpectedVariable,
    DoubleModifier,
    UnexpectedAfterVariable,
    LengthOver9999,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Lex(kind) => kind.fmt(f),
            ParseErrorKind::ExpectedVariable => write!(f, "expected a variable name"),
            ParseErrorKind::DoubleModifier => {
                write!(f, "a variable cannot have more than one modifier")
            }
            ParseErrorKind::UnexpectedAfterVariable => {
                write!(f, "expected ',', '.', ':', '*' or '}}' after variable")
            }
            ParseErrorKind::LengthOver9999 => write!(f, "prefix length must be at most 9999"),
        }
    }
}

/// Why a template could not be parsed, and where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 0-based byte offset into the template
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Renders `input` with a caret under the offending column.
    pub fn snippet(&self, input: &str) -> String {
        format!("{}\n{:>width$}", input, "^", width = self.offset + 1)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at col {}: {}", self.offset + 1, self.kind)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lex(err.kind), err.offset)
    }
}

/// Expansion itself cannot fail; only the output sink can.
#[derive(Debug)]
pub enum ExecuteError {
    Write(io::Error),
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Write(err) => write!(f, "Failed to write expansion: {}", err),
        }
    }
}

impl std::error::Error for ExecuteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecuteError::Write(err) => Some(err),
        }
    }
}

impl From<io::Error> for ExecuteError {
    fn from(err: io::Error) -> Self {
        ExecuteError::Write(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_escape() {
        assert_eq!(unicode_escape(b'g'), "U+0067 'g'");
        assert_eq!(unicode_escape(b' '), "U+0020 ' '");
        assert_eq!(unicode_escape(b'\n'), "U+000A");
    }

    #[test]
    fn test_lex_messages() {
        assert_eq!(
            LexErrorKind::IllegalCharacter(b'\\').to_string(),
            "found illegal character «\\»"
        );
        assert_eq!(
            LexErrorKind::IllegalPercent(b'h').to_string(),
            "expected two hex digits, got U+0068 'h'"
        );
        assert_eq!(LexErrorKind::UnfinishedExpression.to_string(), "expected '}', got EOF");
        assert_eq!(
            LexErrorKind::ReservedOperator(b'!').to_string(),
            "unexpected reserved operator U+0021 '!'"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(ParseErrorKind::LengthOver9999, 5);
        assert_eq!(err.to_string(), "error at col 6: prefix length must be at most 9999");
    }

    #[test]
    fn test_snippet() {
        let err = ParseError::new(ParseErrorKind::ExpectedVariable, 3);
        assert_eq!(err.snippet("{a,}"), "{a,}\n   ^");
    }

    #[test]
    fn test_from_lex_error() {
        let err: ParseError = LexError {
            kind: LexErrorKind::EmptyExpression,
            offset: 1,
        }
        .into();
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::EmptyExpression));
        assert_eq!(err.offset, 1);
    }
}

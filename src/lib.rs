//! RFC 6570 URI Template expansion, up to level 4.
//!
//! ```
//! use uritemplate::{parse, Mapping};
//!
//! let ast = parse("/search{?q,lang}").unwrap();
//! let context = Mapping::new().with("q", "rust lang").with("lang", "en").into();
//! assert_eq!(ast.expand(&context), "/search?q=rust%20lang&lang=en");
//! ```

pub mod error;
pub mod template;

pub use error::{ExecuteError, LexError, LexErrorKind, ParseError, ParseErrorKind};
pub use template::{
    escape, escape_bytes, execute, lex, parse, Ast, Expression, Kind, Lexer, Mapping, Mask,
    Modifier, Operator, Part, TemplateParser, Token, TokenKind, Value, VarRef,
};

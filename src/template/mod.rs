// Template module for RFC 6570 URI templates
//
// Templates are lexed into tokens, parsed into an immutable Ast, then
// expanded against a Value context. Each stage can be used on its own.

mod ast;
mod escape;
mod executor;
mod lexer;
mod parser;
mod value;

pub use ast::{Ast, Expression, Modifier, Operator, Part, VarRef};
pub use escape::{escape, escape_bytes, Mask};
pub use executor::execute;
pub use lexer::{lex, Lexer, Token, TokenKind};
pub use parser::{parse, TemplateParser};
pub use value::{Kind, Mapping, Value};

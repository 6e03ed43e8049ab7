// Abstract Syntax Tree types for URI templates

use std::collections::BTreeSet;
use std::fmt;

use super::escape::Mask;

/// A parsed template: literal text, path separators and expressions.
///
/// An `Ast` never changes once built, so the same value can be expanded
/// against any number of contexts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ast {
    parts: Vec<Part>,
    variables: BTreeSet<String>,
}

impl Ast {
    /// Builds an `Ast` from its parts, deriving the variable set.
    pub fn new(parts: Vec<Part>) -> Self {
        let variables = parts
            .iter()
            .filter_map(|part| match part {
                Part::Expression(expr) => Some(expr),
                _ => None,
            })
            .flat_map(|expr| expr.variables.iter())
            .map(|var| var.name().to_string())
            .collect();

        Self { parts, variables }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Distinct top-level variable names, sorted.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.parts.iter().filter_map(|part| match part {
            Part::Expression(expr) => Some(expr),
            _ => None,
        })
    }
}

/// Renders a template that parses back to an equal `Ast`.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Literal bytes, already percent-decoded
    Literal(Vec<u8>),
    /// A `/` outside of any expression
    Separator,
    Expression(Expression),
}

impl Part {
    pub fn literal(text: impl Into<Vec<u8>>) -> Self {
        Part::Literal(text.into())
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Literal(bytes) => {
                // Bytes the lexer would reject, or read as a separator
                for &b in bytes {
                    if Mask::DISALLOWED.matches(b) || b == b'\'' || b == b'/' {
                        write!(f, "%{:02X}", b)?;
                    } else {
                        write!(f, "{}", char::from(b))?;
                    }
                }
                Ok(())
            }
            Part::Separator => f.write_str("/"),
            Part::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

/// Expression operators from RFC 6570 section 2.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    Simple,
    Reserved,
    Fragment,
    Label,
    PathSegment,
    PathParameter,
    Query,
    QueryContinuation,
}

impl Operator {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Operator::Reserved),
            b'#' => Some(Operator::Fragment),
            b'.' => Some(Operator::Label),
            b'/' => Some(Operator::PathSegment),
            b';' => Some(Operator::PathParameter),
            b'?' => Some(Operator::Query),
            b'&' => Some(Operator::QueryContinuation),
            _ => None,
        }
    }

    /// The operator character as written in the template, `None` for simple
    /// expansion.
    pub fn as_char(self) -> Option<char> {
        match self {
            Operator::Simple => None,
            Operator::Reserved => Some('+'),
            Operator::Fragment => Some('#'),
            Operator::Label => Some('.'),
            Operator::PathSegment => Some('/'),
            Operator::PathParameter => Some(';'),
            Operator::Query => Some('?'),
            Operator::QueryContinuation => Some('&'),
        }
    }

    /// What gets printed before the first expanded item.
    pub fn prefix(self) -> Option<char> {
        match self {
            Operator::Reserved => None,
            op => op.as_char(),
        }
    }

    /// Separator between expanded items.
    pub fn separator(self) -> char {
        match self {
            Operator::Simple | Operator::Reserved | Operator::Fragment => ',',
            Operator::Label => '.',
            Operator::PathSegment => '/',
            Operator::PathParameter => ';',
            Operator::Query | Operator::QueryContinuation => '&',
        }
    }

    /// Classes of bytes escaped in values.
    pub fn mask(self) -> Mask {
        match self {
            Operator::Reserved | Operator::Fragment => Mask::DISALLOWED,
            _ => Mask::DISALLOWED | Mask::RESERVED,
        }
    }

    /// Whether items are rendered as `key=value` pairs.
    pub fn is_named(self) -> bool {
        matches!(
            self,
            Operator::PathParameter | Operator::Query | Operator::QueryContinuation
        )
    }

    /// Whether an expression with nothing defined drops its prefix too.
    pub fn needs_defined_value(self) -> bool {
        matches!(self, Operator::Fragment | Operator::Label)
    }

    /// Whether `key` alone stands for an empty value (`;x` rather than `;x=`).
    pub fn omits_empty_equals(self) -> bool {
        self == Operator::PathParameter
    }
}

/// A `{...}` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub operator: Operator,
    pub variables: Vec<VarRef>,
}

impl Expression {
    pub fn new(operator: Operator, variables: Vec<VarRef>) -> Self {
        Self {
            operator,
            variables,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if let Some(op) = self.operator.as_char() {
            write!(f, "{}", op)?;
        }
        for (i, var) in self.variables.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", var)?;
        }
        f.write_str("}")
    }
}

/// A variable modifier from RFC 6570 section 2.4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    #[default]
    None,
    /// Keep at most this many characters, 0 to 9999
    Prefix(u16),
    Explode,
}

impl Modifier {
    pub fn prefix_len(self) -> Option<usize> {
        match self {
            Modifier::Prefix(len) => Some(usize::from(len)),
            _ => None,
        }
    }

    pub fn is_explode(self) -> bool {
        self == Modifier::Explode
    }
}

/// A possibly dotted variable reference, like `person.firstName:3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub path: Vec<String>,
    pub modifier: Modifier,
}

impl VarRef {
    pub fn new(path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            modifier: Modifier::None,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// The top-level variable name.
    pub fn name(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// The name used as key by named operators.
    pub fn key(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join("."))?;
        match self.modifier {
            Modifier::None => Ok(()),
            Modifier::Prefix(len) => write!(f, ":{}", len),
            Modifier::Explode => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_display() {
        let expr = Expression::new(Operator::Simple, vec![VarRef::new(["var"])]);
        assert_eq!(expr.to_string(), "{var}");

        let expr = Expression::new(
            Operator::Reserved,
            vec![
                VarRef::new(["var"]),
                VarRef::new(["prefix"]).with_modifier(Modifier::Prefix(12)),
                VarRef::new(["explode"]).with_modifier(Modifier::Explode),
            ],
        );
        assert_eq!(expr.to_string(), "{+var,prefix:12,explode*}");
    }

    #[test]
    fn test_dotted_var_display() {
        let var = VarRef::new(["person", "firstName"]).with_modifier(Modifier::Prefix(3));
        assert_eq!(var.to_string(), "person.firstName:3");
        assert_eq!(var.name(), "person");
        assert_eq!(var.key(), "firstName");
    }

    #[test]
    fn test_ast_variables_are_derived() {
        let ast = Ast::new(vec![
            Part::literal("raw"),
            Part::Separator,
            Part::Expression(Expression::new(
                Operator::Query,
                vec![VarRef::new(["c"]), VarRef::new(["a", "b"])],
            )),
            Part::Expression(Expression::new(Operator::Simple, vec![VarRef::new(["c"])])),
        ]);
        let vars: Vec<&str> = ast.variables().iter().map(String::as_str).collect();
        assert_eq!(vars, vec!["a", "c"]);
        assert_eq!(ast.expressions().count(), 2);
    }

    #[test]
    fn test_ast_display_escapes_literals() {
        let ast = Ast::new(vec![
            Part::literal("a b%/'é"),
            Part::Separator,
            Part::Expression(Expression::new(Operator::Simple, vec![VarRef::new(["var"])])),
        ]);
        assert_eq!(ast.to_string(), "a%20b%25%2F%27%C3%A9/{var}");
    }

    #[test]
    fn test_operator_table() {
        for (byte, sep, named) in [
            (b'+', ',', false),
            (b'#', ',', false),
            (b'.', '.', false),
            (b'/', '/', false),
            (b';', ';', true),
            (b'?', '&', true),
            (b'&', '&', true),
        ] {
            let op = Operator::from_byte(byte).unwrap();
            assert_eq!(op.as_char(), Some(byte as char));
            assert_eq!(op.separator(), sep);
            assert_eq!(op.is_named(), named);
        }
        assert_eq!(Operator::Reserved.prefix(), None);
        assert_eq!(Operator::Simple.prefix(), None);
        assert_eq!(Operator::Fragment.mask(), Mask::DISALLOWED);
        assert_eq!(Operator::Simple.mask(), Mask::DISALLOWED | Mask::RESERVED);
        assert!(Operator::from_byte(b'=').is_none());
        assert!(Operator::Fragment.needs_defined_value());
        assert!(Operator::Label.needs_defined_value());
        assert!(!Operator::Query.needs_defined_value());
    }
}

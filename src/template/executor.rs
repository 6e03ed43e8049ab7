// Template expansion against a data context

use std::borrow::Cow;
use std::io::Write;

use super::ast::{Ast, Expression, Operator, Part, VarRef};
use super::escape::{escape, Mask};
use super::value::Value;
use crate::error::ExecuteError;

/// The first `len` characters of `s`.
fn truncate(s: &str, len: usize) -> &str {
    match s.char_indices().nth(len) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

fn escape_value(s: &str, prefix: Option<usize>, mask: Mask) -> Cow<'_, str> {
    let unescaped = match prefix {
        Some(len) => truncate(s, len),
        None => s,
    };
    escape(unescaped, mask)
}

/// Expands one expression into a buffer, so that `#` and `.` can take back
/// their prefix when no variable is defined.
struct ExpressionWriter<'a> {
    buf: String,
    expr: &'a Expression,
    context: &'a Value,
    operator: Operator,
    mask: Mask,
    /// Items written so far
    items: usize,
}

impl<'a> ExpressionWriter<'a> {
    fn new(expr: &'a Expression, context: &'a Value) -> Self {
        Self {
            buf: String::new(),
            expr,
            context,
            operator: expr.operator,
            mask: expr.operator.mask(),
            items: 0,
        }
    }

    fn emit(&mut self, key: Option<&str>, value: &str) {
        if self.items > 0 {
            self.buf.push(self.operator.separator());
        }
        if let Some(key) = key {
            self.buf.push_str(key);
            if !(value.is_empty() && self.operator.omits_empty_equals()) {
                self.buf.push('=');
            }
        }
        self.buf.push_str(value);
        self.items += 1;
    }

    fn write_variable(&mut self, var: &VarRef) {
        let context = self.context;
        let mask = self.mask;
        let key = self.operator.is_named().then(|| var.key());
        let prefix = var.modifier.prefix_len();
        let explode = var.modifier.is_explode();

        match context.resolve(var.path.as_slice()) {
            Value::Undefined => {}
            Value::Scalar(s) => {
                let value = escape_value(s, prefix, mask);
                self.emit(key, &value);
            }
            Value::List(items) => {
                let items: Vec<&Value> = items.iter().filter(|v| !v.is_undefined()).collect();
                if items.is_empty() {
                    return;
                }
                if explode {
                    for item in items {
                        let unescaped = item.to_scalar_string();
                        self.emit(key, &escape(&unescaped, mask));
                    }
                } else {
                    let joined = items
                        .iter()
                        .map(|item| escape_value(&item.to_scalar_string(), prefix, mask).into_owned())
                        .collect::<Vec<_>>()
                        .join(",");
                    self.emit(key, &joined);
                }
            }
            Value::Mapping(mapping) => {
                let entries: Vec<(&str, &Value)> =
                    mapping.iter().filter(|(_, v)| !v.is_undefined()).collect();
                if entries.is_empty() {
                    return;
                }
                if explode {
                    for (k, v) in entries {
                        let name = escape(k, mask);
                        let unescaped = v.to_scalar_string();
                        self.emit(Some(&name), &escape(&unescaped, mask));
                    }
                } else {
                    let joined = entries
                        .iter()
                        .flat_map(|(k, v)| {
                            [
                                escape(k, mask).into_owned(),
                                escape(&v.to_scalar_string(), mask).into_owned(),
                            ]
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    self.emit(key, &joined);
                }
            }
        }
    }

    fn finish(mut self) -> String {
        if let Some(prefix) = self.operator.prefix() {
            self.buf.push(prefix);
        }
        let expr = self.expr;
        for var in &expr.variables {
            self.write_variable(var);
        }
        if self.items == 0 && self.operator.needs_defined_value() {
            self.buf.clear();
        }
        tracing::trace!(expression = %expr, expansion = %self.buf, "expanded expression");
        self.buf
    }
}

fn expand_part<'p>(part: &'p Part, context: &Value) -> Cow<'p, [u8]> {
    match part {
        Part::Literal(bytes) => Cow::Borrowed(bytes.as_slice()),
        Part::Separator => Cow::Borrowed(b"/".as_slice()),
        Part::Expression(expr) => {
            Cow::Owned(ExpressionWriter::new(expr, context).finish().into_bytes())
        }
    }
}

/// Expands `ast` against `context` and writes the result to `out`.
///
/// Missing variables and values of an unexpected shape are not errors, they
/// just expand to nothing. The only failure is `out` refusing a write.
pub fn execute<W: Write + ?Sized>(
    ast: &Ast,
    out: &mut W,
    context: &Value,
) -> Result<(), ExecuteError> {
    for part in ast.parts() {
        let bytes = expand_part(part, context);
        if bytes.is_empty() {
            continue;
        }
        if let Err(err) = out.write_all(&bytes) {
            tracing::debug!(error = %err, "failed to write expansion");
            return Err(err.into());
        }
    }
    Ok(())
}

impl Ast {
    /// Expands into raw bytes. Literals decoded from `%XX` may hold bytes
    /// that are not valid UTF-8.
    pub fn expand_bytes(&self, context: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        for part in self.parts() {
            out.extend_from_slice(&expand_part(part, context));
        }
        out
    }

    /// Expands into a string. Invalid UTF-8 from decoded literals is replaced
    /// with U+FFFD.
    pub fn expand(&self, context: &Value) -> String {
        match String::from_utf8(self.expand_bytes(context)) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

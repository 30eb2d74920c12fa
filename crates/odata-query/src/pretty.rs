//! Source rendering for expressions
//!
//! `Display` writes a tree back in the lambda syntax `parse` accepts. Explicit
//! parentheses are `Group` nodes, so binary operands only get parentheses
//! when operator precedence requires them.

use std::fmt::{self, Display};

use crate::ast::{Assign, Expr, Value};
use crate::literal::iso_string;

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Date(d) => write!(f, "\"{}\"", iso_string(d)),
        }
    }
}

impl Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_identifier(&self.name) {
            write!(f, "{}: {}", self.name, self.right)
        } else {
            write!(f, "\"{}\": {}", escape_string(&self.name), self.right)
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Unary { operator, target } => {
                write!(f, "{}", operator)?;
                write_operand(f, target, needs_parens_as_operand(target))
            }
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                let prec = precedence(operator);
                write_operand(f, left, binary_child_needs_parens(left, prec, false))?;
                write!(f, " {} ", operator)?;
                write_operand(f, right, binary_child_needs_parens(right, prec, true))
            }
            Expr::Group(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Expr::Assign(assign) => write!(f, "{}", assign),
            Expr::Object(members) => {
                if members.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, " }}")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::Member { owner, name } => {
                write_operand(f, owner, needs_parens_as_receiver(owner))?;
                write!(f, ".{}", name)
            }
            Expr::Indexer { owner, key } => {
                write_operand(f, owner, needs_parens_as_receiver(owner))?;
                write!(f, "[{}]", key)
            }
            Expr::Func { parameters, body } => {
                if parameters.len() == 1 {
                    write!(f, "{} => {}", parameters[0], body)
                } else {
                    write!(f, "({}) => {}", parameters.join(", "), body)
                }
            }
            Expr::Call { callee, args } => {
                write_operand(f, callee, needs_parens_as_receiver(callee))?;
                write!(f, "(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Ternary {
                predicate,
                when_true,
                when_false,
            } => {
                let parens = matches!(**predicate, Expr::Ternary { .. } | Expr::Func { .. });
                write_operand(f, predicate, parens)?;
                write!(f, " ? {} : {}", when_true, when_false)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Binding strength of infix operators; unknown operators bind loosest
fn precedence(op: &str) -> u8 {
    match op {
        "*" | "/" | "%" => 6,
        "+" | "-" => 5,
        "<" | "<=" | ">" | ">=" => 4,
        "==" | "===" | "!=" | "!==" => 3,
        "&&" => 2,
        "||" => 1,
        _ => 0,
    }
}

fn binary_child_needs_parens(child: &Expr, parent_prec: u8, is_right: bool) -> bool {
    match child {
        // Operators are left-associative: an equal-precedence right operand
        // only came from explicit grouping.
        Expr::Binary { operator, .. } => {
            let prec = precedence(operator);
            prec < parent_prec || (is_right && prec == parent_prec)
        }
        other => needs_parens_as_operand(other),
    }
}

fn needs_parens_as_operand(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Func { .. } | Expr::Assign(_)
    )
}

fn needs_parens_as_receiver(expr: &Expr) -> bool {
    needs_parens_as_operand(expr) || matches!(expr, Expr::Unary { .. })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Value};
    use crate::parse::parse;

    #[test]
    fn test_display_lambda() {
        let expr = parse(r#"c => c.name.startsWith("A") && c.id > 3"#).unwrap();
        assert_eq!(expr.to_string(), r#"c => c.name.startsWith("A") && c.id > 3"#);

        let expr = parse("(a, b) => a[b]").unwrap();
        assert_eq!(expr.to_string(), "(a, b) => a[b]");
    }

    #[test]
    fn test_display_object_and_array() {
        let expr = parse(r#"c => { id: c.id, "full name": c.name, tags: [1, 2] }"#).unwrap();
        assert_eq!(
            expr.to_string(),
            r#"c => { id: c.id, "full name": c.name, tags: [1, 2] }"#
        );
    }

    #[test]
    fn test_built_trees_get_precedence_parens() {
        let sum = Expr::var("a").binary("+", Expr::var("b"));
        let expr = sum.clone().binary("*", Expr::var("c"));
        assert_eq!(expr.to_string(), "(a + b) * c");

        let expr = Expr::var("a").binary("-", Expr::var("b").binary("-", Expr::var("c")));
        assert_eq!(expr.to_string(), "a - (b - c)");

        let expr = Expr::unary("!", sum.clone());
        assert_eq!(expr.to_string(), "!(a + b)");

        let expr = sum.member("length");
        assert_eq!(expr.to_string(), "(a + b).length");
    }

    #[test]
    fn test_explicit_groups_survive_round_trip() {
        for q in [
            "(a + b) * c",
            "a - b - c",
            "!(c.deleted)",
            "c => c.tags.any(t => t.includes(\"x\")) ? 1 : -2",
        ] {
            let expr = parse(q).unwrap();
            let printed = expr.to_string();
            assert_eq!(printed, q);
            assert_eq!(parse(&printed).unwrap(), expr, "round trip failed for: {q}");
        }
    }

    #[test]
    fn literal_display_round_trip() {
        for value in [
            Value::Bool(true),
            Value::Null,
            Value::Float(1.0),
            Value::from("tab\tquote\""),
        ] {
            let expr = Expr::Literal(value);
            let reparsed = parse(&expr.to_string()).unwrap();
            assert_eq!(expr, reparsed);
        }
    }
}

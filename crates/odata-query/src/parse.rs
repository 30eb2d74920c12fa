//! Parser for lambda source text
//!
//! Accepts the JavaScript-flavoured expressions query callers write
//! (`c => c.name.startsWith("A") && c.id > 3`) and produces `ast::Expr`.

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::ast::{Assign, Expr, Value};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {}, offset {})",
            self.message, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for ParseError {}

/// Parse a lambda or plain expression from a string
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let input = input.trim();
    let mut stream = input;
    match expr.parse_next(&mut stream) {
        Ok(parsed) => {
            if stream.trim().is_empty() {
                Ok(parsed)
            } else {
                let offset = trailing_input_offset(input, stream);
                Err(build_parse_error(
                    "unexpected trailing input".to_string(),
                    input,
                    offset,
                ))
            }
        }
        Err(e) => {
            let offset = input.len().saturating_sub(stream.len());
            Err(build_parse_error(format!("{:?}", e), input, offset))
        }
    }
}

fn build_parse_error(message: String, input: &str, offset: usize) -> ParseError {
    let (line, column) = offset_to_line_column(input, offset);
    ParseError {
        message,
        offset,
        line,
        column,
    }
}

fn offset_to_line_column(input: &str, offset: usize) -> (usize, usize) {
    let bounded = offset.min(input.len());
    let mut line = 1usize;
    let mut column = 1usize;

    for ch in input[..bounded].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

fn trailing_input_offset(input: &str, trailing: &str) -> usize {
    let base = input.len().saturating_sub(trailing.len());
    let non_ws = trailing
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    base + non_ws
}

// ============ Top-level expression ============

fn expr(input: &mut &str) -> PResult<Expr> {
    preceded(ws, alt((lambda, ternary_expr))).parse_next(input)
}

fn lambda(input: &mut &str) -> PResult<Expr> {
    (lambda_params, ws, "=>", expr)
        .map(|(params, _, _, body)| Expr::lambda(params, body))
        .parse_next(input)
}

fn lambda_params(input: &mut &str) -> PResult<Vec<String>> {
    alt((
        ident_str.map(|name| vec![name]),
        delimited(
            ('(', ws),
            separated(0.., ident_str, (ws, ',', ws)),
            (ws, ')'),
        ),
    ))
    .parse_next(input)
}

fn ternary_expr(input: &mut &str) -> PResult<Expr> {
    let predicate = or_expr.parse_next(input)?;
    let branches = opt((ws, '?', expr, ws, ':', expr)).parse_next(input)?;
    Ok(match branches {
        Some((_, _, when_true, _, _, when_false)) => predicate.ternary(when_true, when_false),
        None => predicate,
    })
}

// ============ Binary operators, lowest precedence first ============

fn fold_binary(first: Expr, rest: Vec<(&str, Expr)>) -> Expr {
    rest.into_iter()
        .fold(first, |left, (op, right)| left.binary(op, right))
}

fn or_expr(input: &mut &str) -> PResult<Expr> {
    let first = and_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> = repeat(0.., (preceded(ws, "||"), and_expr)).parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn and_expr(input: &mut &str) -> PResult<Expr> {
    let first = eq_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> = repeat(0.., (preceded(ws, "&&"), eq_expr)).parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn eq_expr(input: &mut &str) -> PResult<Expr> {
    let first = rel_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> = repeat(
        0..,
        (preceded(ws, alt(("===", "!==", "==", "!="))), rel_expr),
    )
    .parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn rel_expr(input: &mut &str) -> PResult<Expr> {
    let first = add_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> = repeat(
        0..,
        (preceded(ws, alt(("<=", ">=", "<", ">"))), add_expr),
    )
    .parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn add_expr(input: &mut &str) -> PResult<Expr> {
    let first = mul_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> =
        repeat(0.., (preceded(ws, alt(("+", "-"))), mul_expr)).parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn mul_expr(input: &mut &str) -> PResult<Expr> {
    let first = unary_expr.parse_next(input)?;
    let rest: Vec<(&str, Expr)> =
        repeat(0.., (preceded(ws, alt(("*", "/", "%"))), unary_expr)).parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn unary_expr(input: &mut &str) -> PResult<Expr> {
    alt((
        (preceded(ws, alt(("!", "-", "+"))), unary_expr)
            .map(|(op, target)| Expr::unary(op, target)),
        postfix_expr,
    ))
    .parse_next(input)
}

// ============ Postfix expressions (.member, (call), [index]) ============

enum Postfix {
    Member(String),
    Call(Vec<Expr>),
    Index(Expr),
}

fn postfix_expr(input: &mut &str) -> PResult<Expr> {
    let base = primary.parse_next(input)?;
    let ops: Vec<Postfix> = repeat(0.., postfix_op).parse_next(input)?;

    Ok(ops.into_iter().fold(base, |acc, op| match op {
        Postfix::Member(name) => acc.member(name),
        Postfix::Call(args) => acc.call(args),
        Postfix::Index(key) => acc.index(key),
    }))
}

fn postfix_op(input: &mut &str) -> PResult<Postfix> {
    preceded(
        ws,
        alt((
            preceded(('.', ws), ident_str).map(Postfix::Member),
            comma_list('(', ')').map(Postfix::Call),
            delimited('[', expr, (ws, ']')).map(Postfix::Index),
        )),
    )
    .parse_next(input)
}

/// `open expr, expr, ... close`, trailing comma allowed
fn comma_list<'a>(open: char, close: char) -> impl FnMut(&mut &'a str) -> PResult<Vec<Expr>> {
    move |input: &mut &'a str| {
        delimited(
            (open, ws),
            opt(terminated(
                separated(1.., expr, (ws, ',')),
                opt((ws, ',')),
            ))
            .map(|items| items.unwrap_or_default()),
            (ws, close),
        )
        .parse_next(input)
    }
}

// ============ Primary expressions ============

fn primary(input: &mut &str) -> PResult<Expr> {
    preceded(
        ws,
        alt((
            comma_list('(', ')').map(Expr::Group),
            comma_list('[', ']').map(Expr::Array),
            object_expr,
            number,
            string_lit.map(|s| Expr::Literal(Value::String(s))),
            word,
        )),
    )
    .parse_next(input)
}

fn object_expr(input: &mut &str) -> PResult<Expr> {
    delimited(
        ('{', ws),
        opt(terminated(
            separated(1.., assign, (ws, ',', ws)),
            opt((ws, ',')),
        ))
        .map(|members| members.unwrap_or_default()),
        (ws, '}'),
    )
    .map(Expr::Object)
    .parse_next(input)
}

fn assign(input: &mut &str) -> PResult<Assign> {
    (alt((ident_str, string_lit)), ws, ':', expr)
        .map(|(name, _, _, right)| Assign::new(name, right))
        .parse_next(input)
}

/// Identifier or keyword literal
fn word(input: &mut &str) -> PResult<Expr> {
    ident_str
        .map(|name| match name.as_str() {
            "true" => Expr::Literal(Value::Bool(true)),
            "false" => Expr::Literal(Value::Bool(false)),
            "null" | "undefined" => Expr::Literal(Value::Null),
            _ => Expr::Variable(name),
        })
        .parse_next(input)
}

fn ident_str(input: &mut &str) -> PResult<String> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .map(str::to_string)
        .parse_next(input)
}

// ============ Literals ============

fn number(input: &mut &str) -> PResult<Expr> {
    alt((float_lit, int_lit)).map(Expr::Literal).parse_next(input)
}

fn int_lit(input: &mut &str) -> PResult<Value> {
    digit1
        .try_map(|s: &str| s.parse::<i64>())
        .map(Value::Int)
        .parse_next(input)
}

fn float_lit(input: &mut &str) -> PResult<Value> {
    (digit1, '.', digit1)
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .map(Value::Float)
        .parse_next(input)
}

fn string_lit(input: &mut &str) -> PResult<String> {
    alt((
        delimited('"', string_contents('"'), '"'),
        delimited('\'', string_contents('\''), '\''),
    ))
    .parse_next(input)
}

fn backtrack<T>() -> PResult<T> {
    Err(winnow::error::ErrMode::Backtrack(
        winnow::error::ContextError::new(),
    ))
}

fn string_contents<'a>(quote: char) -> impl FnMut(&mut &'a str) -> PResult<String> {
    move |input: &mut &'a str| {
        let mut result = String::new();
        loop {
            let Some(c) = input.chars().next() else {
                return backtrack();
            };
            if c == quote {
                break;
            }
            *input = &input[c.len_utf8()..];
            if c != '\\' {
                result.push(c);
                continue;
            }
            let Some(escaped) = input.chars().next() else {
                return backtrack();
            };
            let unescaped = match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                _ => escaped, // `\\`, quotes and unknown escapes
            };
            result.push(unescaped);
            *input = &input[escaped.len_utf8()..];
        }
        Ok(result)
    }
}

// ============ Whitespace ============

fn ws(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}

// ============ Sanity Tests ============
// Rendering of parsed trees is covered in compile.rs and tests/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literals() {
        assert_eq!(parse("123").unwrap(), Expr::lit(123));
        assert_eq!(parse("3.25").unwrap(), Expr::lit(3.25));
        assert_eq!(parse("true").unwrap(), Expr::lit(true));
        assert_eq!(parse("undefined").unwrap(), Expr::Literal(Value::Null));
        assert_eq!(parse(r#""hel\"lo""#).unwrap(), Expr::lit("hel\"lo"));
        assert!(parse("'it''").is_err());
    }

    #[test]
    fn keyword_prefix_is_identifier() {
        assert_eq!(parse("trueish").unwrap(), Expr::var("trueish"));
    }

    #[test]
    fn parse_lambdas() {
        let single = parse("c => c.id").unwrap();
        assert_eq!(single, Expr::lambda(["c"], Expr::var("c").member("id")));

        let multi = parse("(a, b) => a").unwrap();
        assert_eq!(multi, Expr::lambda(["a", "b"], Expr::var("a")));

        let none = parse("() => 1").unwrap();
        assert_eq!(none, Expr::lambda(Vec::<String>::new(), Expr::lit(1)));
    }

    #[test]
    fn parse_operator_precedence() {
        // a * b + c should parse as (a * b) + c
        let result = parse("a * b + c").unwrap();
        if let Expr::Binary { operator, left, .. } = result {
            assert_eq!(operator, "+");
            assert!(matches!(*left, Expr::Binary { ref operator, .. } if operator == "*"));
        } else {
            panic!("Expected + at top level");
        }

        // a && b || c should parse as (a && b) || c
        let result = parse("a && b || c").unwrap();
        assert!(matches!(result, Expr::Binary { ref operator, .. } if operator == "||"));

        // `<=` is one token, not `<` followed by `=`
        let result = parse("a <= b").unwrap();
        assert!(matches!(result, Expr::Binary { ref operator, .. } if operator == "<="));
    }

    #[test]
    fn parse_group_is_not_a_lambda() {
        let result = parse("(a, b)").unwrap();
        assert_eq!(result, Expr::Group(vec![Expr::var("a"), Expr::var("b")]));
    }

    #[test]
    fn parse_nested_lambda_argument() {
        let result = parse("c => c.tags.any(t => t == 'x')").unwrap();
        let Expr::Func { body, .. } = result else {
            panic!("Expected lambda");
        };
        let Expr::Call { args, .. } = *body else {
            panic!("Expected call");
        };
        assert!(matches!(args[0], Expr::Func { .. }));
    }

    #[test]
    fn parse_object_literal() {
        let result = parse("c => { id: c.id, 'full name': c.name }").unwrap();
        let Expr::Func { body, .. } = result else {
            panic!("Expected lambda");
        };
        assert_eq!(
            *body,
            Expr::Object(vec![
                Assign::new("id", Expr::var("c").member("id")),
                Assign::new("full name", Expr::var("c").member("name")),
            ])
        );
    }

    #[test]
    fn parse_ternary_and_indexer() {
        let result = parse("a[0] ? b : c").unwrap();
        assert_eq!(
            result,
            Expr::var("a")
                .index(Expr::lit(0))
                .ternary(Expr::var("b"), Expr::var("c"))
        );
    }

    #[test]
    fn trailing_input_is_reported() {
        let err = parse("c => c.id )").unwrap_err();
        assert_eq!(err.message, "unexpected trailing input");
        assert_eq!(err.offset, 10);
        assert_eq!((err.line, err.column), (1, 11));
    }
}

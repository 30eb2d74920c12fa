//! Query operations and the handler that turns them into query parameters
//!
//! Operations arrive in call order. Consecutive ordering operations collapse
//! into one `$orderby`; every other supported operation becomes exactly one
//! parameter. Any failure aborts the whole compilation.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Value};
use crate::compile::{CompileError, ExpressionCompiler};
use crate::literal::render_literal;
use crate::options::QueryOptions;
use crate::scope::Scope;

type Result<T> = std::result::Result<T, CompileError>;

/// Kind of a query operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Where,
    Select,
    Skip,
    Take,
    OrderBy,
    OrderByDescending,
    ThenBy,
    ThenByDescending,
    InlineCount,
    ApplyOptions,
    /// Terminal marker: execute the query
    Materialize,
    /// Anything else an upstream builder produced, e.g. `groupBy`
    Other(String),
}

impl QueryKind {
    pub fn name(&self) -> &str {
        match self {
            QueryKind::Where => "where",
            QueryKind::Select => "select",
            QueryKind::Skip => "skip",
            QueryKind::Take => "take",
            QueryKind::OrderBy => "orderBy",
            QueryKind::OrderByDescending => "orderByDescending",
            QueryKind::ThenBy => "thenBy",
            QueryKind::ThenByDescending => "thenByDescending",
            QueryKind::InlineCount => "inlineCount",
            QueryKind::ApplyOptions => "applyOptions",
            QueryKind::Materialize => "materialize",
            QueryKind::Other(name) => name,
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            QueryKind::OrderBy
                | QueryKind::OrderByDescending
                | QueryKind::ThenBy
                | QueryKind::ThenByDescending
        )
    }

    pub fn is_descending(&self) -> bool {
        matches!(
            self,
            QueryKind::OrderByDescending | QueryKind::ThenByDescending
        )
    }

    fn parameter_key(&self) -> String {
        match self {
            QueryKind::Where => "$filter".to_string(),
            other => format!("${}", other.name().to_lowercase()),
        }
    }
}

impl FromStr for QueryKind {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "where" => QueryKind::Where,
            "select" => QueryKind::Select,
            "skip" => QueryKind::Skip,
            "take" => QueryKind::Take,
            "orderBy" => QueryKind::OrderBy,
            "orderByDescending" => QueryKind::OrderByDescending,
            "thenBy" => QueryKind::ThenBy,
            "thenByDescending" => QueryKind::ThenByDescending,
            "inlineCount" => QueryKind::InlineCount,
            "applyOptions" => QueryKind::ApplyOptions,
            "materialize" => QueryKind::Materialize,
            other => QueryKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One argument of a query operation
#[derive(Debug, Clone, PartialEq)]
pub enum PartArg {
    /// A lambda and the closure frames it captured
    Lambda { expr: Expr, scopes: Vec<Scope> },
    Literal(Value),
    Options(QueryOptions),
}

impl PartArg {
    pub fn lambda(expr: Expr) -> Self {
        PartArg::Lambda {
            expr,
            scopes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPart {
    pub kind: QueryKind,
    pub args: Vec<PartArg>,
}

impl QueryPart {
    pub fn new(kind: QueryKind, args: Vec<PartArg>) -> Self {
        Self { kind, args }
    }

    pub fn lambda(kind: QueryKind, expr: Expr, scopes: Vec<Scope>) -> Self {
        Self::new(kind, vec![PartArg::Lambda { expr, scopes }])
    }

    pub fn literal(kind: QueryKind, value: impl Into<Value>) -> Self {
        Self::new(kind, vec![PartArg::Literal(value.into())])
    }

    pub fn options(options: QueryOptions) -> Self {
        Self::new(QueryKind::ApplyOptions, vec![PartArg::Options(options)])
    }

    pub fn materialize() -> Self {
        Self::new(QueryKind::Materialize, Vec::new())
    }
}

/// `key=value` pair appended to the request URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub key: String,
    pub value: String,
}

impl QueryParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Output of [`compile_parts`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub params: Vec<QueryParameter>,
    /// Option objects from `applyOptions` operations, in call order
    pub options: Vec<QueryOptions>,
}

impl CompiledQuery {
    /// Value of the first parameter named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn merged_options(&self) -> QueryOptions {
        QueryOptions::merge(&self.options)
    }
}

/// Compile an ordered operation list into query parameters.
///
/// Option objects are extracted first so their `pascalize` applies to every
/// expression; the terminal materialize marker produces nothing.
pub fn compile_parts(parts: &[QueryPart]) -> Result<CompiledQuery> {
    let options: Vec<QueryOptions> = parts
        .iter()
        .filter(|p| p.kind == QueryKind::ApplyOptions)
        .flat_map(|p| &p.args)
        .filter_map(|arg| match arg {
            PartArg::Options(options) => Some(options.clone()),
            _ => None,
        })
        .collect();
    let pascalize = options
        .iter()
        .rev()
        .find_map(|o| o.pascalize)
        .unwrap_or(false);

    let mut params = Vec::new();
    let mut ordering = OrderingState::Idle;
    for part in parts {
        match &part.kind {
            QueryKind::ApplyOptions | QueryKind::Materialize => {}
            kind if kind.is_ordering() => ordering.push(part),
            _ => {
                if let Some(param) = ordering.flush(pascalize)? {
                    params.push(param);
                }
                params.push(compile_part(part, pascalize)?);
            }
        }
    }
    if let Some(param) = ordering.flush(pascalize)? {
        params.push(param);
    }

    debug!(
        "compiled {} query parts into {} parameters",
        parts.len(),
        params.len()
    );
    Ok(CompiledQuery { params, options })
}

/// Pending ordering operations, merged into one `$orderby` on flush
enum OrderingState<'p> {
    Idle,
    Accumulating(Vec<&'p QueryPart>),
}

impl<'p> OrderingState<'p> {
    fn push(&mut self, part: &'p QueryPart) {
        match self {
            OrderingState::Idle => *self = OrderingState::Accumulating(vec![part]),
            OrderingState::Accumulating(pending) => pending.push(part),
        }
    }

    fn flush(&mut self, pascalize: bool) -> Result<Option<QueryParameter>> {
        let OrderingState::Accumulating(pending) = std::mem::replace(self, OrderingState::Idle)
        else {
            return Ok(None);
        };

        let clauses = pending
            .into_iter()
            .map(|part| -> Result<String> {
                let clause = compile_args(&part.args, pascalize)?;
                Ok(if part.kind.is_descending() {
                    format!("{} desc", clause)
                } else {
                    clause
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let value = clauses.join(", ");
        trace!("$orderby = {}", value);
        Ok(Some(QueryParameter::new("$orderby", value)))
    }
}

fn compile_part(part: &QueryPart, pascalize: bool) -> Result<QueryParameter> {
    let param = match &part.kind {
        QueryKind::Where | QueryKind::Select | QueryKind::Skip | QueryKind::Take => {
            QueryParameter::new(
                part.kind.parameter_key(),
                compile_args(&part.args, pascalize)?,
            )
        }
        QueryKind::InlineCount => {
            QueryParameter::new("$inlinecount", inline_count_value(&part.args))
        }
        other => return Err(CompileError::UnsupportedOperation(other.name().to_string())),
    };
    trace!("{} = {}", param.key, param.value);
    Ok(param)
}

fn inline_count_value(args: &[PartArg]) -> &'static str {
    match args.first() {
        Some(PartArg::Literal(Value::Bool(false))) => "",
        _ => "allpages",
    }
}

fn compile_args(args: &[PartArg], pascalize: bool) -> Result<String> {
    let rendered = args
        .iter()
        .filter_map(|arg| match arg {
            // Each expression gets a fresh compiler, so the root-lambda flag starts set
            PartArg::Lambda { expr, scopes } => {
                Some(ExpressionCompiler::new(scopes, pascalize).compile(expr))
            }
            PartArg::Literal(value) => Some(Ok(render_literal(value))),
            PartArg::Options(_) => None,
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn lambda(kind: QueryKind, src: &str) -> QueryPart {
        QueryPart::lambda(kind, parse(src).unwrap(), Vec::new())
    }

    fn pascal() -> QueryPart {
        QueryPart::options(QueryOptions::new().with_pascalize(true))
    }

    #[test]
    fn where_becomes_filter() {
        let compiled = compile_parts(&[pascal(), lambda(QueryKind::Where, "c => c.id == 1")])
            .unwrap();
        assert_eq!(
            compiled.params,
            vec![QueryParameter::new("$filter", "Id eq 1")]
        );

        let compiled = compile_parts(&[lambda(QueryKind::Where, "c => c.id == 1")]).unwrap();
        assert_eq!(compiled.get("$filter"), Some("id eq 1"));
    }

    #[test]
    fn pascalize_applies_even_when_options_come_last() {
        let compiled = compile_parts(&[lambda(QueryKind::Where, "c => c.id == 1"), pascal()])
            .unwrap();
        assert_eq!(compiled.get("$filter"), Some("Id eq 1"));
    }

    #[test]
    fn consecutive_orderings_merge() {
        let compiled = compile_parts(&[
            pascal(),
            lambda(QueryKind::OrderBy, "c => c.name"),
            lambda(QueryKind::ThenByDescending, "c => c.id"),
        ])
        .unwrap();
        assert_eq!(
            compiled.params,
            vec![QueryParameter::new("$orderby", "Name, Id desc")]
        );
    }

    #[test]
    fn ordering_group_flushes_before_next_operation() {
        let compiled = compile_parts(&[
            lambda(QueryKind::OrderByDescending, "c => c.name"),
            QueryPart::literal(QueryKind::Skip, 10),
            lambda(QueryKind::OrderBy, "c => c.id"),
            lambda(QueryKind::ThenBy, "c => c.kind"),
            QueryPart::literal(QueryKind::Take, 5),
            QueryPart::materialize(),
        ])
        .unwrap();
        assert_eq!(
            compiled.params,
            vec![
                QueryParameter::new("$orderby", "name desc"),
                QueryParameter::new("$skip", "10"),
                QueryParameter::new("$orderby", "id, kind"),
                QueryParameter::new("$take", "5"),
            ]
        );
    }

    #[test]
    fn options_do_not_split_an_ordering_group() {
        let compiled = compile_parts(&[
            lambda(QueryKind::OrderBy, "c => c.name"),
            pascal(),
            lambda(QueryKind::ThenBy, "c => c.id"),
        ])
        .unwrap();
        assert_eq!(compiled.params.len(), 1);
        assert_eq!(compiled.get("$orderby"), Some("Name, Id"));
        assert_eq!(compiled.options.len(), 1);
    }

    #[test]
    fn inline_count_values() {
        let on = compile_parts(&[QueryPart::new(QueryKind::InlineCount, Vec::new())]).unwrap();
        assert_eq!(on.get("$inlinecount"), Some("allpages"));

        let on = compile_parts(&[QueryPart::literal(QueryKind::InlineCount, true)]).unwrap();
        assert_eq!(on.get("$inlinecount"), Some("allpages"));

        let off = compile_parts(&[QueryPart::literal(QueryKind::InlineCount, false)]).unwrap();
        assert_eq!(off.get("$inlinecount"), Some(""));
    }

    #[test]
    fn unsupported_operation_yields_nothing() {
        let result = compile_parts(&[
            lambda(QueryKind::Where, "c => c.id > 1"),
            lambda(QueryKind::Other("groupBy".into()), "c => c.kind"),
            QueryPart::literal(QueryKind::Take, 5),
        ]);
        assert_eq!(
            result,
            Err(CompileError::UnsupportedOperation("groupBy".into()))
        );
    }

    #[test]
    fn select_projection() {
        let compiled = compile_parts(&[
            pascal(),
            lambda(QueryKind::Select, "c => { id: c.id, name: c.name }"),
        ])
        .unwrap();
        assert_eq!(compiled.get("$select"), Some("id as Id, name as Name"));
    }

    #[test]
    fn kind_names_round_trip() {
        for name in ["where", "orderByDescending", "inlineCount", "groupBy"] {
            let kind: QueryKind = name.parse().unwrap();
            assert_eq!(kind.name(), name);
        }
        assert_eq!(QueryKind::ThenBy.to_string(), "thenBy");
    }
}

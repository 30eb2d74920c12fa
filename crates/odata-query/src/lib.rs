//! odata-query - lambda expressions to OData query parameters
//!
//! Compiles the lambdas given to query operations (`where`, `orderBy`,
//! `select`, `skip`, `take`, `inlineCount`) into `$filter`, `$orderby`,
//! `$select`, `$skip`, `$take` and `$inlinecount` parameters.
//!
//! ## Quick Start
//!
//! ```ignore
//! use odata_query::{QueryOptions, QueryProvider};
//!
//! let provider = QueryProvider::new(transport);
//! let companies = provider
//!     .create_query()
//!     .with_options(QueryOptions::new().with_url("Companies").with_pascalize(true))
//!     .capture("minId", 3)
//!     .where_(r#"c => c.id > minId && c.name.startsWith("A")"#)?
//!     .order_by("c => c.name")?
//!     .then_by_descending("c => c.id")?
//!     .take(10)
//!     .to_array()
//!     .await?;
//! // $filter=Id gt 3 and startswith(Name, "A")
//! // $orderby=Name, Id desc
//! // $take=10
//! ```
//!
//! ## Standalone Usage
//!
//! ```ignore
//! let text = odata_query::compile_lambda("c => c.tags.any(t => t.includes(\"a\"))", &[], true)?;
//! assert_eq!(text, r#"Tags/any(t: substringof("a", t))"#);
//! ```
//!
//! Pipeline: parse() -> ast::Expr -> ExpressionCompiler -> compile_parts() -> Transport

mod ast;
mod builder;
mod compile;
mod literal;
mod options;
mod parse;
mod pretty;
mod provider;
mod query;
mod scope;
mod tables;

use thiserror::Error;

// ============ Primary Public API ============

pub use builder::Query;
pub use options::QueryOptions;
pub use provider::{ExecuteError, QueryProvider, Transport, unwrap_envelope};
pub use query::{
    CompiledQuery, PartArg, QueryKind, QueryParameter, QueryPart, compile_parts,
};
pub use scope::Scope;

/// Parse a lambda and compile it the way a single query operation would
pub fn compile_lambda(source: &str, scopes: &[Scope], pascalize: bool) -> Result<String, QueryError> {
    let expr = parse::parse(source)?;
    let text = compile::ExpressionCompiler::new(scopes, pascalize).compile(&expr)?;
    Ok(text)
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Compile error: {0}")]
    Compile(#[from] compile::CompileError),
}

pub use compile::CompileError;
pub use parse::ParseError;

// ============ Advanced: AST Access ============

/// Expression trees and the pieces that render them
pub mod advanced {
    pub use crate::ast::{Assign, Expr, Value};
    pub use crate::compile::{ExpressionCompiler, render};
    pub use crate::literal::{iso_string, render_literal, render_scalar};
    pub use crate::parse::parse;
    pub use crate::scope::lookup;
    pub use crate::tables::{
        BINARY_OPERATORS, LAMBDA_METHODS, MATH_FUNCTIONS, METHODS, UNARY_OPERATORS,
        binary_operator, method_name, unary_operator,
    };
}

pub use ast::Value;

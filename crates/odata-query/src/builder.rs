//! Fluent query builder
//!
//! Accumulates operations in call order. Lambdas are given as source text
//! and parsed on the spot; variables registered with [`Query::capture`] are
//! visible to every lambda added after them.

use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::ast::{Expr, Value};
use crate::compile::CompileError;
use crate::options::QueryOptions;
use crate::parse::{ParseError, parse};
use crate::provider::{ExecuteError, QueryProvider, Transport};
use crate::query::{CompiledQuery, QueryKind, QueryPart, compile_parts};
use crate::scope::Scope;

pub struct Query<'p, T> {
    provider: &'p QueryProvider<T>,
    parts: Vec<QueryPart>,
    scope: Scope,
}

impl<'p, T: Transport> Query<'p, T> {
    pub(crate) fn new(provider: &'p QueryProvider<T>) -> Self {
        Self {
            provider,
            parts: Vec::new(),
            scope: Scope::new(),
        }
    }

    /// Make `name` resolvable as a literal in lambdas added from now on
    pub fn capture(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.scope.insert(name, value);
        self
    }

    pub fn where_(self, predicate: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::Where, predicate)
    }

    pub fn select(self, projection: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::Select, projection)
    }

    pub fn order_by(self, key: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::OrderBy, key)
    }

    pub fn order_by_descending(self, key: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::OrderByDescending, key)
    }

    pub fn then_by(self, key: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::ThenBy, key)
    }

    pub fn then_by_descending(self, key: &str) -> Result<Self, ParseError> {
        self.lambda(QueryKind::ThenByDescending, key)
    }

    pub fn skip(self, count: i64) -> Self {
        self.push(QueryPart::literal(QueryKind::Skip, count))
    }

    pub fn take(self, count: i64) -> Self {
        self.push(QueryPart::literal(QueryKind::Take, count))
    }

    pub fn inline_count(self, enabled: bool) -> Self {
        self.push(QueryPart::literal(QueryKind::InlineCount, enabled))
    }

    pub fn with_options(self, options: QueryOptions) -> Self {
        self.push(QueryPart::options(options))
    }

    /// Add an already-built expression under `kind`
    pub fn with_expr(self, kind: QueryKind, expr: Expr) -> Self {
        let scopes = self.scopes();
        self.push(QueryPart::lambda(kind, expr, scopes))
    }

    /// Append a raw operation
    pub fn push(mut self, part: QueryPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn parts(&self) -> &[QueryPart] {
        &self.parts
    }

    /// Compile without executing
    pub fn parameters(&self) -> Result<CompiledQuery, CompileError> {
        compile_parts(&self.parts)
    }

    /// Execute and return the unwrapped JSON payload
    pub async fn to_array(self) -> Result<Json, ExecuteError<T::Error>> {
        let mut parts = self.parts;
        parts.push(QueryPart::materialize());
        self.provider.execute(&parts).await
    }

    /// Execute and deserialize the unwrapped payload
    pub async fn to_vec<R: DeserializeOwned>(self) -> Result<Vec<R>, ExecuteError<T::Error>> {
        let payload = self.to_array().await?;
        serde_json::from_value(payload).map_err(ExecuteError::Decode)
    }

    fn lambda(self, kind: QueryKind, source: &str) -> Result<Self, ParseError> {
        let expr = parse(source)?;
        Ok(self.with_expr(kind, expr))
    }

    fn scopes(&self) -> Vec<Scope> {
        if self.scope.is_empty() {
            Vec::new()
        } else {
            vec![self.scope.clone()]
        }
    }
}

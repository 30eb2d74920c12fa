//! Transport seam and query execution
//!
//! The core never performs I/O. A [`Transport`] receives the compiled
//! parameters and option objects and returns a deferred JSON payload; the
//! provider attaches the envelope unwrap as a continuation.

use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use serde_json::Value as Json;
use thiserror::Error;

use crate::builder::Query;
use crate::compile::CompileError;
use crate::options::QueryOptions;
use crate::query::{QueryParameter, QueryPart, compile_parts};

/// Executes compiled query parameters, e.g. as an HTTP GET
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + 'static;

    fn request(
        &self,
        params: Vec<QueryParameter>,
        options: Vec<QueryOptions>,
    ) -> BoxFuture<'_, Result<Json, Self::Error>>;
}

#[derive(Error, Debug)]
pub enum ExecuteError<E> {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Transport error: {0}")]
    Transport(#[source] E),

    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Results nested under `value` are unwrapped; anything else is returned as is
pub fn unwrap_envelope(body: Json) -> Json {
    match body {
        Json::Object(mut map) if map.get("value").is_some_and(|v| !v.is_null()) => {
            map.remove("value").unwrap_or_default()
        }
        other => other,
    }
}

/// Compiles operation lists and hands them to a transport
pub struct QueryProvider<T> {
    transport: T,
}

impl<T: Transport> QueryProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a fluent query against this provider
    pub fn create_query(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// Compile `parts` and send them.
    ///
    /// Compilation happens before the transport is called, so a compile
    /// error never produces a request.
    pub fn execute(&self, parts: &[QueryPart]) -> BoxFuture<'_, Result<Json, ExecuteError<T::Error>>> {
        let compiled = match compile_parts(parts) {
            Ok(compiled) => compiled,
            Err(e) => return future::ready(Err(e.into())).boxed(),
        };

        self.transport
            .request(compiled.params, compiled.options)
            .map_ok(unwrap_envelope)
            .map_err(ExecuteError::Transport)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_value_is_unwrapped() {
        let body = json!({ "value": [{ "id": 1 }], "odata.count": 1 });
        assert_eq!(unwrap_envelope(body), json!([{ "id": 1 }]));
    }

    #[test]
    fn body_without_value_is_returned() {
        assert_eq!(unwrap_envelope(json!({})), json!({}));
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
        assert_eq!(unwrap_envelope(json!(null)), json!(null));
    }

    #[test]
    fn null_value_returns_raw_body() {
        let body = json!({ "value": null, "error": "none" });
        assert_eq!(unwrap_envelope(body.clone()), body);
    }
}

//! Per-query options carried by `applyOptions` operations

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::query::QueryParameter;

/// Options a query hands to the transport, plus the `pascalize` switch the
/// compiler reads.
///
/// Every field is optional so option objects can be layered; see [`QueryOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    /// Collection path, joined onto the transport's base address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP method, `GET` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    /// Extra query parameters, sent before the compiled ones
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<QueryParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Upper-case the first letter of member names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pascalize: Option<bool>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(QueryParameter::new(key, value));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_pascalize(mut self, pascalize: bool) -> Self {
        self.pascalize = Some(pascalize);
        self
    }

    /// Load an options object from JSON, e.g. `{"url": "Companies", "pascalize": true}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Fold option objects in order. Later scalars win; headers and params accumulate.
    pub fn merge<'a>(options: impl IntoIterator<Item = &'a QueryOptions>) -> QueryOptions {
        options
            .into_iter()
            .fold(QueryOptions::default(), |mut merged, next| {
                if next.url.is_some() {
                    merged.url = next.url.clone();
                }
                if next.method.is_some() {
                    merged.method = next.method.clone();
                }
                if next.timeout_ms.is_some() {
                    merged.timeout_ms = next.timeout_ms;
                }
                if next.pascalize.is_some() {
                    merged.pascalize = next.pascalize;
                }
                merged
                    .headers
                    .extend(next.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
                merged.params.extend(next.params.iter().cloned());
                merged
            })
    }
}

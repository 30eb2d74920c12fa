//! reqwest-backed [`Transport`]

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use odata_query::{QueryOptions, QueryParameter, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { status: StatusCode, url: String },

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Sends compiled query parameters to `base_address` + the options' `url`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_address: String,
}

impl HttpTransport {
    pub fn new(base_address: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_address)
    }

    pub fn with_client(client: Client, base_address: impl Into<String>) -> Self {
        Self {
            client,
            base_address: base_address.into(),
        }
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Full request URL for a collection path
    pub fn url_for(&self, path: Option<&str>) -> String {
        match path {
            Some(p) if p.starts_with("http://") || p.starts_with("https://") => p.to_string(),
            Some(p) if !p.trim_start_matches('/').is_empty() => format!(
                "{}/{}",
                self.base_address.trim_end_matches('/'),
                p.trim_start_matches('/')
            ),
            _ => self.base_address.clone(),
        }
    }

    async fn send(
        &self,
        params: Vec<QueryParameter>,
        options: Vec<QueryOptions>,
    ) -> Result<Json, HttpError> {
        let options = QueryOptions::merge(&options);
        let url = self.url_for(options.url.as_deref());
        let method = parse_method(options.method.as_deref())?;
        let headers = header_map(&options)?;

        let query: Vec<(&str, &str)> = options
            .params
            .iter()
            .chain(params.iter())
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        debug!("{} {} {:?}", method, url, query);

        let mut request = self
            .client
            .request(method, &url)
            .headers(headers)
            .query(&query);
        if let Some(ms) = options.timeout_ms {
            request = request.timeout(Duration::from_millis(ms));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(HttpError::Status { status, url });
        }
        Ok(response.json().await?)
    }
}

impl Transport for HttpTransport {
    type Error = HttpError;

    fn request(
        &self,
        params: Vec<QueryParameter>,
        options: Vec<QueryOptions>,
    ) -> BoxFuture<'_, Result<Json, HttpError>> {
        self.send(params, options).boxed()
    }
}

fn parse_method(method: Option<&str>) -> Result<Method, HttpError> {
    match method {
        None => Ok(Method::GET),
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|_| HttpError::InvalidMethod(m.to_string())),
    }
}

fn header_map(options: &QueryOptions) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.headers {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(name.clone()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(name.clone()))?;
        headers.insert(header, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining() {
        let transport = HttpTransport::new("http://host/odata/");
        assert_eq!(transport.url_for(Some("Companies")), "http://host/odata/Companies");
        assert_eq!(transport.url_for(Some("/Companies")), "http://host/odata/Companies");
        assert_eq!(transport.url_for(None), "http://host/odata/");
        assert_eq!(transport.url_for(Some("")), "http://host/odata/");
        assert_eq!(
            transport.url_for(Some("https://other/Orders")),
            "https://other/Orders"
        );
    }

    #[test]
    fn methods() {
        assert_eq!(parse_method(None).unwrap(), Method::GET);
        assert_eq!(parse_method(Some("post")).unwrap(), Method::POST);
        assert!(matches!(
            parse_method(Some("GE T")),
            Err(HttpError::InvalidMethod(m)) if m == "GE T"
        ));
    }

    #[test]
    fn headers() {
        let options = QueryOptions::new().with_header("Accept", "application/json");
        let headers = header_map(&options).unwrap();
        assert_eq!(headers["accept"], "application/json");

        let bad = QueryOptions::new().with_header("Bad Header", "x");
        assert!(matches!(header_map(&bad), Err(HttpError::InvalidHeader(n)) if n == "Bad Header"));
    }
}

//! Entry point for querying one OData service

use odata_query::{Query, QueryOptions, QueryProvider, Transport};

use crate::http::HttpTransport;

/// A query provider bound to a service root
pub struct ODataService<T = HttpTransport> {
    provider: QueryProvider<T>,
}

impl ODataService<HttpTransport> {
    pub fn new(base_address: impl Into<String>) -> Self {
        Self::with_transport(HttpTransport::new(base_address))
    }
}

impl<T: Transport> ODataService<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            provider: QueryProvider::new(transport),
        }
    }

    pub fn provider(&self) -> &QueryProvider<T> {
        &self.provider
    }

    /// Start a query against the collection at `url`
    pub fn create_query(&self, url: &str) -> Query<'_, T> {
        self.provider
            .create_query()
            .with_options(QueryOptions::new().with_url(url))
    }
}

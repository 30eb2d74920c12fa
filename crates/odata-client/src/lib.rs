//! odata-client - HTTP transport and service wrapper for odata-query
//!
//! ```ignore
//! use odata_client::ODataService;
//! use odata_query::QueryOptions;
//!
//! let service = ODataService::new("https://example.org/odata");
//! let rows = service
//!     .create_query("Companies")
//!     .with_options(QueryOptions::new().with_pascalize(true))
//!     .where_("c => c.name.startsWith(\"A\")")?
//!     .take(5)
//!     .to_array()
//!     .await?;
//! ```

mod http;
mod service;

pub use http::{HttpError, HttpTransport};
pub use service::ODataService;

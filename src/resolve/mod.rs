//! Fetching small documents over plain HTTP, e.g. from a cloud metadata endpoint when resolving
//!  a name to an address. Only `http://` URLs and `GET` requests are supported.

pub mod config;
pub mod http_response;
pub mod http_retrieve;
pub mod http_url;

pub use config::ResolutionConfig;
pub use http_response::HttpResponse;
pub use http_retrieve::{retrieve, retrieve_blocking, retrieve_with_default_timeout};
pub use http_url::{HttpParsedUrl, IpVersion};

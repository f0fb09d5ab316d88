//! Catalog service client
//!
//! [`ApiClient`] issues bearer-authorized JSON requests and classifies the
//! outcome into [`ApiError`]; [`Catalog`] layers the typed endpoints on top.

mod api;
mod catalog;
mod error;
pub mod transport;

pub use api::{ApiClient, ForbiddenHook, RequestOptions, DEFAULT_API_BASE_URL};
pub(crate) use api::error_message;
pub use catalog::{Catalog, MAX_PAGE_SIZE};
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

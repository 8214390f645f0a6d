//! Collaborator service traits with HTTP and in-memory implementations.

pub mod account;
pub mod catalog;

pub use account::{AccountService, HttpAccountService, InMemoryAccountService};
pub use catalog::{CatalogService, HttpCatalogService, InMemoryCatalogService};

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the account and catalog collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service answered with a failure status or is switched off.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request could not be sent or the connection failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a body that could not be understood.
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Upper bound on a single collaborator HTTP call. Request deadlines are
/// normally much shorter and cancel the call first.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .connect_timeout(Duration::from_secs(2))
        .build()
        .map_err(ServiceError::Transport)
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<reqwest::Url, ServiceError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| ServiceError::Unavailable(format!("invalid service URL {base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ServiceError::Unavailable(format!(
            "service URL {base_url} cannot be used as a base"
        )));
    }
    Ok(url)
}

/// Appends path segments to a base URL, percent-encoding each one.
pub(crate) fn join_segments(base: &reqwest::Url, segments: &[&str]) -> reqwest::Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

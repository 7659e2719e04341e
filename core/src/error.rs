//! Error types for the TeamCity client.
//!
//! # Design
//! `TeamCityApiError` is the only failure the client detects on its own: a
//! response whose status code or content-type disagrees with what the
//! operation expects. Everything else is the failure of an underlying
//! primitive, carried unchanged inside `Error`.

use std::borrow::Cow;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A response did not match the (status, content-type) pair its operation
/// expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeamCityApiError {
    #[error("got status code {observed}; expects {expected}")]
    StatusCode { observed: u16, expected: u16 },

    #[error(
        "got content-type {}; expects {}",
        .observed.as_deref().unwrap_or("<none>"),
        .expected.as_deref().unwrap_or("<none>")
    )]
    ContentType {
        observed: Option<String>,
        expected: Option<String>,
    },
}

/// Errors returned by the encoding, building and parsing layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    TeamCityApi(#[from] TeamCityApiError),

    /// An argument was missing or not usable, e.g. no parameter mapping.
    #[error("invalid input: {0}")]
    InvalidInput(Cow<'static, str>),

    #[error("invalid url")]
    Url(#[from] url::ParseError),

    #[error("json error")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The validation failure, if this error is one.
    pub fn as_teamcity(&self) -> Option<&TeamCityApiError> {
        match self {
            Error::TeamCityApi(e) => Some(e),
            _ => None,
        }
    }
}

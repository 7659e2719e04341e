//! Error type for the blocking TeamCity session.

use std::borrow::Cow;

use tcapy_core::TeamCityApiError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    TeamCityApi(#[from] TeamCityApiError),

    #[error("invalid input: {0}")]
    InvalidInput(Cow<'static, str>),

    #[error("invalid url")]
    Url(#[from] url::ParseError),

    #[error("json error")]
    Json(#[from] serde_json::Error),

    #[error("transport error")]
    Transport(#[from] ureq::Error),
}

impl From<tcapy_core::Error> for Error {
    fn from(error: tcapy_core::Error) -> Self {
        match error {
            tcapy_core::Error::TeamCityApi(e) => Error::TeamCityApi(e),
            tcapy_core::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            tcapy_core::Error::Url(e) => Error::Url(e),
            tcapy_core::Error::Json(e) => Error::Json(e),
        }
    }
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

//! Response validation against an expected (status, content-type) pair.
//!
//! Content types are compared case-insensitively on the whole header value,
//! parameters included: `application/json;charset=UTF-8` is not
//! `application/json`.

use log::debug;

use crate::error::TeamCityApiError;
use crate::http::HttpResponse;

/// Content-type a response must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeRule {
    /// Header present with this media type.
    Is(&'static str),
    /// Header must be missing.
    Absent,
    /// Header is not checked.
    Any,
}

/// What an operation expects back from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub status: u16,
    pub content_type: ContentTypeRule,
}

impl Expectation {
    pub const fn new(status: u16, content_type: ContentTypeRule) -> Self {
        Self {
            status,
            content_type,
        }
    }

    /// Return `response` unchanged if it matches, else the mismatch.
    pub fn check(&self, response: HttpResponse) -> Result<HttpResponse, TeamCityApiError> {
        debug!(
            "TeamCity response: status {} content-type {:?}",
            response.status,
            response.content_type()
        );

        if response.status != self.status {
            return Err(TeamCityApiError::StatusCode {
                observed: response.status,
                expected: self.status,
            });
        }

        let expected = match self.content_type {
            ContentTypeRule::Any => return Ok(response),
            ContentTypeRule::Is(media_type) => Some(media_type),
            ContentTypeRule::Absent => None,
        };
        let observed = response.content_type();
        let matches = match (observed, expected) {
            (Some(observed), Some(expected)) => observed.eq_ignore_ascii_case(expected),
            (None, None) => true,
            _ => false,
        };
        if !matches {
            return Err(TeamCityApiError::ContentType {
                observed: observed.map(str::to_ascii_lowercase),
                expected: expected.map(str::to_ascii_lowercase),
            });
        }

        Ok(response)
    }
}

/// Validate `response` against `expected_status` and `expected_content_type`.
///
/// `None` for the content type means the header must be absent.
pub fn expects(
    expected_status: u16,
    expected_content_type: Option<&'static str>,
    response: HttpResponse,
) -> Result<HttpResponse, TeamCityApiError> {
    let rule = match expected_content_type {
        Some(content_type) => ContentTypeRule::Is(content_type),
        None => ContentTypeRule::Absent,
    };
    Expectation::new(expected_status, rule).check(response)
}

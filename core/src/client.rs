//! Stateless request builder and response validator for the TeamCity API.
//!
//! # Design
//! `TeamCityClient` holds the server base URL and the merged session
//! configuration, and nothing that changes between calls. Each operation is
//! split into a `build_*` method producing an `HttpRequest` and a `parse_*`
//! method validating the `HttpResponse`. The caller executes the HTTP
//! round-trip in between.

use log::debug;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::encode::ActionParameters;
use crate::error::{Error, Result};
use crate::expect::{ContentTypeRule, Expectation};
use crate::http::{HttpRequest, HttpResponse};
use crate::urls::{build_action_url, build_rest_url, Resource, ResourceFilter};

/// `version` answers in plain text.
pub const TEXT_RESPONSE: Expectation = Expectation::new(200, ContentTypeRule::Is("text/plain"));

/// Collection and single-resource queries answer in JSON.
pub const JSON_RESPONSE: Expectation =
    Expectation::new(200, ContentTypeRule::Is("application/json"));

/// `action.html` answers with whatever page the server renders.
pub const ACTION_RESPONSE: Expectation = Expectation::new(200, ContentTypeRule::Any);

#[derive(Debug, Clone)]
pub struct TeamCityClient {
    server: String,
    config: ClientConfig,
}

impl TeamCityClient {
    pub fn new(server: &str, config: ClientConfig) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `<server>/app/rest`.
    pub fn root(&self) -> String {
        build_rest_url::<&str>(&self.server, &[])
    }

    /// Server version. Sent without the configured headers so the server
    /// answers in plain text.
    pub fn build_version(&self) -> Result<HttpRequest> {
        let url = Url::parse(&build_rest_url(&self.server, &[Resource::Version.as_str()]))?;
        Ok(self.request(url, Vec::new()))
    }

    pub fn build_projects(&self, filter: &ResourceFilter) -> Result<HttpRequest> {
        self.build_resource(Resource::Projects, filter)
    }

    pub fn build_builds(&self, filter: &ResourceFilter) -> Result<HttpRequest> {
        self.build_resource(Resource::Builds, filter)
    }

    /// Build configurations (`buildTypes` on the wire).
    pub fn build_configurations(&self, filter: &ResourceFilter) -> Result<HttpRequest> {
        self.build_resource(Resource::BuildTypes, filter)
    }

    pub fn build_agents(&self, filter: &ResourceFilter) -> Result<HttpRequest> {
        self.build_resource(Resource::Agents, filter)
    }

    /// GET `<server>/app/rest/<resource>[/<locator>]` with the configured
    /// headers. The locator is appended as a single percent-encoded path
    /// segment. `Resource::Version` takes no locator and is built by
    /// `build_version`.
    pub fn build_resource(&self, resource: Resource, filter: &ResourceFilter) -> Result<HttpRequest> {
        if resource == Resource::Version {
            return self.build_version();
        }
        let mut url = Url::parse(&build_rest_url(&self.server, &[resource.as_str()]))?;
        let locator = filter.locator();
        if !locator.is_empty() {
            url.path_segments_mut()
                .map_err(|()| Error::InvalidInput("server url cannot take a path".into()))?
                .push(&locator);
        }
        Ok(self.request(url, self.config.headers.clone()))
    }

    /// Queue a build through `action.html`.
    pub fn build_start_build(&self, params: &ActionParameters) -> Result<HttpRequest> {
        let url = Url::parse(&build_action_url(&self.server, params))?;
        Ok(self.request(url, self.config.headers.clone()))
    }

    pub fn parse_version(&self, response: HttpResponse) -> Result<HttpResponse> {
        Ok(TEXT_RESPONSE.check(response)?)
    }

    /// Validate a response to any `build_resource` request.
    pub fn parse_resource(&self, response: HttpResponse) -> Result<HttpResponse> {
        Ok(JSON_RESPONSE.check(response)?)
    }

    pub fn parse_start_build(&self, response: HttpResponse) -> Result<HttpResponse> {
        Ok(ACTION_RESPONSE.check(response)?)
    }

    /// Validate a resource response and decode its body.
    pub fn parse_json<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        self.parse_resource(response)?.json()
    }

    fn request(&self, url: Url, headers: Vec<(String, String)>) -> HttpRequest {
        debug!("TeamCity request: GET {url}");
        HttpRequest {
            url: url.into(),
            headers,
            auth: self.config.auth.clone(),
        }
    }
}

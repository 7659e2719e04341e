use base64::Engine;
use log::{debug, warn};
use tcapy_core::{
    ActionParameters, ClientConfig, ConfigOverrides, Credentials, HttpRequest, HttpResponse,
    Resource, ResourceFilter, TeamCityClient,
};

use crate::error::Result;

/// Blocking session against one TeamCity server.
///
/// Requests are built and validated by `TeamCityClient`; this type only owns
/// the reusable HTTP agent that carries them.
pub struct TeamCityApi {
    client: TeamCityClient,
    agent: ureq::Agent,
}

impl TeamCityApi {
    /// Default configuration with credentials from `TCAPY_USERNAME` /
    /// `TCAPY_PASSWORD`.
    pub fn new(server: &str) -> Self {
        Self::with_config(server, ClientConfig::from_env())
    }

    /// Defaults merged with `overrides`. The environment is only consulted
    /// for credentials when `overrides` does not supply them.
    pub fn with_overrides(server: &str, overrides: ConfigOverrides) -> Self {
        let base = if overrides.auth.is_some() {
            ClientConfig::default()
        } else {
            ClientConfig::from_env()
        };
        Self::with_config(server, base.with_overrides(overrides))
    }

    pub fn with_config(server: &str, config: ClientConfig) -> Self {
        if !config.verify {
            warn!("TLS certificate verification is disabled for {server}");
        }
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(!config.verify)
                    .build(),
            )
            .build()
            .new_agent();
        Self {
            client: TeamCityClient::new(server, config),
            agent,
        }
    }

    pub fn server(&self) -> &str {
        self.client.server()
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    /// Server version as plain text.
    pub fn version(&self) -> Result<HttpResponse> {
        let response = self.execute(self.client.build_version()?)?;
        Ok(self.client.parse_version(response)?)
    }

    pub fn projects(&self, filter: &ResourceFilter) -> Result<HttpResponse> {
        self.resource(Resource::Projects, filter)
    }

    pub fn builds(&self, filter: &ResourceFilter) -> Result<HttpResponse> {
        self.resource(Resource::Builds, filter)
    }

    /// Build configurations.
    pub fn configurations(&self, filter: &ResourceFilter) -> Result<HttpResponse> {
        self.resource(Resource::BuildTypes, filter)
    }

    pub fn agents(&self, filter: &ResourceFilter) -> Result<HttpResponse> {
        self.resource(Resource::Agents, filter)
    }

    /// Queue a build. Only the status code is checked; `action.html` answers
    /// with an HTML page.
    pub fn start_build(&self, params: &ActionParameters) -> Result<HttpResponse> {
        let response = self.execute(self.client.build_start_build(params)?)?;
        Ok(self.client.parse_start_build(response)?)
    }

    fn resource(&self, resource: Resource, filter: &ResourceFilter) -> Result<HttpResponse> {
        let response = self.execute(self.client.build_resource(resource, filter)?)?;
        Ok(self.client.parse_resource(response)?)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.agent.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &request.auth {
            builder = builder.header("authorization", basic_auth(credentials));
        }

        let mut response = builder.call()?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.body_mut().read_to_string()?;
        debug!("GET {} -> {status}", request.url);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Header values that are not valid UTF-8 are kept, with the offending bytes
/// replaced, so validation still sees the header.
fn response_headers(headers: &ureq::http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn basic_auth(credentials: &Credentials) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", credentials.username, credentials.password));
    format!("Basic {encoded}")
}

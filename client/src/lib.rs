//! Blocking TeamCity REST client.
//!
//! # Overview
//! `TeamCityApi` owns one reusable `ureq` agent and executes the requests
//! `tcapy_core::TeamCityClient` builds, handing each response back for
//! status/content-type validation. Every call blocks until the server
//! answers; responses are returned raw.
//!
//! ```no_run
//! use tcapy::{ActionParameters, ResourceFilter, TeamCityApi};
//!
//! let api = TeamCityApi::new("https://teamcity.example.com");
//! let version = api.version()?;
//! let builds = api.builds(&ResourceFilter::by_id(42))?;
//! api.start_build(&ActionParameters::new("Project_Build").top(true))?;
//! # Ok::<(), tcapy::Error>(())
//! ```

mod api;
mod error;

pub use api::TeamCityApi;
pub use error::{Error, Result};
pub use tcapy_core::{
    expects, ActionParameters, Agents, ClientConfig, ConfigOverrides, ContentTypeRule,
    Credentials, CustomParameters, Expectation, HttpResponse, ParameterMap, ResourceFilter,
    TeamCityApiError,
};

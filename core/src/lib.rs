//! Synchronous TeamCity REST client core.
//!
//! # Overview
//! Builds `HttpRequest` values and validates `HttpResponse` values without
//! touching the network (host-does-IO pattern). The `tcapy` crate executes
//! the round-trip; tests can feed responses directly.
//!
//! # Design
//! - `encode` turns build parameters into `action.html` query strings.
//! - `urls` joins the server, the `app/rest` root and resource locators.
//! - `expect` checks status code and content-type, returning the response
//!   untouched or a `TeamCityApiError`.
//! - `TeamCityClient` pairs a `build_*` and a `parse_*` per operation.

pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod expect;
pub mod http;
pub mod types;
pub mod urls;

pub use client::TeamCityClient;
pub use config::{ClientConfig, ConfigOverrides, Credentials};
pub use encode::{
    encode_action_parameters, encode_custom_parameters, encode_parameter_pairs, ActionParameters,
    Agents, CustomParameters, ParameterMap,
};
pub use error::{Error, Result, TeamCityApiError};
pub use expect::{expects, ContentTypeRule, Expectation};
pub use http::{HttpRequest, HttpResponse};
pub use types::{
    Agent, AgentList, Build, BuildList, BuildType, BuildTypeList, Project, ProjectList, Property,
    PropertyList,
};
pub use urls::{build_action_url, build_rest_url, build_url_filter, Resource, ResourceFilter};

//! URL construction for the REST root and the `action.html` endpoint.

use std::fmt;

use crate::encode::{encode_action_parameters, ActionParameters};

/// Path segments every REST resource lives under.
pub const REST_ROOT: [&str; 2] = ["app", "rest"];

pub const ACTION_PAGE: &str = "action.html";

/// REST resources the client queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Version,
    Projects,
    Builds,
    /// Build configurations.
    BuildTypes,
    Agents,
}

impl Resource {
    /// Path segment on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Version => "version",
            Resource::Projects => "projects",
            Resource::Builds => "builds",
            Resource::BuildTypes => "buildTypes",
            Resource::Agents => "agents",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join `server`, `app/rest` and the non-empty `resources` with `/`.
pub fn build_rest_url<S: AsRef<str>>(server: &str, resources: &[S]) -> String {
    let mut segments = vec![server.trim_end_matches('/')];
    segments.extend(REST_ROOT);
    segments.extend(
        resources
            .iter()
            .map(AsRef::as_ref)
            .filter(|segment| !segment.is_empty()),
    );
    segments.join("/")
}

/// `<server>/action.html?<encoded action parameters>`.
pub fn build_action_url(server: &str, params: &ActionParameters) -> String {
    format!(
        "{}/{ACTION_PAGE}?{}",
        server.trim_end_matches('/'),
        encode_action_parameters(params)
    )
}

/// Locator for a single resource: `id:<v>` or `name:<v>`. The id wins when
/// both are set; empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    id: Option<String>,
    name: Option<String>,
}

impl ResourceFilter {
    /// No filter; the whole collection is queried.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl ToString) -> Self {
        Self::none().id(id)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::none().name(name)
    }

    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The rendered locator, or `""` when neither key is set.
    pub fn locator(&self) -> String {
        build_url_filter(self.id.as_deref(), self.name.as_deref())
    }
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator())
    }
}

pub fn build_url_filter(id: Option<&str>, name: Option<&str>) -> String {
    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.filter(|v| !v.is_empty())
    }
    match (non_empty(id), non_empty(name)) {
        (Some(id), _) => format!("id:{id}"),
        (None, Some(name)) => format!("name:{name}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const SERVER: &str = "http://test-teamcity.domain.com";

    #[test]
    fn rest_url_without_resources_is_the_rest_root() {
        let url = Url::parse(&build_rest_url::<&str>(SERVER, &[])).unwrap();
        assert_eq!(url.path(), "/app/rest");
    }

    #[test]
    fn rest_url_for_every_resource() {
        for resource in ["version", "projects", "builds", "buildTypes", "agents"] {
            let url = Url::parse(&build_rest_url(SERVER, &[resource])).unwrap();
            assert_eq!(url.path(), format!("/app/rest/{resource}"));
        }
    }

    #[test]
    fn rest_url_skips_empty_segments() {
        assert_eq!(
            build_rest_url(SERVER, &["builds", "", "id:7"]),
            format!("{SERVER}/app/rest/builds/id:7")
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(
            build_rest_url("http://h/", &["builds"]),
            "http://h/app/rest/builds"
        );
    }

    #[test]
    fn action_url_without_options() {
        let url = Url::parse(&build_action_url(SERVER, &ActionParameters::new("1234"))).unwrap();
        assert_eq!(url.path(), "/action.html");
        assert_eq!(url.query(), Some("add2Queue=1234"));
    }

    #[test]
    fn action_url_with_options() {
        let params = ActionParameters::new("1234").modification_id("42").top(true);
        let url = Url::parse(&build_action_url(SERVER, &params)).unwrap();
        assert_eq!(url.path(), "/action.html");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("moveToTop".to_string(), "True".to_string())));
        assert!(query.contains(&("modificationId".to_string(), "42".to_string())));
        assert!(query.contains(&("add2Queue".to_string(), "1234".to_string())));
    }

    #[test]
    fn filter_with_no_keys_is_empty() {
        assert_eq!(build_url_filter(None, None), "");
        assert_eq!(ResourceFilter::none().locator(), "");
        assert_eq!(ResourceFilter::by_id("").locator(), "");
    }

    #[test]
    fn filter_by_id() {
        assert_eq!(ResourceFilter::by_id("1234").locator(), "id:1234");
    }

    #[test]
    fn filter_by_name() {
        assert_eq!(ResourceFilter::by_name("my-build").to_string(), "name:my-build");
    }

    #[test]
    fn filter_prefers_id_over_name() {
        let filter = ResourceFilter::by_name("my-build").id("1234");
        assert_eq!(filter.locator(), "id:1234");
    }

    #[test]
    fn resource_wire_names() {
        assert_eq!(Resource::BuildTypes.as_str(), "buildTypes");
        assert_eq!(Resource::Version.to_string(), "version");
    }
}

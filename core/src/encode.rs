//! Query-string encoding for TeamCity's `action.html` endpoint.
//!
//! Custom build parameters travel as repeated `name=<key>&value=<value>`
//! pairs. The key prefix selects the parameter kind: none for configuration
//! parameters, `system.` for system properties, `env.` for environment
//! variables.

use std::collections::BTreeMap;

use url::form_urlencoded::Serializer;

use crate::error::{Error, Result};

/// Build parameters keyed by name. Sorted, so encoding is deterministic.
pub type ParameterMap = BTreeMap<String, String>;

pub const SYSTEM_PREFIX: &str = "system.";
pub const ENV_PREFIX: &str = "env.";

/// `agentId` value that queues the build on every enabled compatible agent.
pub const ALL_COMPATIBLE_AGENTS: &str = "allEnabledCompatible";

/// Encode `params` as `name=<prefix><key>&value=<value>` pairs joined by `&`.
///
/// An empty mapping encodes to `""`; a missing one is `InvalidInput`.
pub fn encode_parameter_pairs(params: Option<&ParameterMap>, prefix: &str) -> Result<String> {
    let params = params.ok_or(Error::InvalidInput("parameter mapping is required".into()))?;
    Ok(encode_pairs(params, prefix))
}

/// Encode the three custom parameter groups. A missing group set is
/// `InvalidInput`; missing groups inside it contribute nothing.
pub fn encode_custom_parameters(groups: Option<&CustomParameters>) -> Result<String> {
    let groups = groups.ok_or(Error::InvalidInput("custom parameter groups are required".into()))?;
    Ok(groups.encode())
}

/// Encode everything `action.html` needs to queue a build.
pub fn encode_action_parameters(params: &ActionParameters) -> String {
    params.encode()
}

fn encode_pairs(params: &ParameterMap, prefix: &str) -> String {
    let mut serializer = Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair("name", &format!("{prefix}{key}"));
        serializer.append_pair("value", value);
    }
    serializer.finish()
}

fn join_non_empty<I: IntoIterator<Item = String>>(parts: I) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Configuration parameters, system properties and environment variables
/// passed to a queued build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomParameters {
    pub config: Option<ParameterMap>,
    pub system: Option<ParameterMap>,
    pub env: Option<ParameterMap>,
}

impl CustomParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, params: ParameterMap) -> Self {
        self.config = Some(params);
        self
    }

    pub fn system(mut self, params: ParameterMap) -> Self {
        self.system = Some(params);
        self
    }

    pub fn env(mut self, params: ParameterMap) -> Self {
        self.env = Some(params);
        self
    }

    pub fn is_empty(&self) -> bool {
        [&self.config, &self.system, &self.env]
            .into_iter()
            .all(|group| group.as_ref().map_or(true, |m| m.is_empty()))
    }

    fn encode(&self) -> String {
        let groups = [
            (&self.config, ""),
            (&self.system, SYSTEM_PREFIX),
            (&self.env, ENV_PREFIX),
        ];
        join_non_empty(
            groups
                .into_iter()
                .filter_map(|(group, prefix)| group.as_ref().map(|m| encode_pairs(m, prefix))),
        )
    }
}

/// Agents a queued build may run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Agents {
    One(String),
    Many(Vec<String>),
    /// Every enabled agent compatible with the build configuration.
    AllCompatible,
}

impl Agents {
    fn ids(&self) -> Vec<&str> {
        match self {
            Agents::One(id) => vec![id.as_str()],
            Agents::Many(ids) => ids.iter().map(String::as_str).collect(),
            Agents::AllCompatible => vec![ALL_COMPATIBLE_AGENTS],
        }
    }
}

/// Parameters for queueing a build through `action.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParameters {
    /// Build configuration to queue (`add2Queue`).
    pub id: String,
    pub modification_id: Option<String>,
    pub move_to_top: bool,
    pub agents: Option<Agents>,
    pub custom: CustomParameters,
}

impl ActionParameters {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            modification_id: None,
            move_to_top: false,
            agents: None,
            custom: CustomParameters::default(),
        }
    }

    pub fn modification_id(mut self, id: impl ToString) -> Self {
        self.modification_id = Some(id.to_string());
        self
    }

    pub fn top(mut self, move_to_top: bool) -> Self {
        self.move_to_top = move_to_top;
        self
    }

    pub fn agent(mut self, id: impl ToString) -> Self {
        self.agents = Some(Agents::One(id.to_string()));
        self
    }

    pub fn agents<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.agents = Some(Agents::Many(ids.into_iter().map(|id| id.to_string()).collect()));
        self
    }

    pub fn all_compatible_agents(mut self) -> Self {
        self.agents = Some(Agents::AllCompatible);
        self
    }

    pub fn config(mut self, params: ParameterMap) -> Self {
        self.custom.config = Some(params);
        self
    }

    pub fn system(mut self, params: ParameterMap) -> Self {
        self.custom.system = Some(params);
        self
    }

    pub fn env(mut self, params: ParameterMap) -> Self {
        self.custom.env = Some(params);
        self
    }

    fn encode(&self) -> String {
        let mut serializer = Serializer::new(String::new());
        serializer.append_pair("add2Queue", &self.id);
        if let Some(modification_id) = self.modification_id.as_deref().filter(|m| !m.is_empty()) {
            serializer.append_pair("modificationId", modification_id);
        }
        if self.move_to_top {
            serializer.append_pair("moveToTop", "True");
        }
        if let Some(agents) = &self.agents {
            for id in agents.ids().into_iter().filter(|id| !id.is_empty()) {
                serializer.append_pair("agentId", id);
            }
        }
        join_non_empty([serializer.finish(), self.custom.encode()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> ParameterMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn decode(query: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn missing_mapping_is_invalid_input() {
        let err = encode_parameter_pairs(None, "").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn empty_mapping_encodes_to_empty_string() {
        assert_eq!(encode_parameter_pairs(Some(&ParameterMap::new()), "").unwrap(), "");
    }

    #[test]
    fn pairs_start_with_name() {
        let encoded = encode_parameter_pairs(Some(&map(&[("test_key", "test_value")])), "").unwrap();
        assert!(encoded.starts_with("name="));
        assert!(encoded.contains('&'));
        assert_eq!(
            decode(&encoded),
            vec![pair("name", "test_key"), pair("value", "test_value")]
        );
    }

    #[test]
    fn prefix_is_prepended_to_every_key() {
        let encoded = encode_parameter_pairs(
            Some(&map(&[("a", "1"), ("b", "2")])),
            "test_prefix.",
        )
        .unwrap();
        assert_eq!(
            decode(&encoded),
            vec![
                pair("name", "test_prefix.a"),
                pair("value", "1"),
                pair("name", "test_prefix.b"),
                pair("value", "2"),
            ]
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let encoded =
            encode_parameter_pairs(Some(&map(&[("branch", "feature/a&b c")])), "").unwrap();
        assert_eq!(encoded, "name=branch&value=feature%2Fa%26b+c");
    }

    #[test]
    fn missing_groups_are_invalid_input() {
        assert!(matches!(
            encode_custom_parameters(None).unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn no_groups_encode_to_empty_string() {
        assert_eq!(encode_custom_parameters(Some(&CustomParameters::new())).unwrap(), "");
        assert!(CustomParameters::new().is_empty());
    }

    #[test]
    fn config_group_has_no_prefix() {
        let groups = CustomParameters::new().config(map(&[("config_key", "config_value")]));
        assert_eq!(
            decode(&encode_custom_parameters(Some(&groups)).unwrap()),
            vec![pair("name", "config_key"), pair("value", "config_value")]
        );
    }

    #[test]
    fn system_group_is_prefixed() {
        let groups = CustomParameters::new().system(map(&[("k", "v")]));
        assert_eq!(
            encode_custom_parameters(Some(&groups)).unwrap(),
            "name=system.k&value=v"
        );
    }

    #[test]
    fn env_group_is_prefixed() {
        let groups = CustomParameters::new().env(map(&[("env_key", "env_value")]));
        assert_eq!(
            decode(&encode_custom_parameters(Some(&groups)).unwrap()),
            vec![pair("name", "env.env_key"), pair("value", "env_value")]
        );
    }

    #[test]
    fn groups_are_joined_in_config_system_env_order() {
        let groups = CustomParameters::new()
            .env(map(&[("e", "3")]))
            .config(map(&[("c", "1")]))
            .system(map(&[("s", "2")]));
        assert_eq!(
            encode_custom_parameters(Some(&groups)).unwrap(),
            "name=c&value=1&name=system.s&value=2&name=env.e&value=3"
        );
    }

    #[test]
    fn empty_group_contributes_nothing() {
        let groups = CustomParameters::new()
            .config(ParameterMap::new())
            .env(map(&[("e", "3")]));
        assert_eq!(
            encode_custom_parameters(Some(&groups)).unwrap(),
            "name=env.e&value=3"
        );
    }

    #[test]
    fn bare_action_is_add_to_queue_only() {
        assert_eq!(
            encode_action_parameters(&ActionParameters::new("1234")),
            "add2Queue=1234"
        );
    }

    #[test]
    fn numeric_id_is_stringified() {
        assert_eq!(
            encode_action_parameters(&ActionParameters::new(1234)),
            "add2Queue=1234"
        );
    }

    #[test]
    fn modification_id_is_included() {
        let encoded = encode_action_parameters(&ActionParameters::new("1234").modification_id("42"));
        let decoded = decode(&encoded);
        assert!(decoded.contains(&pair("modificationId", "42")));
        assert!(decoded.contains(&pair("add2Queue", "1234")));
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn move_to_top_is_rendered_as_true() {
        let decoded = decode(&encode_action_parameters(&ActionParameters::new("1234").top(true)));
        assert!(decoded.contains(&pair("moveToTop", "True")));
        assert!(decoded.contains(&pair("add2Queue", "1234")));
    }

    #[test]
    fn false_and_empty_values_are_omitted() {
        let params = ActionParameters::new("1234").top(false).modification_id("");
        assert_eq!(encode_action_parameters(&params), "add2Queue=1234");
    }

    #[test]
    fn single_agent() {
        let decoded = decode(&encode_action_parameters(&ActionParameters::new("1234").agent("12")));
        assert_eq!(decoded, vec![pair("add2Queue", "1234"), pair("agentId", "12")]);
    }

    #[test]
    fn multiple_agents_repeat_agent_id() {
        let decoded = decode(&encode_action_parameters(
            &ActionParameters::new("1234").agents(["12", "13"]),
        ));
        let agents: Vec<_> = decoded.iter().filter(|(k, _)| k == "agentId").collect();
        assert_eq!(agents, vec![&pair("agentId", "12"), &pair("agentId", "13")]);
        assert!(decoded.contains(&pair("add2Queue", "1234")));
    }

    #[test]
    fn all_compatible_agents() {
        let decoded = decode(&encode_action_parameters(
            &ActionParameters::new("1234").all_compatible_agents(),
        ));
        assert!(decoded.contains(&pair("agentId", ALL_COMPATIBLE_AGENTS)));
    }

    #[test]
    fn custom_parameters_follow_action_parameters() {
        let params = ActionParameters::new("1234")
            .config(map(&[("config_key", "config_value")]))
            .system(map(&[("system_key", "system_value")]))
            .env(map(&[("env_key", "env_value")]));
        assert_eq!(
            decode(&encode_action_parameters(&params)),
            vec![
                pair("add2Queue", "1234"),
                pair("name", "config_key"),
                pair("value", "config_value"),
                pair("name", "system.system_key"),
                pair("value", "system_value"),
                pair("name", "env.env_key"),
                pair("value", "env_value"),
            ]
        );
    }

    #[test]
    fn every_parameter_appears_once() {
        let params = ActionParameters::new("bt1")
            .modification_id("42")
            .top(true)
            .agent("7");
        let decoded = decode(&encode_action_parameters(&params));
        for key in ["add2Queue", "modificationId", "moveToTop", "agentId"] {
            assert_eq!(decoded.iter().filter(|(k, _)| k == key).count(), 1, "{key}");
        }
    }
}

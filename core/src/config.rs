//! Session configuration: headers, basic-auth credentials, TLS verification.
//!
//! Defaults are an immutable `ClientConfig`; caller overrides arrive as a
//! `ConfigOverrides` and are merged field by field, the override winning.
//! Reading credentials from the process environment is confined to
//! `Credentials::from_env` and `ClientConfig::from_env`.

use std::fmt;

use log::warn;

pub const USERNAME_VAR: &str = "TCAPY_USERNAME";
pub const PASSWORD_VAR: &str = "TCAPY_PASSWORD";

pub const ACCEPT_JSON: (&str, &str) = ("accept", "application/json");

/// Username/password pair sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `TCAPY_USERNAME` / `TCAPY_PASSWORD`. Returns `None` if either is
    /// unset.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        match (lookup(USERNAME_VAR), lookup(PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(Self::new(username, password)),
            _ => {
                warn!("{USERNAME_VAR}/{PASSWORD_VAR} not set; requests will be sent without credentials");
                None
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options applied to every request a session issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub headers: Vec<(String, String)>,
    pub auth: Option<Credentials>,
    /// Verify the server's TLS certificate. Off by default to match servers
    /// running with self-signed certificates; turn it on wherever possible.
    pub verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            headers: vec![(ACCEPT_JSON.0.to_string(), ACCEPT_JSON.1.to_string())],
            auth: None,
            verify: false,
        }
    }
}

impl ClientConfig {
    /// Defaults with credentials taken from the environment.
    pub fn from_env() -> Self {
        Self {
            auth: Credentials::from_env(),
            ..Self::default()
        }
    }

    /// Merge `overrides` over `self`; every field set in `overrides` wins.
    pub fn with_overrides(self, overrides: ConfigOverrides) -> Self {
        Self {
            headers: overrides.headers.unwrap_or(self.headers),
            auth: overrides.auth.or(self.auth),
            verify: overrides.verify.unwrap_or(self.verify),
        }
    }
}

/// Caller-supplied replacements for `ClientConfig` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub headers: Option<Vec<(String, String)>>,
    pub auth: Option<Credentials>,
    pub verify: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Credentials::new(username, password));
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }
}

use mettakg_explorer::ConfigError;
use serde::Deserialize;
use serde::Serialize;

/// Environment variable consulted when no credential is configured.
pub const CREDENTIAL_ENV_VAR: &str = "METTAKG_TOKEN";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent verbatim as the `Authorization` header.
    #[serde(default)]
    pub credential: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credential: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Fills a missing credential from [`CREDENTIAL_ENV_VAR`].
    pub fn with_env_credential(self) -> Self {
        let from_env = std::env::var(CREDENTIAL_ENV_VAR).ok();
        self.with_fallback_credential(from_env)
    }

    fn with_fallback_credential(mut self, fallback: Option<String>) -> Self {
        if self.credential().is_none() {
            self.credential = fallback.filter(|value| !value.trim().is_empty());
        }
        self
    }

    /// The configured credential, ignoring blank values.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|err| {
            ConfigError::Invalid(format!("base_url {:?} is not a URL: {err}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

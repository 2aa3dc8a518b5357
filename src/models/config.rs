//! Configuration models for hanbench.
//!
//! Everything the harness cannot derive from the CLI lives here: which
//! inference endpoints exist, which student models make up the roster, and
//! the sampling parameters used for generation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level configuration for hanbench.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Primary inference endpoint (serves the teacher model by default)
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Additional named endpoints (e.g. a second server hosting students)
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointConfig>,

    /// Student roster for the two-stage task, evaluated in order
    #[serde(default = "default_students")]
    pub students: Vec<StudentSpec>,

    /// Sampling parameters sent with every generation request
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            endpoints: HashMap::new(),
            students: default_students(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Configuration for an OpenAI-compatible inference endpoint
/// (vLLM, TGI, Ollama, llama.cpp all speak this API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL for the API (e.g. "http://localhost:8000/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (optional; local endpoints usually need none).
    /// Values may contain ${ENV_VAR} placeholders.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable to read the API key from if `api_key` is unset
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_timeout() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// A student model in the stage-B roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSpec {
    /// Display name, also baked into the per-student output filename
    pub name: String,

    /// Model ID as known to the serving endpoint
    pub id: String,

    /// Endpoint name ("primary" or a key under [endpoints])
    #[serde(default = "default_endpoint_name")]
    pub endpoint: String,
}

fn default_endpoint_name() -> String {
    "primary".to_string()
}

fn default_students() -> Vec<StudentSpec> {
    ["qwen-1_8b", "qwen-7b", "qwen-14b", "yi-6b", "internlm2-7b"]
        .iter()
        .map(|name| StudentSpec {
            name: (*name).to_string(),
            id: (*name).to_string(),
            endpoint: default_endpoint_name(),
        })
        .collect()
}

/// Sampling parameters for generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

fn default_temperature() -> f64 {
    0.95
}

fn default_top_p() -> f64 {
    0.9
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from `path` if it exists, otherwise fall back to the built-in
    /// defaults (localhost endpoint, original five-student roster).
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Look up an endpoint by name. "primary" resolves to the top-level
    /// endpoint; anything else must be a key under `[endpoints]`.
    pub fn endpoint(&self, name: &str) -> Result<&EndpointConfig, ConfigError> {
        if name == "primary" {
            return Ok(&self.endpoint);
        }
        self.endpoints
            .get(name)
            .ok_or_else(|| ConfigError::EndpointNotFound(name.to_string()))
    }

    /// Validate that every roster entry references a configured endpoint.
    pub fn validate_endpoints(&self) -> Result<(), ConfigError> {
        for student in &self.students {
            self.endpoint(&student.endpoint)?;
        }
        Ok(())
    }
}

impl EndpointConfig {
    /// Resolve the API key from config or environment.
    ///
    /// Returns `Ok(None)` when no key is configured, which is valid for
    /// local endpoints.
    pub fn resolve_api_key(&self) -> Result<Option<String>, ConfigError> {
        if let Some(key) = &self.api_key {
            return Ok(Some(expand_env_vars(key)));
        }

        if let Some(env_var) = &self.api_key_env {
            return match std::env::var(env_var) {
                Ok(key) => Ok(Some(key)),
                Err(_) => Err(ConfigError::MissingApiKey {
                    env_var: env_var.clone(),
                }),
            };
        }

        Ok(None)
    }
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax. Unset variables are left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key: set {env_var} or api_key in config")]
    MissingApiKey { env_var: String },

    #[error("Endpoint not found: '{0}' (referenced by a student but not configured)")]
    EndpointNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_order() {
        let config = Config::default();
        let names: Vec<&str> = config.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["qwen-1_8b", "qwen-7b", "qwen-14b", "yi-6b", "internlm2-7b"]
        );
        assert!(config.validate_endpoints().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_src = r#"
[endpoint]
base_url = "http://gpu0:8000/v1"
timeout_secs = 120

[endpoints.aux]
base_url = "http://gpu1:8000/v1"

[[students]]
name = "s1"
id = "org/model-a"

[[students]]
name = "s2"
id = "org/model-b"
endpoint = "aux"
"#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.endpoint.base_url, "http://gpu0:8000/v1");
        assert_eq!(config.endpoint.timeout_secs, 120);
        assert_eq!(config.students.len(), 2);
        assert_eq!(config.students[0].endpoint, "primary");
        assert_eq!(config.students[1].endpoint, "aux");
        assert_eq!(config.endpoint("aux").unwrap().base_url, "http://gpu1:8000/v1");
        assert!(config.endpoint("missing").is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("HANBENCH_TEST_KEY", "sk-123");
        assert_eq!(expand_env_vars("${HANBENCH_TEST_KEY}"), "sk-123");
        assert_eq!(expand_env_vars("${HANBENCH_UNSET_VAR}"), "${HANBENCH_UNSET_VAR}");
    }
}

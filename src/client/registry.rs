//! Backend construction from configuration.
//!
//! One registry per run: it resolves endpoint names to their configuration
//! and builds a fresh `LlmClient` per model. Stage B constructs one client
//! per student, strictly one at a time; the release-before-next-acquire
//! discipline lives in the pipeline, not here.

use crate::client::LlmClient;
use crate::models::{Config, Result, StudentSpec};

/// Builds chat backends from the run configuration.
pub struct BackendRegistry {
    config: Config,
}

impl BackendRegistry {
    /// Create a registry, validating that every roster entry references a
    /// configured endpoint so misconfiguration fails before any generation.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_endpoints()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Build a client for an arbitrary model on a named endpoint.
    pub fn client_for(
        &self,
        display_name: &str,
        model_id: &str,
        endpoint_name: &str,
    ) -> Result<LlmClient> {
        let endpoint = self.config.endpoint(endpoint_name)?;
        let api_key = endpoint.resolve_api_key()?;
        LlmClient::new(
            display_name,
            model_id,
            api_key,
            endpoint,
            &self.config.generation,
        )
    }

    /// Build the teacher client on the primary endpoint.
    pub fn teacher_client(&self, display_name: &str, model_id: &str) -> Result<LlmClient> {
        self.client_for(display_name, model_id, "primary")
    }

    /// Build a student client from its roster entry.
    pub fn student_client(&self, spec: &StudentSpec) -> Result<LlmClient> {
        self.client_for(&spec.name, &spec.id, &spec.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatBackend;
    use crate::models::Config;

    #[test]
    fn test_registry_builds_roster_clients() {
        let config = Config::default();
        let registry = BackendRegistry::from_config(&config).unwrap();

        let client = registry.student_client(&config.students[0]).unwrap();
        assert_eq!(client.name(), "qwen-1_8b");
    }

    #[test]
    fn test_unknown_endpoint_rejected_up_front() {
        let mut config = Config::default();
        config.students[0].endpoint = "missing".to_string();

        assert!(BackendRegistry::from_config(&config).is_err());
    }
}

//! Configuration module for the intervue server
//!
//! The server holds the Azure Speech subscription key and the Azure OpenAI
//! key; clients only ever see the short-lived credentials and the streamed
//! completions it hands out. Configuration comes from environment variables
//! and an optional YAML file.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Parsing helpers
//!
//! # Example
//! ```rust,no_run
//! use intervue::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variables filling the gaps
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Default Azure OpenAI REST API version for chat completions.
pub const DEFAULT_OPENAI_API_VERSION: &str = "2023-06-01-preview";

/// Server configuration
///
/// Contains everything needed to run the collaborator endpoints:
/// - Server settings (host, port, upstream HTTP timeout)
/// - Azure Speech credentials used to mint auth and relay tokens
/// - Azure OpenAI deployment used for the interviewer chat
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    pub http_timeout_seconds: u64,

    // Azure Speech
    pub azure_speech_key: Option<String>,
    pub azure_speech_region: Option<String>,
    pub azure_speech_endpoint: Option<String>,

    // Azure OpenAI
    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_api_key: Option<String>,
    pub azure_openai_deployment: Option<String>,
    pub azure_openai_api_version: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            http_timeout_seconds: 30,
            azure_speech_key: None,
            azure_speech_region: None,
            azure_speech_endpoint: None,
            azure_openai_endpoint: None,
            azure_openai_api_key: None,
            azure_openai_deployment: None,
            azure_openai_api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            chat_temperature: 0.7,
            chat_max_tokens: 150,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable fallbacks
    ///
    /// Values present in the YAML file win; environment variables fill in
    /// whatever the file leaves unset, then defaults apply.
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // No .env here: with an explicit file, only real environment
        // variables fill the gaps.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Run every validation check on a fully merged configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_speech_config(&self.azure_speech_key, &self.azure_speech_region)?;
        validation::validate_openai_config(
            &self.azure_openai_endpoint,
            &self.azure_openai_api_key,
            &self.azure_openai_deployment,
        )?;
        validation::validate_chat_parameters(self.chat_temperature, self.chat_max_tokens)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Both the Azure Speech key and region are set.
    pub fn has_speech(&self) -> bool {
        self.azure_speech_key.is_some() && self.azure_speech_region.is_some()
    }

    /// Endpoint, key and deployment for Azure OpenAI are all set.
    pub fn has_openai(&self) -> bool {
        self.azure_openai_endpoint.is_some()
            && self.azure_openai_api_key.is_some()
            && self.azure_openai_deployment.is_some()
    }

    /// Chat completions URL of the configured deployment.
    ///
    /// # Example
    /// ```rust
    /// use intervue::config::ServerConfig;
    ///
    /// let config = ServerConfig {
    ///     azure_openai_endpoint: Some("https://acme.openai.azure.com/".to_string()),
    ///     azure_openai_api_key: Some("key".to_string()),
    ///     azure_openai_deployment: Some("gpt-4o".to_string()),
    ///     ..ServerConfig::default()
    /// };
    /// assert_eq!(
    ///     config.chat_completions_url().unwrap(),
    ///     "https://acme.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2023-06-01-preview"
    /// );
    /// ```
    pub fn chat_completions_url(&self) -> Option<String> {
        if !self.has_openai() {
            return None;
        }
        let endpoint = self.azure_openai_endpoint.as_deref()?;
        let deployment = self.azure_openai_deployment.as_deref()?;
        Some(format!(
            "{}openai/deployments/{deployment}/chat/completions?api-version={}",
            utils::normalize_endpoint(endpoint),
            self.azure_openai_api_version
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "HTTP_TIMEOUT_SECONDS",
        "AZURE_SPEECH_KEY",
        "AZURE_SPEECH_REGION",
        "AZURE_SPEECH_ENDPOINT",
        "AZURE_OPENAI_ENDPOINT",
        "AZURE_OPENAI_API_KEY",
        "AZURE_OPENAI_DEPLOYMENT_NAME",
        "AZURE_OPENAI_API_VERSION",
        "CHAT_TEMPERATURE",
        "CHAT_MAX_TOKENS",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn openai_config() -> ServerConfig {
        ServerConfig {
            azure_openai_endpoint: Some("https://acme.openai.azure.com".to_string()),
            azure_openai_api_key: Some("key".to_string()),
            azure_openai_deployment: Some("interviewer".to_string()),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:3001");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.azure_openai_api_version, "2023-06-01-preview");
        assert_eq!(config.chat_max_tokens, 150);
        assert!(!config.has_speech());
        assert!(!config.has_openai());
        assert!(config.chat_completions_url().is_none());
    }

    #[test]
    fn test_chat_completions_url_adds_missing_slash() {
        assert_eq!(
            openai_config().chat_completions_url().unwrap(),
            "https://acme.openai.azure.com/openai/deployments/interviewer/chat/completions?api-version=2023-06-01-preview"
        );
    }

    #[test]
    fn test_validate_rejects_half_configured_speech() {
        let config = ServerConfig {
            azure_speech_key: Some("key".to_string()),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = ServerConfig {
            azure_speech_key: Some("key".to_string()),
            azure_speech_region: Some("eastus2".to_string()),
            ..openai_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_wins_over_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "4000");
            env::set_var("AZURE_SPEECH_KEY", "env-key");
            env::set_var("AZURE_SPEECH_REGION", "westus2");
        }

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
server:
  port: 5000
azure_speech:
  region: "eastus2"
azure_openai:
  endpoint: "https://acme.openai.azure.com"
  api_key: "yaml-openai-key"
  deployment: "interviewer"
  max_tokens: 200
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.azure_speech_region.as_deref(), Some("eastus2"));
        // Left unset in YAML, filled from the environment.
        assert_eq!(config.azure_speech_key.as_deref(), Some("env-key"));
        assert_eq!(config.azure_openai_endpoint.as_deref(), Some("https://acme.openai.azure.com/"));
        assert_eq!(config.chat_max_tokens, 200);
        assert_eq!(config.chat_temperature, 0.7);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_partial_openai() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            "azure_openai:\n  endpoint: \"https://acme.openai.azure.com\"\n",
        )
        .unwrap();

        let err = ServerConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI"));
    }

    #[test]
    fn test_from_file_missing_file() {
        let path = PathBuf::from("/nonexistent/intervue.yaml");
        assert!(ServerConfig::from_file(&path).is_err());
    }
}

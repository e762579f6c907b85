use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Environment
/// variables fill in whatever is left unset.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   http_timeout_seconds: 30
///
/// azure_speech:
///   key: "your-speech-key"
///   region: "eastus2"
///   endpoint: "https://eastus2.api.cognitive.microsoft.com/"
///
/// azure_openai:
///   endpoint: "https://your-resource.openai.azure.com/"
///   api_key: "your-openai-key"
///   deployment: "gpt-4o"
///   api_version: "2023-06-01-preview"
///   temperature: 0.7
///   max_tokens: 150
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub azure_speech: Option<AzureSpeechYaml>,
    pub azure_openai: Option<AzureOpenAIYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub http_timeout_seconds: Option<u64>,
}

/// Azure Speech configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AzureSpeechYaml {
    /// Subscription key (Azure Portal → Speech resource → Keys and Endpoint)
    pub key: Option<String>,
    /// Region the Speech resource is deployed in, e.g. "eastus2"
    pub region: Option<String>,
    /// Resource endpoint reported to clients by `getSpeechConfig`
    pub endpoint: Option<String>,
}

/// Azure OpenAI configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AzureOpenAIYaml {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid YAML
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

use super::ServerConfig;
use super::merge::merge_config;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `3001` |
    /// | `HTTP_TIMEOUT_SECONDS` | `30` |
    /// | `AZURE_SPEECH_KEY`, `AZURE_SPEECH_REGION`, `AZURE_SPEECH_ENDPOINT` | unset |
    /// | `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_DEPLOYMENT_NAME` | unset |
    /// | `AZURE_OPENAI_API_VERSION` | `2023-06-01-preview` |
    /// | `CHAT_TEMPERATURE` | `0.7` |
    /// | `CHAT_MAX_TOKENS` | `150` |
    ///
    /// # Errors
    /// Returns an error if:
    /// - A numeric variable is malformed
    /// - Azure Speech or Azure OpenAI settings are only partially provided
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        config.validate()?;
        Ok(config)
    }
}

use std::env;
use std::str::FromStr;

use super::utils::{normalize_endpoint, parse_env};
use super::yaml::YamlConfig;
use super::{DEFAULT_OPENAI_API_VERSION, ServerConfig};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration; `None` reads the environment only
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let speech = yaml.azure_speech.unwrap_or_default();
    let openai = yaml.azure_openai.unwrap_or_default();

    // YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .filter(|v| !v.trim().is_empty())
        };
    }

    let host = get_value!("HOST", server.host, "0.0.0.0");
    let port = parsed_or("PORT", server.port, 3001u16)?;
    let http_timeout_seconds =
        parsed_or("HTTP_TIMEOUT_SECONDS", server.http_timeout_seconds, 30u64)?;

    let azure_speech_key = get_optional!("AZURE_SPEECH_KEY", speech.key);
    let azure_speech_region = get_optional!("AZURE_SPEECH_REGION", speech.region);
    let azure_speech_endpoint = get_optional!("AZURE_SPEECH_ENDPOINT", speech.endpoint);

    let azure_openai_endpoint =
        get_optional!("AZURE_OPENAI_ENDPOINT", openai.endpoint).map(|e| normalize_endpoint(&e));
    let azure_openai_api_key = get_optional!("AZURE_OPENAI_API_KEY", openai.api_key);
    let azure_openai_deployment =
        get_optional!("AZURE_OPENAI_DEPLOYMENT_NAME", openai.deployment);
    let azure_openai_api_version = get_value!(
        "AZURE_OPENAI_API_VERSION",
        openai.api_version,
        DEFAULT_OPENAI_API_VERSION
    );
    let chat_temperature = parsed_or("CHAT_TEMPERATURE", openai.temperature, 0.7f32)?;
    let chat_max_tokens = parsed_or("CHAT_MAX_TOKENS", openai.max_tokens, 150u32)?;

    Ok(ServerConfig {
        host,
        port,
        http_timeout_seconds,
        azure_speech_key,
        azure_speech_region,
        azure_speech_endpoint,
        azure_openai_endpoint,
        azure_openai_api_key,
        azure_openai_deployment,
        azure_openai_api_version,
        chat_temperature,
        chat_max_tokens,
    })
}

fn parsed_or<T>(
    env_var: &str,
    yaml_value: Option<T>,
    default: T,
) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = yaml_value {
        return Ok(value);
    }
    Ok(parse_env(env_var)?.unwrap_or(default))
}

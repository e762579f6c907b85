use crate::core::providers::azure::AzureRegion;

/// Validate Azure Speech configuration
///
/// The subscription key and region must be provided together, and the region
/// must be a valid identifier since it ends up in host names.
pub fn validate_speech_config(
    key: &Option<String>,
    region: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    match (key, region) {
        (Some(_), None) => {
            Err("AZURE_SPEECH_REGION is required when AZURE_SPEECH_KEY is set".into())
        }
        (None, Some(_)) => {
            Err("AZURE_SPEECH_KEY is required when AZURE_SPEECH_REGION is set".into())
        }
        (Some(_), Some(region)) => {
            region
                .parse::<AzureRegion>()
                .map_err(|e| format!("Invalid AZURE_SPEECH_REGION: {e}"))?;
            Ok(())
        }
        (None, None) => Ok(()),
    }
}

/// Validate Azure OpenAI configuration
///
/// Endpoint, API key and deployment are all-or-nothing. The endpoint must be
/// an http(s) URL.
pub fn validate_openai_config(
    endpoint: &Option<String>,
    api_key: &Option<String>,
    deployment: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let present = [endpoint.is_some(), api_key.is_some(), deployment.is_some()];
    if present.iter().any(|p| *p) && !present.iter().all(|p| *p) {
        return Err(
            "AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY and AZURE_OPENAI_DEPLOYMENT_NAME must be configured together".into(),
        );
    }

    if let Some(endpoint) = endpoint
        && !(endpoint.starts_with("https://") || endpoint.starts_with("http://"))
    {
        return Err(format!("AZURE_OPENAI_ENDPOINT must be an http(s) URL: {endpoint}").into());
    }

    Ok(())
}

/// Validate chat completion parameters
pub fn validate_chat_parameters(
    temperature: f32,
    max_tokens: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(format!("CHAT_TEMPERATURE must be between 0 and 2, got {temperature}").into());
    }
    if max_tokens == 0 {
        return Err("CHAT_MAX_TOKENS must be greater than 0".into());
    }
    Ok(())
}

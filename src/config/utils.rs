use std::env;
use std::str::FromStr;

/// Parse an environment variable into `T`
///
/// Returns `Ok(None)` when the variable is unset or blank.
pub fn parse_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} environment variable: {e}")),
        _ => Ok(None),
    }
}

/// Ensure an endpoint URL ends with exactly one `/`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    format!("{}/", endpoint.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://acme.openai.azure.com"),
            "https://acme.openai.azure.com/"
        );
        assert_eq!(
            normalize_endpoint("https://acme.openai.azure.com//"),
            "https://acme.openai.azure.com/"
        );
    }

    #[test]
    fn test_parse_env_unset() {
        let value: Option<u16> = parse_env("INTERVUE_TEST_SURELY_UNSET").unwrap();
        assert!(value.is_none());
    }
}

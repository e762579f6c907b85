//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `speech` - Azure Speech credential issuance (`/api/azure-speech`)
//! - `chat` - Azure OpenAI streaming chat proxy (`/api/azure-chat`)

pub mod api;
pub mod chat;
pub mod speech;

pub use chat::azure_chat_handler;
pub use speech::azure_speech_handler;

const LOGGED_URL_LEN: usize = 50;

/// Shorten a URL for logging.
pub(crate) fn truncate_url(url: &str) -> String {
    if url.chars().count() <= LOGGED_URL_LEN {
        url.to_string()
    } else {
        let head: String = url.chars().take(LOGGED_URL_LEN).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_url() {
        assert_eq!(truncate_url("https://short.example"), "https://short.example");

        let long = format!("https://{}.example.com/path", "a".repeat(80));
        let truncated = truncate_url(&long);
        assert_eq!(truncated.len(), LOGGED_URL_LEN + 3);
        assert!(truncated.ends_with("..."));
    }
}

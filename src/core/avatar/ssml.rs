//! SSML payload construction for avatar speech.

/// Escapes text for safe embedding in an SSML document.
///
/// Replaces `&`, `<`, `>`, `"`, `'` and `/` with their entity forms. The
/// ampersand is handled in the same pass, so existing entities in the input
/// are escaped again rather than passed through.
///
/// # Example
///
/// ```rust
/// use intervue::core::avatar::escape_ssml_text;
///
/// assert_eq!(escape_ssml_text("a < b & c"), "a &lt; b &amp; c");
/// assert_eq!(escape_ssml_text("it's 1/2"), "it&#39;s 1&#x2F;2");
/// ```
pub fn escape_ssml_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            '/' => result.push_str("&#x2F;"),
            _ => result.push(c),
        }
    }
    result
}

/// Builds the SSML document sent to the avatar engine for one utterance.
///
/// The voice carries an exact zero leading silence so the avatar starts
/// moving its lips together with the audio.
///
/// # Arguments
///
/// * `text` - The text to speak (will be escaped)
/// * `voice_name` - Azure neural voice (e.g. "en-US-AvaMultilingualNeural")
/// * `language` - BCP-47 language tag (e.g. "en-US")
///
/// # Example
///
/// ```rust
/// use intervue::core::avatar::build_avatar_ssml;
///
/// let ssml = build_avatar_ssml("Hello!", "en-US-AvaMultilingualNeural", "en-US");
/// assert!(ssml.contains("<voice name='en-US-AvaMultilingualNeural'>"));
/// assert!(ssml.contains("<mstts:leadingsilence-exact value='0'/>Hello!"));
/// ```
pub fn build_avatar_ssml(text: &str, voice_name: &str, language: &str) -> String {
    let escaped_text = escape_ssml_text(text);
    let voice_name = escape_ssml_text(voice_name);
    let language = escape_ssml_text(language);

    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' \
         xmlns:mstts='http://www.w3.org/2001/mstts' xml:lang='{language}'>\
         <voice name='{voice_name}'>\
         <mstts:leadingsilence-exact value='0'/>{escaped_text}\
         </voice></speak>"
    )
}

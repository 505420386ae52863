//! Settings document schema.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_API_HOST: &str = "0.0.0.0";
const DEFAULT_API_PORT: u16 = 5001;
const DEFAULT_FAQ_FILE: &str = "FAQ.md";
const DEFAULT_BANNED_WORDS_FILE: &str = "banned_words.txt";

/// Reloadable settings, deserialized from the TOML config document.
///
/// Every field has a default so a partial document still loads. Serialized
/// back out as JSON by the control surface's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command prefix for addressing the bot without a mention.
    /// `None` disables prefix addressing.
    pub command_prefix: Option<String>,
    pub gemini_model: String,
    pub api_host: String,
    pub api_port: u16,
    pub faq_file: PathBuf,
    pub banned_words_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_prefix: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
            faq_file: PathBuf::from(DEFAULT_FAQ_FILE),
            banned_words_file: PathBuf::from(DEFAULT_BANNED_WORDS_FILE),
        }
    }
}

impl Settings {
    pub fn parse(document: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(document)
    }
}

use std::env;

use log::{debug, error, info};

use crate::error::Result;

/// Secrets the bot cannot start without, supplied via the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub discord_token: String,
    pub gemini_api_key: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        debug!("Loading credentials from environment");
        dotenvy::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").map_err(|e| {
            error!("Failed to load DISCORD_TOKEN from environment: {}", e);
            e
        })?;

        let gemini_api_key = env::var("GEMINI_API_KEY").map_err(|e| {
            error!("Failed to load GEMINI_API_KEY from environment: {}", e);
            e
        })?;

        info!("Credentials loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!(
            "Gemini API key length: {} characters",
            gemini_api_key.len()
        );

        Ok(Self {
            discord_token,
            gemini_api_key,
        })
    }
}

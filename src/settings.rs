use std::env;
use std::time::Duration;

use log::warn;

use crate::gateway::DEFAULT_COOLDOWN_MS;

/// Runtime configuration, read from environment variables (a `.env` file is
/// honored when the binary loads one via dotenvy).
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ai_cooldown: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set - AI features will be unavailable");
        }

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let cooldown_ms = env::var("AI_COOLDOWN_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_COOLDOWN_MS);

        Self {
            gemini_api_key,
            gemini_model,
            ai_cooldown: Duration::from_millis(cooldown_ms),
        }
    }
}

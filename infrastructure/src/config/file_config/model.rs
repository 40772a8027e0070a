//! Model configuration from TOML (`[model]` section)

use serde::{Deserialize, Serialize};

/// Endpoint of an OpenAI-compatible chat completions API.
///
/// The key itself never lives in the config file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub endpoint: String,
    pub name: String,
    pub api_key_env: String,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            name: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl FileModelConfig {
    /// API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

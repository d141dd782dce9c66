// Configuration loading
use anyhow::Error;
use config::{Config, Environment, File};
use serde::Deserialize;

// Crate-wide configuration: an optional `reagent.toml` merged with
// REAGENT_-prefixed environment variables (REAGENT_LLM__MODEL, ...). The
// conventional OPENAI_API_KEY / SERPAPI_API_KEY variables are honored as
// fallbacks for the two key fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub memory: MemorySettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub api_key: String,
    pub num_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub data_dir: String,
    pub recent_messages: usize,
    pub summary_threshold: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            memory: MemorySettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            num_results: 5,
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            data_dir: "./data/memory".to_string(),
            recent_messages: 10,
            summary_threshold: 3500,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6000".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `reagent.toml` (if present) and the environment.
    pub fn load() -> Result<Self, Error> {
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("reagent").required(false))
            .add_source(Environment::with_prefix("REAGENT").separator("__"))
            .build()?
            .try_deserialize()?;

        if settings.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                settings.llm.api_key = key;
            }
        }
        if settings.search.api_key.is_empty() {
            if let Ok(key) = std::env::var("SERPAPI_API_KEY") {
                settings.search.api_key = key;
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.llm.model, "gpt-3.5-turbo");
        assert_eq!(settings.search.num_results, 5);
        assert_eq!(settings.memory.recent_messages, 10);
        assert_eq!(settings.server.address, "127.0.0.1:6000");
    }
}

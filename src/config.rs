use std::env;

use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
You should be friendly, informative, and try to help the user with their questions. \
Keep your responses simple and direct but complete.";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_P: f32 = 0.9;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;
const DEFAULT_MEMORY_WINDOW: usize = 6;
const DEFAULT_LANGSMITH_PROJECT: &str = "parley";

/// Optional LangSmith trace-export credentials. Presence is reported at
/// startup; the export itself is handled out of process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangsmithSettings {
    pub api_key: String,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
    pub max_history_messages: usize,
    pub memory_window: usize,
    pub langsmith: Option<LangsmithSettings>,
}

impl Settings {
    /// Reads settings from the process environment. `OLLAMA_MODEL` is the
    /// only required variable; every other value has a default, and invalid
    /// optional values fall back to their defaults rather than failing.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let model = get_var("OLLAMA_MODEL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                Error::configuration(
                    "OLLAMA_MODEL is not set. Set it to an installed model, e.g. \
                     OLLAMA_MODEL=qwen2.5:3b (install with `ollama pull qwen2.5:3b`).",
                )
            })?;

        let langsmith = get_var("LANGSMITH_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|api_key| LangsmithSettings {
                api_key,
                project: get_var("LANGSMITH_PROJECT")
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_LANGSMITH_PROJECT.to_string()),
            });

        Ok(Self {
            model,
            base_url: get_var("OLLAMA_BASE_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: parse_temperature(get_var("MODEL_TEMPERATURE").as_deref()),
            top_p: parse_top_p(get_var("MODEL_TOP_P").as_deref()),
            timeout_secs: parse_positive_u64(
                get_var("MODEL_TIMEOUT_SECS").as_deref(),
                DEFAULT_TIMEOUT_SECS,
            ),
            max_history_messages: parse_positive_usize(
                get_var("MAX_HISTORY_MESSAGES").as_deref(),
                DEFAULT_MAX_HISTORY_MESSAGES,
            ),
            memory_window: parse_positive_usize(
                get_var("MEMORY_WINDOW").as_deref(),
                DEFAULT_MEMORY_WINDOW,
            ),
            langsmith,
        })
    }
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_temperature(raw: Option<&str>) -> f32 {
    parse_f32_in_range(raw, 0.0, 2.0, DEFAULT_TEMPERATURE)
}

fn parse_top_p(raw: Option<&str>) -> f32 {
    parse_f32_in_range(raw, 0.0, 1.0, DEFAULT_TOP_P)
}

fn parse_f32_in_range(raw: Option<&str>, min: f32, max: f32, default: f32) -> f32 {
    raw.and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite() && *value >= min && *value <= max)
        .unwrap_or(default)
}

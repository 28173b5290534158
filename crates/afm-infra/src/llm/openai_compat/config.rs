//! Configuration and per-provider defaults for OpenAI-compatible endpoints.

use secrecy::SecretString;

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name reported in logs and spans ("openai", "anthropic").
    pub provider_name: String,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when the request leaves `model` empty.
    pub model: String,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// OpenAI defaults.
pub fn openai_defaults(api_key: SecretString, model: Option<&str>) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.unwrap_or(OPENAI_DEFAULT_MODEL).into(),
    }
}

/// Anthropic through its OpenAI-compatible endpoint.
pub fn anthropic_defaults(api_key: SecretString, model: Option<&str>) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "anthropic".into(),
        base_url: ANTHROPIC_BASE_URL.into(),
        api_key,
        model: model.unwrap_or(ANTHROPIC_DEFAULT_MODEL).into(),
    }
}

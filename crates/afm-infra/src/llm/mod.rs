//! LLM provider implementations and the provider factory.
//!
//! [`create_provider`] turns the `model` block of an agent document into a
//! concrete [`OpenAiCompatibleProvider`], resolving the API key from the
//! document's authentication block or the provider's environment variable.

pub mod openai_compat;

use secrecy::SecretString;

use afm_types::agent::{ClientAuthentication, Model};
use afm_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{anthropic_defaults, openai_defaults};

/// Providers the factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Result<Self, LlmError> {
        match name.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(LlmError::InvalidRequest(format!(
                "unsupported model provider '{other}' (supported: openai, anthropic)"
            ))),
        }
    }

    /// Environment variable consulted when the document carries no key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Build a provider from the document's `model` block using the process
/// environment for key fallback.
pub fn create_provider(model: Option<&Model>) -> Result<OpenAiCompatibleProvider, LlmError> {
    create_provider_with(model, |name| std::env::var(name).ok())
}

/// Build a provider with an injected environment lookup.
pub fn create_provider_with<F>(
    model: Option<&Model>,
    lookup: F,
) -> Result<OpenAiCompatibleProvider, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = ProviderKind::parse(
        model
            .and_then(|m| m.provider.as_deref())
            .unwrap_or("openai"),
    )?;
    let api_key = resolve_api_key(kind, model.and_then(|m| m.authentication.as_ref()), lookup)?;
    let model_name = model.and_then(|m| m.name.as_deref());

    let mut config = match kind {
        ProviderKind::OpenAi => openai_defaults(api_key, model_name),
        ProviderKind::Anthropic => anthropic_defaults(api_key, model_name),
    };
    if let Some(url) = model.and_then(|m| m.url.as_deref()) {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    tracing::info!(
        provider = %config.provider_name,
        model = %config.model,
        base_url = %config.base_url,
        "configured LLM provider"
    );
    Ok(OpenAiCompatibleProvider::new(config))
}

fn resolve_api_key<F>(
    kind: ProviderKind,
    authentication: Option<&ClientAuthentication>,
    lookup: F,
) -> Result<SecretString, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(auth) = authentication {
        let from_document = match auth.kind.to_lowercase().as_str() {
            "bearer" => auth.token.clone(),
            "api-key" => auth.api_key.clone(),
            "basic" => {
                return Err(LlmError::InvalidRequest(
                    "basic authentication is not supported for model providers".into(),
                ));
            }
            _ => auth
                .token
                .clone()
                .or_else(|| auth.api_key.clone())
                .or_else(|| extra_string(auth, "key"))
                .or_else(|| extra_string(auth, "apiKey")),
        };
        if let Some(key) = from_document {
            return Ok(SecretString::from(key));
        }
    }

    let var = kind.api_key_env();
    lookup(var)
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            LlmError::InvalidRequest(format!(
                "no API key for provider: set {var} or add model.authentication"
            ))
        })
}

fn extra_string(auth: &ClientAuthentication, key: &str) -> Option<String> {
    auth.extra.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use afm_core::llm::LlmProvider;
    use secrecy::ExposeSecret;
    use std::collections::BTreeMap;

    fn auth(kind: &str) -> ClientAuthentication {
        ClientAuthentication {
            kind: kind.to_string(),
            token: None,
            username: None,
            password: None,
            api_key: None,
            extra: BTreeMap::new(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env(name: &str) -> Option<String> {
        match name {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "ANTHROPIC_API_KEY" => Some("ant-env".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_to_openai() {
        let provider = create_provider_with(None, env).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_anthropic_with_model_and_url() {
        let model = Model {
            name: Some("claude-opus-4-1".to_string()),
            provider: Some("Anthropic".to_string()),
            url: Some("https://gateway.example.com/v1/".to_string()),
            authentication: None,
        };
        let provider = create_provider_with(Some(&model), env).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.default_model(), "claude-opus-4-1");
        assert_eq!(provider.base_url(), "https://gateway.example.com/v1");
    }

    #[test]
    fn test_unknown_provider() {
        let model = Model {
            provider: Some("acme".to_string()),
            ..Model::default()
        };
        let err = create_provider_with(Some(&model), env).err().unwrap();
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn test_missing_key_names_variable() {
        let err = create_provider_with(None, no_env).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_key_resolution_order() {
        let mut bearer = auth("bearer");
        bearer.token = Some("doc-token".to_string());
        let key = resolve_api_key(ProviderKind::OpenAi, Some(&bearer), env).unwrap();
        assert_eq!(key.expose_secret(), "doc-token");

        let mut api_key = auth("api-key");
        api_key.api_key = Some("doc-key".to_string());
        let key = resolve_api_key(ProviderKind::OpenAi, Some(&api_key), env).unwrap();
        assert_eq!(key.expose_secret(), "doc-key");

        let mut custom = auth("custom");
        custom.extra.insert("apiKey".to_string(), serde_json::json!("extra-key"));
        let key = resolve_api_key(ProviderKind::OpenAi, Some(&custom), env).unwrap();
        assert_eq!(key.expose_secret(), "extra-key");

        let key = resolve_api_key(ProviderKind::Anthropic, Some(&auth("custom")), env).unwrap();
        assert_eq!(key.expose_secret(), "ant-env");
    }

    #[test]
    fn test_basic_auth_rejected() {
        let mut basic = auth("basic");
        basic.username = Some("u".to_string());
        basic.password = Some("p".to_string());
        assert!(resolve_api_key(ProviderKind::OpenAi, Some(&basic), env).is_err());
    }
}

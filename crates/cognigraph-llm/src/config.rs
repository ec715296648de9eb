//! Provider configuration and selection.
//!
//! Keys come from the environment only; there is no config file because
//! the server keeps no durable state.

use tracing::info;

use crate::types::{Provider, ProviderHandle};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GITHUB_MODEL: &str = "gpt-4o-mini";

/// LLM configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// "auto" or a provider name.
    pub preferred_provider: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// GitHub Models key (`MODEL_API_KEY`).
    pub github_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    pub groq_model: String,
    pub github_model: String,
}

impl LlmConfig {
    /// Read provider keys and model overrides from the environment.
    pub fn from_env() -> Self {
        let config = Self {
            preferred_provider: std::env::var("COGNIGRAPH_PROVIDER").unwrap_or_else(|_| "auto".into()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            github_api_key: std::env::var("MODEL_API_KEY").ok(),
            openai_model: env_or("COGNIGRAPH_OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            anthropic_model: env_or("COGNIGRAPH_ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
            groq_model: env_or("COGNIGRAPH_GROQ_MODEL", DEFAULT_GROQ_MODEL),
            github_model: env_or("COGNIGRAPH_GITHUB_MODEL", DEFAULT_GITHUB_MODEL),
        };

        match config.resolve() {
            Some(handle) => info!(
                "LLM provider: {} (model {})",
                handle.provider, handle.model
            ),
            None => info!("no LLM provider configured; upload and chat will fail"),
        }

        config
    }

    /// Resolve which provider and model to use.
    pub fn resolve(&self) -> Option<ProviderHandle> {
        if self.preferred_provider != "auto" {
            return Provider::parse(&self.preferred_provider).and_then(|p| self.handle_for(p));
        }

        // Auto mode: Anthropic > Groq > OpenAI > GitHub Models.
        [
            Provider::Anthropic,
            Provider::Groq,
            Provider::OpenAI,
            Provider::Github,
        ]
        .iter()
        .find_map(|&p| self.handle_for(p))
    }

    /// Resolve a provider the caller asked for by name, falling back to
    /// the configured selection when the name is unknown or unconfigured.
    pub fn resolve_named(&self, name: &str) -> Option<ProviderHandle> {
        Provider::parse(name)
            .and_then(|p| self.handle_for(p))
            .or_else(|| self.resolve())
    }

    fn handle_for(&self, provider: Provider) -> Option<ProviderHandle> {
        let (key, model) = match provider {
            Provider::OpenAI => (&self.openai_api_key, &self.openai_model),
            Provider::Anthropic => (&self.anthropic_api_key, &self.anthropic_model),
            Provider::Groq => (&self.groq_api_key, &self.groq_model),
            Provider::Github => (&self.github_api_key, &self.github_model),
        };
        key.as_ref().map(|k| ProviderHandle {
            provider,
            model: model.clone(),
            api_key: k.clone(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> LlmConfig {
        LlmConfig {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            github_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            groq_model: DEFAULT_GROQ_MODEL.into(),
            github_model: DEFAULT_GITHUB_MODEL.into(),
        }
    }

    #[test]
    fn test_resolve_none_without_keys() {
        assert!(bare_config().resolve().is_none());
    }

    #[test]
    fn test_auto_prefers_anthropic() {
        let mut config = bare_config();
        config.openai_api_key = Some("sk-a".into());
        config.anthropic_api_key = Some("sk-b".into());

        let handle = config.resolve().unwrap();
        assert_eq!(handle.provider, Provider::Anthropic);
        assert_eq!(handle.model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_named_falls_back_when_unconfigured() {
        let mut config = bare_config();
        config.groq_api_key = Some("gsk".into());

        // Asking for openai (no key) still yields the configured provider.
        let handle = config.resolve_named("openai").unwrap();
        assert_eq!(handle.provider, Provider::Groq);

        let handle = config.resolve_named("groq").unwrap();
        assert_eq!(handle.provider, Provider::Groq);
    }

    #[test]
    fn test_explicit_preference() {
        let mut config = bare_config();
        config.preferred_provider = "openai".into();
        config.openai_api_key = Some("sk".into());
        config.anthropic_api_key = Some("sk2".into());

        assert_eq!(config.resolve().unwrap().provider, Provider::OpenAI);
    }
}

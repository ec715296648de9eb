//! Non-streaming chat-completion requests.
//!
//! OpenAI, Groq and GitHub Models share one wire format; Anthropic uses
//! its Messages API with the system prompt hoisted out of the message
//! list. Transport errors surface as `Error::Http`; HTTP-level failures
//! are returned in the `ProviderReply` for the guard to classify.

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use cognigraph_core::{Error, Result};

use crate::types::{ChatMessage, Provider, ProviderHandle};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const GITHUB_URL: &str = "https://models.inference.ai.azure.com/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// A chat-completion request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: usize,
    /// Ask OpenAI-compatible providers for a JSON object response.
    pub json_mode: bool,
}

/// Raw provider response, with the headers the guard needs to classify it.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub status: u16,
    pub retry_after: Option<String>,
    pub rate_limit_reset: Option<String>,
    pub body: String,
}

/// Issue one provider call and capture status, rate-limit headers, body.
pub async fn send(
    client: &Client,
    handle: &ProviderHandle,
    req: &CompletionRequest,
) -> Result<ProviderReply> {
    let builder = match handle.provider {
        Provider::OpenAI => client
            .post(OPENAI_URL)
            .bearer_auth(&handle.api_key)
            .json(&openai_payload(&handle.model, req)),
        Provider::Groq => client
            .post(GROQ_URL)
            .bearer_auth(&handle.api_key)
            .json(&openai_payload(&handle.model, req)),
        Provider::Github => client
            .post(GITHUB_URL)
            .bearer_auth(&handle.api_key)
            .json(&openai_payload(&handle.model, req)),
        Provider::Anthropic => client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &handle.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&anthropic_payload(&handle.model, req)),
    };

    debug!("calling {} (model {})", handle.provider, handle.model);

    let response = builder
        .send()
        .await
        .map_err(|e| Error::Http(format!("request to {} failed: {}", handle.provider, e)))?;

    let status = response.status().as_u16();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let retry_after = header("retry-after");
    let rate_limit_reset = header("x-ratelimit-reset-requests");

    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading {} response failed: {}", handle.provider, e)))?;

    Ok(ProviderReply {
        status,
        retry_after,
        rate_limit_reset,
        body,
    })
}

fn openai_payload(model: &str, req: &CompletionRequest) -> serde_json::Value {
    let mut payload = json!({
        "model": model,
        "messages": req.messages,
        "temperature": req.temperature,
        "max_tokens": req.max_tokens,
    });
    if req.json_mode {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}

fn anthropic_payload(model: &str, req: &CompletionRequest) -> serde_json::Value {
    let system: Vec<&str> = req
        .messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    let conversation: Vec<&ChatMessage> =
        req.messages.iter().filter(|m| m.role != "system").collect();

    let mut payload = json!({
        "model": model,
        "messages": conversation,
        "temperature": req.temperature,
        "max_tokens": req.max_tokens,
    });
    if !system.is_empty() {
        payload["system"] = json!(system.join("\n\n"));
    }
    payload
}

/// Pull the assistant text out of a successful response body.
pub fn extract_content(provider: Provider, body: &str) -> Result<String> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Provider(format!("unparseable {} response: {}", provider, e)))?;

    let content = match provider {
        Provider::OpenAI | Provider::Groq | Provider::Github => {
            parsed["choices"][0]["message"]["content"].as_str()
        }
        Provider::Anthropic => parsed["content"][0]["text"].as_str(),
    };

    content
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Provider(format!("{} response had no content", provider)))
}

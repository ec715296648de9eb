//! Rate-limit classification for provider calls.
//!
//! Turns raw provider replies into the shared error taxonomy. Rate
//! limits always carry a numeric retry-after: parsed from the reply's
//! headers when present, otherwise the configured fallback. The guard
//! does not retry; ingestion and chat decide what a rate limit means.

use reqwest::Client;
use tracing::warn;

use cognigraph_core::{Error, Result};

use crate::client::{self, CompletionRequest, ProviderReply};
use crate::types::ProviderHandle;

/// Wraps every generation-provider call.
#[derive(Debug, Clone)]
pub struct RateLimitGuard {
    fallback_secs: u64,
}

impl RateLimitGuard {
    pub fn new(fallback_secs: u64) -> Self {
        Self { fallback_secs }
    }

    /// Call the provider and return the assistant text, or a classified error.
    pub async fn call(
        &self,
        client: &Client,
        handle: &ProviderHandle,
        req: &CompletionRequest,
    ) -> Result<String> {
        let reply = client::send(client, handle, req).await?;
        self.interpret(handle, reply)
    }

    /// Classify a provider reply. Split out from `call` so tests can
    /// exercise classification without a network.
    pub fn interpret(&self, handle: &ProviderHandle, reply: ProviderReply) -> Result<String> {
        if (200..300).contains(&reply.status) {
            return client::extract_content(handle.provider, &reply.body);
        }

        if reply.status == 429 || body_mentions_rate_limit(&reply.body) {
            let retry_after_secs = reply
                .retry_after
                .as_deref()
                .and_then(parse_seconds)
                .or_else(|| reply.rate_limit_reset.as_deref().and_then(parse_seconds))
                .unwrap_or(self.fallback_secs);
            warn!(
                "{} rate limited (status {}), retry after {}s",
                handle.provider, reply.status, retry_after_secs
            );
            return Err(Error::RateLimited { retry_after_secs });
        }

        Err(Error::Provider(format!(
            "{} returned status {}: {}",
            handle.provider,
            reply.status,
            truncate(&reply.body, 300)
        )))
    }
}

fn body_mentions_rate_limit(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("rate limit") || lower.contains("rate_limit")
}

/// Parse a retry-after header value as seconds, rounding up fractions.
fn parse_seconds(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    value.parse::<f64>().ok().and_then(|f| {
        if f.is_finite() && f >= 0.0 {
            Some(f.ceil() as u64)
        } else {
            None
        }
    })
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        text.to_string()
    } else {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

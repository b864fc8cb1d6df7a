//! Picks a concrete [`LlmProvider`] for a model id (spec §6: `model.name`,
//! `apiKey`/`baseUrl` with env fallback).

use halcyon_llm::{ClaudeProvider, LlmProvider, OpenAiCompatProvider, ProviderConfig};

/// Build a provider for `model`. Model ids starting with `claude` use the
/// Anthropic messages API; everything else is treated as an
/// OpenAI-compatible chat-completions endpoint (OpenAI itself, or any
/// self-hosted server speaking the same wire format).
///
/// # Errors
///
/// Returns an error string when no API key is available and the model
/// isn't a local/keyless endpoint.
pub fn build_provider(
    model: &str,
    api_key: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn LlmProvider>, String> {
    let is_claude = model.starts_with("claude");

    if is_claude {
        let api_key = api_key.ok_or_else(|| {
            "no API key configured — set model.apiKey, API_KEY, or ANTHROPIC_API_KEY".to_owned()
        })?;
        let mut config = ProviderConfig::new(api_key, model);
        if let Some(base_url) = base_url {
            config = config.base_url(base_url);
        }
        return Ok(Box::new(ClaudeProvider::new(config)));
    }

    match (api_key, base_url) {
        (Some(key), Some(url)) => Ok(Box::new(OpenAiCompatProvider::custom(key, model, url))),
        (Some(key), None) => Ok(Box::new(OpenAiCompatProvider::openai(key, model))),
        (None, Some(url)) => Ok(Box::new(OpenAiCompatProvider::custom("", model, url))),
        (None, None) => Err("no API key configured — set model.apiKey, API_KEY, or OPENAI_API_KEY".to_owned()),
    }
}

//! Environment variable fallback resolution.
//!
//! Env vars are the lowest-priority layer: they only fill fields the file
//! layers left unset. `ApiKey`/`BaseUrl` specifically fall back through a
//! pair of candidate names each, matching the two-provider-family
//! convention (`halcyon`-native and OpenAI-compatible).

use std::collections::HashMap;

use crate::types::Config;

/// Snapshot the subset of process environment variables halcyon looks at.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    const KEYS: &[&str] = &[
        "API_KEY",
        "OPENAI_API_KEY",
        "BASE_URL",
        "OPENAI_API_BASE_URL",
        "HALCYON_HOME",
        "HALCYON_LOG",
        "RUST_LOG",
    ];
    KEYS.iter()
        .filter_map(|k| std::env::var(k).ok().map(|v| ((*k).to_owned(), v)))
        .collect()
}

/// Fill `api_key` / `base_url` from env vars if the file layers left them
/// unset. Returns the number of fields filled this way.
pub fn apply_env_fallbacks(config: &mut Config, env_vars: &HashMap<String, String>) -> usize {
    let mut count = 0;

    if config.model.api_key.is_none() {
        if let Some(key) = env_vars
            .get("API_KEY")
            .or_else(|| env_vars.get("OPENAI_API_KEY"))
        {
            config.model.api_key = Some(key.clone());
            count += 1;
        }
    }

    if config.model.base_url.is_none() {
        if let Some(url) = env_vars
            .get("BASE_URL")
            .or_else(|| env_vars.get("OPENAI_API_BASE_URL"))
        {
            config.model.base_url = Some(url.clone());
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_falls_back_to_openai_name() {
        let mut config = Config::default();
        let mut env = HashMap::new();
        env.insert("OPENAI_API_KEY".to_owned(), "sk-from-env".to_owned());

        let filled = apply_env_fallbacks(&mut config, &env);
        assert_eq!(filled, 1);
        assert_eq!(config.model.api_key.as_deref(), Some("sk-from-env"));
    }

    #[test]
    fn file_layer_wins_over_env() {
        let mut config = Config::default();
        config.model.api_key = Some("sk-from-file".to_owned());
        let mut env = HashMap::new();
        env.insert("API_KEY".to_owned(), "sk-from-env".to_owned());

        apply_env_fallbacks(&mut config, &env);
        assert_eq!(config.model.api_key.as_deref(), Some("sk-from-file"));
    }
}

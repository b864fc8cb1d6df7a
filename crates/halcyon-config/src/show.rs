//! Resolved configuration display, backing the `/config` slash command.

use crate::merge::FieldSources;
use crate::types::Config;

/// Output of [`crate::Config::load`]: the merged config plus provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The fully merged, validated configuration.
    pub config: Config,
    /// Which layer set each leaf field.
    pub field_sources: FieldSources,
    /// Paths of every config file that contributed a layer, in the order
    /// they were merged.
    pub loaded_files: Vec<String>,
}

/// Rendering requested by `/config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// Human-readable summary, one field per line.
    Pretty,
    /// Pretty-printed JSON of the config (secrets redacted via `Serialize`).
    Json,
}

impl ResolvedConfig {
    /// Render the resolved configuration in the requested format.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails to serialise to JSON, which would
    /// indicate a bug in a hand-written `Serialize` impl rather than bad
    /// user input.
    #[must_use]
    pub fn render(&self, format: ShowFormat) -> String {
        match format {
            ShowFormat::Json => {
                serde_json::to_string_pretty(&self.config).expect("config always serialises")
            },
            ShowFormat::Pretty => {
                let mut out = String::new();
                out.push_str(&format!("model.name = {}\n", self.config.model.name));
                out.push_str(&format!(
                    "model.temperature = {}\n",
                    self.config.model.temperature
                ));
                out.push_str(&format!("approval = {:?}\n", self.config.approval));
                out.push_str(&format!("max_turns = {}\n", self.config.max_turns));
                out.push_str(&format!("hooks_enabled = {}\n", self.config.hooks_enabled));
                out.push_str(&format!(
                    "mcp_servers = {}\n",
                    self.config.mcp_servers.len()
                ));
                if !self.loaded_files.is_empty() {
                    out.push_str(&format!("loaded files:\n  {}\n", self.loaded_files.join("\n  ")));
                }
                out
            },
        }
    }

    /// Where a given dotted field path's value came from, if tracked.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&crate::merge::ConfigLayer> {
        self.field_sources.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn pretty_render_includes_model_name() {
        let resolved = ResolvedConfig {
            config: Config::default(),
            field_sources: HashMap::new(),
            loaded_files: Vec::new(),
        };
        let rendered = resolved.render(ShowFormat::Pretty);
        assert!(rendered.contains("model.name"));
    }

    #[test]
    fn json_render_omits_api_key() {
        let mut config = Config::default();
        config.model.api_key = Some("sk-secret".to_owned());
        let resolved = ResolvedConfig {
            config,
            field_sources: HashMap::new(),
            loaded_files: Vec::new(),
        };
        let rendered = resolved.render(ShowFormat::Json);
        assert!(!rendered.contains("sk-secret"));
    }
}

//! Config file discovery and layered loading.
//!
//! Implements `Config::load()`:
//! 1. Parse the embedded `defaults.toml` → base.
//! 2. Merge `{config-dir}/config.toml` (user).
//! 3. Merge `{cwd}/.halcyon/config.toml` (project).
//! 4. Apply env var fallbacks for unset fields.
//! 5. Deserialize the merged tree → [`Config`].
//! 6. Validate.
//! 7. Return a [`ResolvedConfig`].

use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_defaults};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB), guarding against accidentally
/// pointing this at a huge or non-config file.
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the unified configuration with layered file precedence.
///
/// `project_root` is the root the project-level layer is searched under
/// (typically `cwd`). If `None`, that layer is skipped. `config_dir`
/// overrides user-level config discovery; when `None`,
/// [`halcyon_core::dirs::config_dir`] is used if the `halcyon-core`
/// feature of the caller links it — callers outside the workspace should
/// always pass an explicit directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or the
/// final merged configuration fails validation.
pub fn load(project_root: Option<&Path>, config_dir: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let env_vars = collect_env_vars();

    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_defaults(&merged, "", &mut field_sources);

    if let Some(dir) = config_dir {
        let user_path = dir.join("config.toml");
        if let Some(overlay) = try_load_file(&user_path)? {
            deep_merge_tracking(&mut merged, &overlay, "", &ConfigLayer::User, &mut field_sources);
            loaded_files.push(user_path.display().to_string());
            info!(path = %user_path.display(), "loaded user config");
        }
    }

    if let Some(root) = project_root {
        let project_path = root.join(".halcyon").join("config.toml");
        if let Some(overlay) = try_load_file(&project_path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                &ConfigLayer::Project,
                &mut field_sources,
            );
            loaded_files.push(project_path.display().to_string());
            info!(path = %project_path.display(), "loaded project config");
        }
    }

    let mut config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    let env_count = apply_env_fallbacks(&mut config, &env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
        if config.model.api_key.is_some() {
            field_sources.insert("model.api_key".to_owned(), ConfigLayer::Environment);
        }
        if config.model.base_url.is_some() {
            field_sources.insert("model.base_url".to_owned(), ConfigLayer::Environment);
        }
    }

    validate::validate(&config)?;

    if let Some(root) = project_root {
        if config.cwd.is_none() {
            config.cwd = Some(root.to_path_buf());
        }
    }

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path, with no layering.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                metadata.len()
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if it doesn't exist. Reads the
/// file in a single pass (no separate stat-then-read) to avoid a TOCTOU
/// race on the existence check.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let val: toml::Value = toml::from_str(DEFAULTS_TOML).unwrap();
        assert!(val.as_table().unwrap().contains_key("model"));
    }

    #[test]
    fn defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config.model.name, "claude-sonnet-4-20250514");
        assert_eq!(config.max_turns, 100);
    }

    #[test]
    fn load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn try_load_file_missing_returns_none() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_without_any_files_succeeds_via_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load(Some(dir.path()), Some(dir.path())).unwrap();
        assert_eq!(resolved.config.model.name, "claude-sonnet-4-20250514");
        assert!(resolved.loaded_files.is_empty());
    }

    #[test]
    fn project_layer_overrides_user_layer() {
        let user_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            user_dir.path().join("config.toml"),
            "[model]\nname = \"from-user\"\n",
        )
        .unwrap();

        let project_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(project_dir.path().join(".halcyon")).unwrap();
        std::fs::write(
            project_dir.path().join(".halcyon").join("config.toml"),
            "[model]\nname = \"from-project\"\n",
        )
        .unwrap();

        let resolved = load(Some(project_dir.path()), Some(user_dir.path())).unwrap();
        assert_eq!(resolved.config.model.name, "from-project");
        assert_eq!(
            resolved.source_of("model.name"),
            Some(&ConfigLayer::Project)
        );
    }

    #[test]
    fn oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}

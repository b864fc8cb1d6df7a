//! Platform data/config directory resolution.
//!
//! | Platform | Data dir | Config dir |
//! |---|---|---|
//! | Linux | `~/.local/share/halcyon` | `~/.config/halcyon` |
//! | macOS | `~/Library/Application Support/halcyon` | same as data dir |
//! | Windows | `%LOCALAPPDATA%/halcyon` | `%APPDATA%/halcyon` |

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{CoreError, CoreResult};

const QUALIFIER: &str = "";
const ORGANIZATION: &str = "";
const APPLICATION: &str = "halcyon";

fn project_dirs() -> CoreResult<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or(CoreError::NoPlatformDir {
        kind: "home",
    })
}

/// The platform data directory, creating it if absent.
pub fn data_dir() -> CoreResult<PathBuf> {
    let dirs = project_dirs()?;
    let path = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// The platform config directory, creating it if absent.
pub fn config_dir() -> CoreResult<PathBuf> {
    let dirs = project_dirs()?;
    let path = dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// `{data_dir}/sessions` — session snapshot storage.
pub fn sessions_dir() -> CoreResult<PathBuf> {
    let path = data_dir()?.join("sessions");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// `{data_dir}/checkpoints` — mid-session checkpoint storage.
pub fn checkpoints_dir() -> CoreResult<PathBuf> {
    let path = data_dir()?.join("checkpoints");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// `{data_dir}/user_memory.json` — persistent cross-session memory store.
pub fn user_memory_path() -> CoreResult<PathBuf> {
    Ok(data_dir()?.join("user_memory.json"))
}

/// `{cwd}/.halcyon/tools` — workspace-local tool descriptor directory.
#[must_use]
pub fn workspace_tools_dir(cwd: &std::path::Path) -> PathBuf {
    cwd.join(".halcyon").join("tools")
}

/// `{config_dir}/tools` — user-global tool descriptor directory.
pub fn global_tools_dir() -> CoreResult<PathBuf> {
    Ok(config_dir()?.join("tools"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_config_dirs_resolve() {
        // ProjectDirs::from only fails if no home directory can be found at
        // all, which isn't true in any CI or dev environment we run in.
        let data = data_dir().expect("data dir resolves");
        let config = config_dir().expect("config dir resolves");
        assert!(data.ends_with("halcyon") || data.to_string_lossy().contains("halcyon"));
        assert!(config.ends_with("halcyon") || config.to_string_lossy().contains("halcyon"));
    }

    #[test]
    fn workspace_tools_dir_is_relative_to_cwd() {
        let cwd = std::path::Path::new("/tmp/project");
        let dir = workspace_tools_dir(cwd);
        assert_eq!(dir, std::path::Path::new("/tmp/project/.halcyon/tools"));
    }
}

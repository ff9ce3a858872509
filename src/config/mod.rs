mod settings;
mod view;

pub use settings::{ApiSettings, Config, ExportSettings};
pub use view::{Completion, FetchTicket, ReportView};

use crate::error::{MessError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.token`
pub const TOKEN_ENV: &str = "MESS_API_TOKEN";

/// Directory holding `config.toml`, `view.json` and exports: the platform
/// config dir for `mess` (`~/.config/mess` on Linux), or `~/.mess` when the
/// platform dirs cannot be determined
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "mess")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| dirs_home().map(|home| home.join(".mess")))
        .ok_or_else(|| {
            MessError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no platform config directory or HOME for the mess config",
            ))
        })
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the export directory; relative paths are taken from the config dir
pub fn resolve_output_dir(output_dir: &str, cfg_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        cfg_dir.join(path)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(MessError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let mut config: Config =
        toml::from_str(&content).map_err(|e| MessError::ConfigParse { path, source: e })?;

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.api.token = Some(token);
        }
    }
    Ok(config)
}

/// Load view.json (empty view if missing)
pub fn load_view(config_dir: &Path) -> Result<ReportView> {
    let path = config_dir.join("view.json");
    if !path.exists() {
        return Ok(ReportView::default());
    }
    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|source| MessError::ViewState { path, source })
}

/// Save view.json
pub fn save_view(config_dir: &Path, view: &ReportView) -> Result<()> {
    let path = config_dir.join("view.json");
    let content = serde_json::to_string_pretty(view).map_err(|e| {
        MessError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
base_url = "http://localhost:8000/api"
# token = "paste-your-access-token"   # optional, or set MESS_API_TOKEN
timeout_secs = 15

[export]
output_dir = "exports"   # relative paths are inside this config directory
"#;

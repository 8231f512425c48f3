use std::fs;
use std::path::Path;
use std::path::PathBuf;

use formplayer_core::config::Config;

use crate::args::CliArgs;

pub const FIXTURE_APP_ID: &str = "abc123";

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("formplayer").join("config.toml"))
}

/// Reads `explicit` (which must exist), else the per-user config file when
/// there is one, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("could not read config {}: {err}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .map_err(|err| format!("could not parse config {}: {err}", path.display()))?;
    Ok(config)
}

/// Command-line options win over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub app_id: String,
    pub history_path: PathBuf,
    pub apps_path: Option<PathBuf>,
}

pub fn resolve(args: &CliArgs, config: &Config) -> Resolved {
    Resolved {
        app_id: args
            .app_id
            .clone()
            .or_else(|| config.session.default_app_id.clone())
            .unwrap_or_else(|| FIXTURE_APP_ID.to_string()),
        history_path: args
            .history
            .clone()
            .or_else(|| config.storage.history_path.clone())
            .unwrap_or_else(|| PathBuf::from(".formplayer").join("history.jsonl")),
        apps_path: args.apps.clone().or_else(|| config.storage.apps_path.clone()),
    }
}

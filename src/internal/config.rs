//! Shell configuration: loading and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::internal::control::{ControlOptions, DEFAULT_INTRO, DEFAULT_PROMPT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration of one shell session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Nick of the administered bot.
    pub nick: String,
    pub prompt: String,
    /// Banner printed when the shell starts.
    pub intro: String,
    /// Directory holding the plugins' persistent data.
    pub data_dir: PathBuf,
    /// Plugin kinds to make available, in id order.
    pub plugins: Vec<String>,
    /// Nicks granted sudo at startup.
    pub sudoers: Vec<String>,
    /// Log filter used when neither `RUST_LOG` nor `--verbose` is set.
    pub log_level: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            nick: "munin".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            intro: DEFAULT_INTRO.to_string(),
            data_dir: PathBuf::from("data"),
            plugins: vec![
                "todolist".to_string(),
                "corrector".to_string(),
                "gold".to_string(),
            ],
            sudoers: Vec::new(),
            log_level: None,
        }
    }
}

impl ShellConfig {
    pub fn control_options(&self) -> ControlOptions {
        ControlOptions {
            prompt: self.prompt.clone(),
            intro: self.intro.clone(),
        }
    }
}

/// Load the configuration from the first file found.
///
/// 1. `{working_dir}/.munin/config.json` (project-local)
/// 2. `~/.config/munin/config.json` (user-global)
///
/// Falls back to defaults when neither exists. A file that exists but cannot
/// be parsed is skipped with a warning.
pub fn load_shell_config(working_dir: &Path) -> ShellConfig {
    let mut candidates = vec![working_dir.join(".munin").join("config.json")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("munin").join("config.json"));
    }

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("config loaded from {}", path.display());
                return config;
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }
    ShellConfig::default()
}

/// Load an explicitly named configuration file.
pub fn load_config_file(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

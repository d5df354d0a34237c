use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Terminal refresh cap; unset means uncapped
    #[serde(default)]
    pub max_fps: Option<u32>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    #[serde(default = "default_commit_debounce_ms")]
    pub commit_debounce_ms: u64,
    #[serde(default)]
    pub seed_from_initializer: bool,
    #[serde(default = "default_write_back")]
    pub write_back: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_fps: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            commit_debounce_ms: default_commit_debounce_ms(),
            seed_from_initializer: false,
            write_back: default_write_back(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_history_depth() -> usize {
    100
}

fn default_commit_debounce_ms() -> u64 {
    750
}

fn default_write_back() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_context_chars() -> usize {
    1000
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Invalid configuration")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("In {}", path.display()))
}

/// `--config`, then `./shaderlab.toml`, then the platform config directory
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("shaderlab.toml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("shaderlab").join("config.toml"))
        .filter(|path| path.exists())
}

/// Resolved configuration; an explicitly named file must exist and parse
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match find_config(explicit) {
        Some(path) => {
            let config = load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

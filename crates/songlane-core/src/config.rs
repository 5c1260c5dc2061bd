use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::time::{DEFAULT_BPM, DEFAULT_PPQ, Tick};

pub const CONFIG_FILE_NAME: &str = "songlane.config.toml";
pub const CONFIG_PATH_ENV: &str = "SONGLANE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SonglaneConfig {
    pub song: SongConfig,
    pub diagnostics: DiagnosticsConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SongConfig {
    pub ppq: u32,
    pub bpm: f64,
    pub time_signature_numerator: u8,
    pub time_signature_denominator: u8,
    /// Placeholder length of a new lyric line, in ticks.
    pub lyric_line_length: Tick,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub rust_log_filter: String,
    pub trace_file_prefix: String,
    /// Mirrors log events to stdout next to the JSON log file.
    pub stdout_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub autosave_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            ppq: DEFAULT_PPQ,
            bpm: DEFAULT_BPM,
            time_signature_numerator: 4,
            time_signature_denominator: 4,
            lyric_line_length: Tick::from(DEFAULT_PPQ),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rust_log_filter: "info,songlane_core=trace".to_string(),
            trace_file_prefix: "songlane".to_string(),
            stdout_logs: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            autosave_dir: PathBuf::from("data/autosave"),
            export_dir: PathBuf::from("data/exports"),
        }
    }
}

impl SonglaneConfig {
    pub fn load() -> Result<Self> {
        let config_path = discover_config_path().with_context(|| {
            format!("failed to locate {CONFIG_FILE_NAME}; looked in cwd and parent directory")
        })?;
        Self::load_from(&config_path)
    }

    /// Like [`Self::load`], but a missing file yields the defaults. A file
    /// that exists and fails to parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        match discover_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SonglaneConfig = toml::from_str(content)?;
        Ok(config)
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let candidates = [
        cwd.join(CONFIG_FILE_NAME),
        cwd.join("..").join(CONFIG_FILE_NAME),
    ];

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE_NAME} not found"))
}

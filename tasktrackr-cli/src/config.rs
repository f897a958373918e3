use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tasktrackr_core::{DEFAULT_DATA_FILE, DEFAULT_POLL_INTERVAL};
use tracing::warn;

use crate::state::{ensure_tasktrackr_home, tasktrackr_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageSection,
    pub reminders: RemindersSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Task file. Relative paths resolve against the working directory.
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl RemindersSection {
    /// Poll interval; never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tasktrackr_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("load {}", p.display()))
}

/// Like `load_config`, but a broken or unreachable config only costs a warning.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "using default config");
        Config::default()
    })
}

pub fn save_config(cfg: &Config) -> Result<()> {
    ensure_tasktrackr_home()?;
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config, data_file: &std::path::Path) -> Result<()> {
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    println!("\n# effective task file: {}", data_file.display());
    Ok(())
}

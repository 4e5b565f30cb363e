use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap().join(".config").join("spacedock").join("config.toml")
}

fn default_host_app() -> String { "Hammerspoon".to_string() }
fn default_launcher_app() -> String { "Raycast".to_string() }
fn default_settle_delay_ms() -> u64 { 100 }
fn default_refresh_clear_delay_ms() -> u64 { 200 }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name of the automation host application that executes Lua chunks.
    #[serde(default = "default_host_app")]
    pub host_app: String,

    /// Application name of the launcher UI embedding us. Its own windows are
    /// excluded from the global window list so the switcher does not list
    /// itself.
    #[serde(default = "default_launcher_app")]
    pub launcher_app: String,

    /// Fetch a window's snapshot when the UI selection lands on it.
    #[serde(default)]
    pub fetch_snapshot_on_select: bool,

    /// Capture snapshots inline while listing windows. Each capture is an
    /// extra host-side render, so listing large spaces gets noticeably
    /// slower with this on.
    #[serde(default)]
    pub inline_snapshots: bool,

    /// How long to let the host settle between navigating away from a space
    /// and removing it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Trailing delay before the aggregate refresh indicator clears, so
    /// fast consecutive fetches do not flicker it.
    #[serde(default = "default_refresh_clear_delay_ms")]
    pub refresh_clear_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_app: default_host_app(),
            launcher_app: default_launcher_app(),
            fetch_snapshot_on_select: false,
            inline_snapshots: false,
            settle_delay_ms: default_settle_delay_ms(),
            refresh_clear_delay_ms: default_refresh_clear_delay_ms(),
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&buf)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let buf = toml::to_string_pretty(self)?;
        std::fs::write(path, buf)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.host_app.trim().is_empty() {
            issues.push("host_app must not be empty".to_string());
        }
        if self.launcher_app.trim().is_empty() {
            issues.push("launcher_app must not be empty".to_string());
        }
        if self.settle_delay_ms > 10_000 {
            issues.push(format!(
                "settle_delay_ms is {}; must be at most 10000",
                self.settle_delay_ms
            ));
        }
        if self.refresh_clear_delay_ms > 10_000 {
            issues.push(format!(
                "refresh_clear_delay_ms is {}; must be at most 10000",
                self.refresh_clear_delay_ms
            ));
        }
        issues
    }

    pub fn settle_delay(&self) -> Duration { Duration::from_millis(self.settle_delay_ms) }

    pub fn refresh_clear_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_clear_delay_ms)
    }
}

//! Static feature configuration: named groups of opaque selector patterns
//! plus timing constants. Immutable after load. The host page's markup is
//! outside this system's control, so every pattern here is replaceable data,
//! never a hard-coded assumption.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Duration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub panel: PanelConfig,
    pub ad_skip: AdSkipConfig,
    pub cursor: CursorConfig,
    pub auto_advance: AutoAdvanceConfig,
    pub shortcuts: ShortcutsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            ad_skip: AdSkipConfig::default(),
            cursor: CursorConfig::default(),
            auto_advance: AutoAdvanceConfig::default(),
            shortcuts: ShortcutsConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}

/// Spoiler-panel suppression.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selectors: vec![
                ".xrayQuickView".into(),
                "[data-testid=\"x-ray-panel\"]".into(),
                ".dv-player-fullscreen .xrayQuickView".into(),
            ],
        }
    }
}

/// Advertisement prompt dismissal. `max_tries` and `retry_delay_ms` are
/// reserved: no component retries today.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdSkipConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub debounce_ms: u64,
    pub max_tries: u32,
    pub retry_delay_ms: u64,
}

impl AdSkipConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for AdSkipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selectors: vec![
                ".adSkipButton.skippable".into(),
                "[data-testid=\"skip-ad-button\"]".into(),
                ".atvwebplayersdk-skipelements-button".into(),
            ],
            debounce_ms: 500,
            max_tries: 3,
            retry_delay_ms: 1500,
        }
    }
}

/// Pointer-cursor management over active players.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    pub enabled: bool,
    pub player_selectors: Vec<String>,
    pub hide_delay_ms: u64,
}

impl CursorConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player_selectors: vec![
                ".webPlayerUIContainer".into(),
                "[data-testid=\"video-player\"]".into(),
                ".dv-player-fullscreen".into(),
            ],
            hide_delay_ms: 3000,
        }
    }
}

/// Auto-advance to the next item after a user-cancelable grace delay.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoAdvanceConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub grace_delay_ms: u64,
}

impl AutoAdvanceConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selectors: vec![
                "[data-testid=\"next-episode-button\"]".into(),
                ".nextupcard-button".into(),
            ],
            grace_delay_ms: 2000,
        }
    }
}

/// Keyboard chords for on-page controls, active only while a video element
/// is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutsConfig {
    pub enabled: bool,
    pub settings_selectors: Vec<String>,
    pub fullscreen_selectors: Vec<String>,
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settings_selectors: vec![
                "[data-testid=\"settings-button\"]".into(),
                ".atvwebplayersdk-settings-button".into(),
            ],
            fullscreen_selectors: vec![
                "[data-testid=\"fullscreen-button\"]".into(),
                ".atvwebplayersdk-fullscreen-button".into(),
            ],
        }
    }
}

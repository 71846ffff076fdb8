use serde::{Deserialize, Serialize};
use dirs_next::home_dir;
use std::{env, fs, path::{Path, PathBuf}};
use std::env::consts::DLL_EXTENSION;
use thiserror::Error;

use crate::core::hotkeys::Hotkeys;
use crate::constants::{DEFAULT_LIBRARY_DIR, DEFAULT_LOG_LEVEL, DEFAULT_SCORE_DIR, MENU_MODULE_STEM};
use crate::module::ffi::{ARCADE_DISPLAY_ENTRY_SYMBOL, ARCADE_GAME_ENTRY_SYMBOL};
use crate::module::types::KeyCode;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ARCADE_CONFIG";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level host configuration. Every field is optional; accessors fill in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// module directory scanned by the catalog
    pub library_dir: Option<PathBuf>,
    /// game module loaded at start-up (defaults to the menu module)
    pub default_game: Option<PathBuf>,
    /// menu module, never listed in the catalog
    pub menu_file: Option<PathBuf>,
    pub score_dir: Option<PathBuf>,
    /// player name handed to the first game
    pub player: Option<String>,
    /// factory symbols
    pub game_entry: Option<String>,
    pub display_entry: Option<String>,
    pub hotkeys: Option<HotkeyConfig>,
}

/// Reserved key bindings; unset entries keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HotkeyConfig {
    pub prev_display: Option<KeyCode>,
    pub next_display: Option<KeyCode>,
    pub prev_game: Option<KeyCode>,
    pub next_game: Option<KeyCode>,
    pub reload_game: Option<KeyCode>,
    pub reload_display: Option<KeyCode>,
    pub reload_all: Option<KeyCode>,
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn library_dir(&self) -> PathBuf {
        self.library_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR))
    }

    pub fn menu_file(&self) -> PathBuf {
        self.menu_file.clone().unwrap_or_else(|| {
            self.library_dir().join(format!("{}.{}", MENU_MODULE_STEM, DLL_EXTENSION))
        })
    }

    pub fn default_game(&self) -> PathBuf {
        self.default_game.clone().unwrap_or_else(|| self.menu_file())
    }

    pub fn score_dir(&self) -> PathBuf {
        self.score_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SCORE_DIR))
    }

    pub fn player(&self) -> String {
        self.player.clone().unwrap_or_default()
    }

    pub fn game_entry(&self) -> &str {
        self.game_entry.as_deref().unwrap_or(ARCADE_GAME_ENTRY_SYMBOL)
    }

    pub fn display_entry(&self) -> &str {
        self.display_entry.as_deref().unwrap_or(ARCADE_DISPLAY_ENTRY_SYMBOL)
    }

    pub fn hotkeys(&self) -> HotkeyConfig {
        self.hotkeys.clone().unwrap_or_default()
    }
}

/// Public entry point: read YAML (explicit `$ARCADE_CONFIG` or search), merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let explicit = env::var_os(CONFIG_ENV).map(PathBuf::from);
    load_from(explicit.as_deref())
}

/// Same as [`load`] with the explicit path passed in.
pub fn load_from(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = explicit {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/arcade/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/arcade/config.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["arcade.yaml", "config/arcade.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    // an empty file is an empty config, not a parse error
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.library_dir.is_some()    { dst.library_dir = src.library_dir; }
    if src.default_game.is_some()   { dst.default_game = src.default_game; }
    if src.menu_file.is_some()      { dst.menu_file = src.menu_file; }
    if src.score_dir.is_some()      { dst.score_dir = src.score_dir; }
    if src.player.is_some()         { dst.player = src.player; }
    if src.game_entry.is_some()     { dst.game_entry = src.game_entry; }
    if src.display_entry.is_some()  { dst.display_entry = src.display_entry; }
    // hotkeys
    match (&mut dst.hotkeys, src.hotkeys) {
        (None, Some(h)) => dst.hotkeys = Some(h),
        (Some(d), Some(s)) => merge_hotkeys(d, s),
        _ => {}
    }
}

fn merge_hotkeys(dst: &mut HotkeyConfig, src: HotkeyConfig) {
    if src.prev_display.is_some()   { dst.prev_display = src.prev_display; }
    if src.next_display.is_some()   { dst.next_display = src.next_display; }
    if src.prev_game.is_some()      { dst.prev_game = src.prev_game; }
    if src.next_game.is_some()      { dst.next_game = src.next_game; }
    if src.reload_game.is_some()    { dst.reload_game = src.reload_game; }
    if src.reload_display.is_some() { dst.reload_display = src.reload_display; }
    if src.reload_all.is_some()     { dst.reload_all = src.reload_all; }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(ConfigError::Validation(format!("unknown log_level '{level}'")))
        }
    }
    for (field, value) in [("game_entry", &cfg.game_entry), ("display_entry", &cfg.display_entry)] {
        if value.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{field} must not be empty")));
        }
    }
    if cfg.library_dir.as_deref().is_some_and(|p| p.as_os_str().is_empty()) {
        return Err(ConfigError::Validation("library_dir must not be empty".into()));
    }
    if let Some(hotkeys) = cfg.hotkeys.as_ref() {
        if let Some(key) = Hotkeys::from_config(hotkeys).conflict() {
            return Err(ConfigError::Validation(format!("hotkey {key:?} bound to two actions")));
        }
    }
    Ok(())
}

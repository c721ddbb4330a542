//! Configuration system for nxdash.
//!
//! Provides a layered configuration hierarchy:
//!
//! 1. **Built-in defaults** — hardcoded in [`schema::DashConfig::default()`]
//! 2. **User global config** — `~/.nxdash/config.toml`
//! 3. **Project local config** — `.nxdash.toml` in the current working directory
//! 4. **Environment variables** — `NXDASH_*` overrides (highest precedence)
//!
//! Later layers override earlier ones at the key level: a file that only
//! sets `device.base_url` leaves every other value from the previous layer
//! intact.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nxdash::config;
//!
//! let cfg = config::load();
//! let client = UreqClient::new(&cfg.device.base_url, cfg.device.timeout());
//! ```
pub mod schema;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed files are skipped with a warning.
pub fn load() -> DashConfig {
    let mut layered = match toml::Value::try_from(DashConfig::default()) {
        Ok(value) => value,
        Err(_) => return with_env(DashConfig::default()),
    };

    for path in [global_config_path(), project_config_path()].into_iter().flatten() {
        if let Some(overlay) = load_toml_file(&path) {
            merge_values(&mut layered, overlay);
        }
    }

    let config = layered.try_into::<DashConfig>().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config layers do not match schema; using defaults");
        DashConfig::default()
    });
    with_env(config)
}

fn with_env(mut config: DashConfig) -> DashConfig {
    apply_env_overrides(&mut config);
    config
}

/// Read a TOML file as a raw value tree.
///
/// Returns `None` if the file doesn't exist or is malformed.
fn load_toml_file(path: &PathBuf) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Recursively merge `overlay` into `base`; overlay keys win.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.nxdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nxdash").join("config.toml"))
}

/// Path to the project local config: `.nxdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".nxdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `NXDASH_DEVICE_URL` — device base URL
/// - `NXDASH_TIMEOUT_MS` — per-request timeout
/// - `NXDASH_LOGGING` — sample history on/off (`1`/`true`/`yes`/`on`)
/// - `NXDASH_LOG_LEVEL` — diagnostic level
/// - `NXDASH_SIMULATOR_BIND` — simulator listen address
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var("NXDASH_DEVICE_URL")
        && !val.is_empty()
    {
        config.device.base_url = val;
    }
    if let Ok(val) = std::env::var("NXDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.device.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("NXDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("NXDASH_LOG_LEVEL")
        && let Some(level) = parse_level(&val)
    {
        config.logging.level = level.to_string();
    }
    if let Ok(val) = std::env::var("NXDASH_SIMULATOR_BIND")
        && !val.is_empty()
    {
        config.simulator.bind = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Normalize a diagnostic level name.
fn parse_level(val: &str) -> Option<&'static str> {
    match val.to_ascii_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

impl schema::DeviceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.nxdash/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.nxdash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `device.base_url`. The existing file is laid
/// over the defaults first, so every known key has a type to parse into.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root =
        toml::Value::try_from(DashConfig::default()).context("failed to serialize defaults")?;
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        let existing: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_values(&mut root, existing);
    }
    set_toml_value(&mut root, key, value)?;

    // Reject values that would make the file unloadable.
    root.clone()
        .try_into::<DashConfig>()
        .with_context(|| format!("'{value}' is not a valid value for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The section must already exist; the new value takes the type of the
/// value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    if let Some(section_path) = section_path {
        for part in section_path.split('.') {
            current = current
                .get_mut(part)
                .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
        }
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", section_path.unwrap_or("")))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

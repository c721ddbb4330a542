//! Configuration schema and defaults for nxdash.
//!
//! Defines the TOML-serializable structure with the `[device]`,
//! `[logging]`, and `[simulator]` sections. Every field has a built-in
//! default; users only set what they want to override.
//!
//! The poll interval is intentionally not part of the schema: the device
//! dashboard refreshes on a fixed 3 s cadence.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level nxdash configuration.
///
/// Maps directly to `~/.nxdash/config.toml` and `.nxdash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub device: DeviceConfig,
    pub logging: LoggingConfig,
    pub simulator: SimulatorConfig,
}

// ---------------------------------------------------------------------------
// [device]
// ---------------------------------------------------------------------------

/// Where the device's web server lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Base URL of the device, e.g. `http://192.168.1.10`.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.10".to_string(),
            timeout_ms: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether poll samples are appended to the history log.
    pub enabled: bool,
    /// Path to the sample log. `~` is expanded to the home directory.
    pub path: String,
    /// Diagnostic level when `RUST_LOG` is unset: `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.nxdash/samples.jsonl".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [simulator]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Address the simulated device listens on.
    pub bind: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config written by `nxdash config init`.
    pub fn default_toml() -> String {
        r#"# nxdash configuration
# Layers: defaults -> ~/.nxdash/config.toml -> ./.nxdash.toml -> NXDASH_* env vars

[device]
# Base URL of the device's web server
base_url = "http://192.168.1.10"
# Per-request timeout in milliseconds
timeout_ms = 2000

[logging]
# Append every complete poll round to the sample history
enabled = true
path = "~/.nxdash/samples.jsonl"
# Diagnostic level used when RUST_LOG is unset
level = "info"

[simulator]
# Listen address for `nxdash simulate`
bind = "127.0.0.1:8080"
"#
        .to_string()
    }

    /// Resolve the sample log path, expanding a leading `~`.
    pub fn sample_log_path(&self) -> Option<std::path::PathBuf> {
        expand_home(&self.logging.path)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Option<std::path::PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if path == "~" => dirs::home_dir(),
        None => Some(std::path::PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = DashConfig::default();
        assert_eq!(cfg.device.base_url, "http://192.168.1.10");
        assert_eq!(cfg.device.timeout_ms, 2000);
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.simulator.bind, "127.0.0.1:8080");
    }

    #[test]
    fn default_toml_matches_defaults() {
        let parsed: DashConfig = toml::from_str(&DashConfig::default_toml()).unwrap();
        assert_eq!(parsed, DashConfig::default());
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let toml_str = r#"
[device]
base_url = "http://10.0.0.5"
"#;
        let cfg: DashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.device.base_url, "http://10.0.0.5");
        assert_eq!(cfg.device.timeout_ms, 2000);
        assert!(cfg.logging.enabled);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg: DashConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, DashConfig::default());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/log/nxdash.jsonl"),
            Some(std::path::PathBuf::from("/var/log/nxdash.jsonl"))
        );
    }

    #[test]
    fn expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.jsonl"), Some(home.join("x.jsonl")));
        }
    }
}

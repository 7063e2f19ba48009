use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFailed(#[source] std::io::Error),
    #[error("failed to write config: {0}")]
    WriteFailed(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: Storage,
    pub scheduler: Scheduler,
    pub alerts: Alerts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Root of the record store (`<data_dir>/checks/<id>.json`)
    pub data_dir: path::PathBuf,
    /// Directory for per-check audit logs and their archives
    pub logs_dir: path::PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub probe_interval_seconds: u64,
    pub rotation_interval_seconds: u64,
    /// Cap on simultaneously running check pipelines; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_probes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Alerts {
    pub enabled: bool,
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self { data_dir: ".data".into(), logs_dir: ".logs".into() }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            probe_interval_seconds: 60,
            rotation_interval_seconds: 24 * 60 * 60,
            max_concurrent_probes: None,
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://api.twilio.com".into(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_phone: String::new(),
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uptime/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("uptime/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        let concurrency = match self.scheduler.max_concurrent_probes {
            Some(limit) => limit.to_string(),
            None => "unbounded".to_string(),
        };
        let token = if self.alerts.auth_token.is_empty() { "<unset>" } else { "<redacted>" };

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Storage")?;
        write_1(f, "Data Directory", &self.storage.data_dir.display())?;
        write_1(f, "Logs Directory", &self.storage.logs_dir.display())?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Probe Interval (s)", &self.scheduler.probe_interval_seconds)?;
        write_1(f, "Rotation Interval (s)", &self.scheduler.rotation_interval_seconds)?;
        write_1(f, "Max Concurrent Probes", &concurrency)?;
        write_title_1(f, "Alerts")?;
        write_1(f, "Enabled", &self.alerts.enabled)?;
        write_1(f, "API Base", &self.alerts.api_base)?;
        write_1(f, "Account SID", &self.alerts.account_sid)?;
        write_1(f, "Auth Token", &token)?;
        write_1(f, "From", &self.alerts.from_phone)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uptime/config.toml
    ///  or the specified path, with the name config.toml if one does not exist.
    /// Environment overrides are applied on top.
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let mut config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::ReadFailed)?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Override selected settings from the environment
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("UPTIME_DATA_DIR").filter(|v| !v.is_empty()) {
            self.storage.data_dir = dir.into();
        }
        if let Some(dir) = lookup("UPTIME_LOGS_DIR").filter(|v| !v.is_empty()) {
            self.storage.logs_dir = dir.into();
        }
        if let Some(token) = lookup("UPTIME_SMS_AUTH_TOKEN").filter(|v| !v.is_empty()) {
            self.alerts.auth_token = token;
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(ConfigError::WriteFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.probe_interval_seconds, 60);
        assert_eq!(config.scheduler.rotation_interval_seconds, 86_400);
        assert_eq!(config.scheduler.max_concurrent_probes, None);
        assert!(!config.alerts.enabled);
        assert_eq!(config.storage.logs_dir, path::PathBuf::from(".logs"));
    }

    #[test]
    fn test_missing_file_writes_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config");

        let config = Config::from_config(Some(&path)).unwrap();

        assert!(dir.path().join("nested/config.toml").exists());
        assert_eq!(config.scheduler.probe_interval_seconds, 60);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[scheduler]\nmax_concurrent_probes = 8\n\n[alerts]\nenabled = true\naccount_sid = \"AC1\"\n",
        )
        .unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.scheduler.max_concurrent_probes, Some(8));
        assert_eq!(config.scheduler.probe_interval_seconds, 60);
        assert!(config.alerts.enabled);
        assert_eq!(config.alerts.account_sid, "AC1");
        assert_eq!(config.alerts.api_base, "https://api.twilio.com");
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scheduler\n").unwrap();

        assert!(matches!(Config::from_config(Some(&path)), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "UPTIME_LOGS_DIR" => Some("/var/log/uptime".to_string()),
            "UPTIME_SMS_AUTH_TOKEN" => Some("tok".to_string()),
            "UPTIME_DATA_DIR" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.storage.logs_dir, path::PathBuf::from("/var/log/uptime"));
        assert_eq!(config.storage.data_dir, path::PathBuf::from(".data"));
        assert_eq!(config.alerts.auth_token, "tok");
    }

    #[test]
    fn test_display_redacts_token() {
        let mut config = Config::default();
        config.alerts.auth_token = "super-secret".to_string();

        let rendered = config.to_string();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }
}

//! Configuration loading.
//!
//! Settings come from an optional TOML file. Every field has a default so
//! an empty or absent file yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/troubleshoot/config.toml";

/// How the networking bundle picks the interface for the wireless query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InterfaceStrategy {
    /// Interface index 2 from `ip addr`, or index 3 if it reports a link
    /// state. Assumes indices are stable and sequential.
    SequentialIndex,
    /// First interface reported by `iw dev`, falling back to
    /// `SequentialIndex`.
    FirstWireless,
    /// A fixed interface name.
    Named { name: String },
}

impl Default for InterfaceStrategy {
    fn default() -> Self {
        InterfaceStrategy::SequentialIndex
    }
}

/// Settings for a troubleshooting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Where intermediate files and the archive are written. Defaults to
    /// the invoking user's home directory.
    pub output_dir: Option<PathBuf>,
    /// Optional display-manager log directory.
    pub display_manager_log_dir: PathBuf,
    /// Optional X server log file.
    pub xorg_log: PathBuf,
    /// System logs always offered to the archive.
    pub system_logs: Vec<PathBuf>,
    /// Number of lines kept from the process listing.
    pub top_processes: usize,
    /// Try to install tools a bundle needs when they are missing.
    pub install_missing: bool,
    /// Package-manager command; the package name is appended.
    pub install_command: Vec<String>,
    /// Interface detection for the wireless query.
    pub interface_strategy: InterfaceStrategy,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            display_manager_log_dir: PathBuf::from("/var/log/lightdm"),
            xorg_log: PathBuf::from("/var/log/Xorg.0.log"),
            system_logs: vec![
                PathBuf::from("/var/log/syslog"),
                PathBuf::from("/var/log/kern.log"),
            ],
            top_processes: 15,
            install_missing: false,
            install_command: vec![
                "apt-get".to_string(),
                "install".to_string(),
                "-y".to_string(),
            ],
            interface_strategy: InterfaceStrategy::default(),
        }
    }
}

impl AssistConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicitly given path must exist. Without one, the default path is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                return Err(Error::ConfigError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.install_missing && self.install_command.is_empty() {
            return Err(Error::ConfigError(
                "install_missing is set but install_command is empty".to_string(),
            ));
        }
        if let InterfaceStrategy::Named { name } = &self.interface_strategy {
            if name.trim().is_empty() {
                return Err(Error::ConfigError(
                    "interface_strategy name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AssistConfig::from_toml("").unwrap();
        assert_eq!(config, AssistConfig::default());
        assert_eq!(config.top_processes, 15);
        assert_eq!(config.interface_strategy, InterfaceStrategy::SequentialIndex);
    }

    #[test]
    fn test_parse_overrides() {
        let config = AssistConfig::from_toml(
            r#"
            output_dir = "/srv/support"
            xorg_log = "/var/log/Xorg.1.log"
            top_processes = 5

            [interface_strategy]
            kind = "named"
            name = "wlp3s0"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/support")));
        assert_eq!(config.xorg_log, PathBuf::from("/var/log/Xorg.1.log"));
        assert_eq!(config.top_processes, 5);
        assert_eq!(
            config.interface_strategy,
            InterfaceStrategy::Named {
                name: "wlp3s0".to_string()
            }
        );
        assert_eq!(config.display_manager_log_dir, PathBuf::from("/var/log/lightdm"));
    }

    #[test]
    fn test_first_wireless_strategy() {
        let config = AssistConfig::from_toml(
            r#"
            [interface_strategy]
            kind = "first-wireless"
            "#,
        )
        .unwrap();
        assert_eq!(config.interface_strategy, InterfaceStrategy::FirstWireless);
    }

    #[test]
    fn test_rejects_empty_install_command() {
        let err = AssistConfig::from_toml(
            r#"
            install_missing = true
            install_command = []
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = AssistConfig::load(Some(Path::new("/nonexistent/troubleshoot.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "install_missing = true\n").unwrap();

        let config = AssistConfig::load(Some(&path)).unwrap();
        assert!(config.install_missing);
    }
}

use crate::cli::Cli;
use crate::error::{PcmkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_CONFIG: &str = "/etc/pcmk-agents.toml";
const USER_CONFIG: &str = ".pcmk-agents.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolPaths,

    #[serde(default)]
    pub runner: RunnerConfig,

    /// Verbose mode - debug logging of every external command (not stored in config file)
    #[serde(skip)]
    pub verbose: bool,
}

/// Locations of the Pacemaker binaries and the environment they run with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolPaths {
    #[serde(default = "default_crm_resource")]
    pub crm_resource: PathBuf,

    #[serde(default = "default_stonithd")]
    pub stonithd: PathBuf,

    /// PATH handed to crm_resource when it runs an agent's meta-data action
    #[serde(default = "default_metadata_path_env")]
    pub metadata_path_env: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            crm_resource: default_crm_resource(),
            stonithd: default_stonithd(),
            metadata_path_env: default_metadata_path_env(),
        }
    }
}

impl ToolPaths {
    pub fn crm_resource(&self) -> String {
        self.crm_resource.to_string_lossy().into_owned()
    }

    pub fn stonithd(&self) -> String {
        self.stonithd.to_string_lossy().into_owned()
    }
}

fn default_crm_resource() -> PathBuf {
    PathBuf::from("/usr/sbin/crm_resource")
}

fn default_stonithd() -> PathBuf {
    PathBuf::from("/usr/libexec/pacemaker/stonithd")
}

fn default_metadata_path_env() -> String {
    "/usr/sbin/:/bin/:/usr/bin/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Kill external commands after this many seconds (no limit when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration with precedence:
    /// 1. CLI flags (applied later via with_cli_overrides)
    /// 2. Environment variables
    /// 3. Explicit config file (--config)
    /// 4. User config (~/.pcmk-agents.toml)
    /// 5. System config (/etc/pcmk-agents.toml)
    /// 6. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let system_config = Path::new(SYSTEM_CONFIG);
        if system_config.exists() {
            config = config.merge(Self::from_file(system_config)?);
        }

        if let Some(home) = home_dir() {
            let user_config = home.join(USER_CONFIG);
            if user_config.exists() {
                config = config.merge(Self::from_file(&user_config)?);
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(PcmkError::InvalidConfig(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            config = config.merge(Self::from_file(path)?);
        }

        config = config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(mut self, other: Self) -> Self {
        if other.tools.crm_resource != default_crm_resource() {
            self.tools.crm_resource = other.tools.crm_resource;
        }
        if other.tools.stonithd != default_stonithd() {
            self.tools.stonithd = other.tools.stonithd;
        }
        if other.tools.metadata_path_env != default_metadata_path_env() {
            self.tools.metadata_path_env = other.tools.metadata_path_env;
        }
        if other.runner.timeout_secs.is_some() {
            self.runner.timeout_secs = other.runner.timeout_secs;
        }

        self
    }

    /// Apply environment variable overrides
    fn merge_env(mut self) -> Self {
        if let Ok(path) = std::env::var("PCMK_AGENTS_CRM_RESOURCE") {
            if !path.is_empty() {
                self.tools.crm_resource = PathBuf::from(path);
            }
        }

        if let Ok(path) = std::env::var("PCMK_AGENTS_STONITHD") {
            if !path.is_empty() {
                self.tools.stonithd = PathBuf::from(path);
            }
        }

        if let Ok(timeout) = std::env::var("PCMK_AGENTS_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.runner.timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid PCMK_AGENTS_TIMEOUT"),
            }
        }

        self
    }

    /// Apply CLI overrides (highest precedence)
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        self.verbose = cli.verbose;

        if let Some(path) = &cli.crm_resource {
            self.tools.crm_resource = path.clone();
        }
        if let Some(path) = &cli.stonithd {
            self.tools.stonithd = path.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.runner.timeout_secs = Some(timeout);
        }

        self
    }

    /// Reject settings that would make every command fail in a confusing way
    pub fn validate(&self) -> Result<()> {
        if self.tools.crm_resource.as_os_str().is_empty() {
            return Err(PcmkError::InvalidConfig(
                "tools.crm_resource cannot be empty".to_string(),
            ));
        }
        if self.tools.stonithd.as_os_str().is_empty() {
            return Err(PcmkError::InvalidConfig(
                "tools.stonithd cannot be empty".to_string(),
            ));
        }
        if self.runner.timeout_secs == Some(0) {
            return Err(PcmkError::InvalidConfig(
                "runner.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.tools.crm_resource,
            PathBuf::from("/usr/sbin/crm_resource")
        );
        assert_eq!(
            config.tools.stonithd,
            PathBuf::from("/usr/libexec/pacemaker/stonithd")
        );
        assert_eq!(config.tools.metadata_path_env, "/usr/sbin/:/bin/:/usr/bin/");
        assert_eq!(config.runner.timeout(), None);
    }

    #[test]
    fn test_merge_config() {
        let mut base = Config::default();
        base.tools.crm_resource = PathBuf::from("/opt/pacemaker/sbin/crm_resource");

        let mut override_cfg = Config::default();
        override_cfg.runner.timeout_secs = Some(30);

        let merged = base.merge(override_cfg);
        assert_eq!(
            merged.tools.crm_resource,
            PathBuf::from("/opt/pacemaker/sbin/crm_resource")
        ); // Kept from base
        assert_eq!(merged.runner.timeout_secs, Some(30)); // From override
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [tools]
            stonithd = "/usr/lib/pacemaker/pacemaker-fenced"

            [runner]
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(
            config.tools.stonithd,
            PathBuf::from("/usr/lib/pacemaker/pacemaker-fenced")
        );
        assert_eq!(config.tools.crm_resource, default_crm_resource());
        assert_eq!(config.runner.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tools\ncrm_resource = 1").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(PcmkError::ConfigParse(_))));
    }

    #[test]
    #[serial]
    fn test_load_explicit_file_and_env() {
        let home = tempfile::tempdir().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tools]\ncrm_resource = \"/custom/crm_resource\"").unwrap();

        std::env::set_var("HOME", home.path());
        std::env::set_var("PCMK_AGENTS_STONITHD", "/env/stonithd");
        std::env::set_var("PCMK_AGENTS_TIMEOUT", "15");

        let config = Config::load(Some(file.path()));

        std::env::remove_var("PCMK_AGENTS_STONITHD");
        std::env::remove_var("PCMK_AGENTS_TIMEOUT");

        let config = config.unwrap();
        assert_eq!(config.tools.crm_resource, PathBuf::from("/custom/crm_resource"));
        assert_eq!(config.tools.stonithd, PathBuf::from("/env/stonithd"));
        assert_eq!(config.runner.timeout_secs, Some(15));
    }

    #[test]
    #[serial]
    fn test_load_user_config_from_home() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join(".pcmk-agents.toml"),
            "[runner]\ntimeout_secs = 42\n",
        )
        .unwrap();

        std::env::set_var("HOME", home.path());
        let config = Config::load(None).unwrap();
        assert_eq!(config.runner.timeout_secs, Some(42));
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file() {
        let home = tempfile::tempdir().unwrap();
        std::env::set_var("HOME", home.path());

        let result = Config::load(Some(Path::new("/nonexistent/pcmk-agents.toml")));
        assert!(matches!(result, Err(PcmkError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.runner.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.runner.timeout_secs = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = Config::default();
        config.tools.crm_resource = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialized_config_round_trips_through_toml() {
        let mut config = Config::default();
        config.runner.timeout_secs = Some(5);
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.tools, config.tools);
        assert_eq!(parsed.runner, config.runner);
    }
}

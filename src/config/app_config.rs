use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::adapters::engine::EngineChoice;
use crate::core::errors::{Result, SealError};
use crate::core::services::output_namer::FileOutputNamer;

/// Directory under `data_dir` that holds stores and the audit log.
pub const STATE_DIR: &str = ".sealdrop";

/// Top-level Sealdrop configuration, read from `config.toml`.
///
/// Every section is optional; missing keys take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub storage: StorageSection,
    pub engine: EngineSection,
    pub output: OutputSection,
    pub server: ServerSection,
    pub audit: AuditSection,
}

impl AppConfig {
    /// Load from `explicit` when given, else from the per-user default
    /// location, else fall back to defaults.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(SealError::InvalidConfig {
                    detail: format!("{} not found", path.display()),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let Some(path) = path else {
            tracing::debug!("no config file, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|source| SealError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            SealError::InvalidConfig { detail } => SealError::InvalidConfig {
                detail: format!("{}: {detail}", path.display()),
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| SealError::InvalidConfig {
            detail: e.message().to_string(),
        })?;

        if config.server.user_header.trim().is_empty() {
            return Err(SealError::InvalidConfig {
                detail: "server.user_header must not be empty".into(),
            });
        }
        validate_simple_filename(&config.audit.log_file, "audit log file")?;

        Ok(config)
    }

    /// `<config_dir>/sealdrop/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sealdrop").join("config.toml"))
    }

    /// Where recipient and private key stores and the audit log live.
    pub fn state_dir(&self) -> PathBuf {
        self.storage.data_dir.join(STATE_DIR)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.state_dir().join(&self.audit.log_file)
    }
}

/// Reject names that could point outside the state directory.
fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    let simple = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if simple {
        Ok(())
    } else {
        Err(SealError::InvalidConfig {
            detail: format!("{what} must be a plain file name, got '{name}'"),
        })
    }
}

/// The `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    /// Root holding `<uid>/files/...` for every user.
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|d| d.join("sealdrop"))
                .unwrap_or_else(|| PathBuf::from("sealdrop-data")),
        }
    }
}

/// The `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub backend: EngineChoice,
    pub gpg_path: PathBuf,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            backend: EngineChoice::Auto,
            gpg_path: PathBuf::from("gpg"),
        }
    }
}

/// The `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// How many candidate names the namer tries before giving up.
    pub max_name_attempts: u32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            max_name_attempts: FileOutputNamer::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// The `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub listen_addr: SocketAddr,
    /// Header a trusted reverse proxy sets to the authenticated user id.
    pub user_header: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            user_header: "x-remote-user".into(),
        }
    }
}

/// The `[audit]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    pub enabled: bool,
    pub log_file: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: "audit.log".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.engine.backend, EngineChoice::Auto);
        assert_eq!(config.output.max_name_attempts, 10_000);
        assert_eq!(config.server.user_header, "x-remote-user");
        assert!(config.audit.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::parse(
            r#"
            [storage]
            data_dir = "/srv/sealdrop"

            [engine]
            backend = "gpg"
            gpg_path = "/usr/local/bin/gpg2"

            [output]
            max_name_attempts = 50

            [audit]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/sealdrop"));
        assert_eq!(config.engine.backend, EngineChoice::Gpg);
        assert_eq!(config.engine.gpg_path, PathBuf::from("/usr/local/bin/gpg2"));
        assert_eq!(config.output.max_name_attempts, 50);
        assert!(!config.audit.enabled);
        assert_eq!(config.audit.log_file, "audit.log");
        assert_eq!(
            config.audit_log_path(),
            PathBuf::from("/srv/sealdrop/.sealdrop/audit.log")
        );
    }

    #[test]
    fn unknown_backend_is_invalid_config() {
        let result = AppConfig::parse("[engine]\nbackend = \"pgpme\"\n");
        assert!(matches!(result, Err(SealError::InvalidConfig { .. })));
    }

    #[test]
    fn traversal_in_log_file_is_rejected() {
        let result = AppConfig::parse("[audit]\nlog_file = \"../../etc/cron.d/x\"\n");
        assert!(matches!(result, Err(SealError::InvalidConfig { .. })));
    }

    #[test]
    fn bad_listen_addr_is_invalid_config() {
        let result = AppConfig::parse("[server]\nlisten_addr = \"localhost\"\n");
        assert!(matches!(result, Err(SealError::InvalidConfig { .. })));
    }

    #[test]
    fn blank_user_header_is_rejected() {
        let result = AppConfig::parse("[server]\nuser_header = \" \"\n");
        assert!(matches!(result, Err(SealError::InvalidConfig { .. })));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/sealdrop.toml")));
        assert!(matches!(result, Err(SealError::InvalidConfig { .. })));
    }

    #[test]
    fn explicit_file_is_read() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[server]\nlisten_addr = \"0.0.0.0:9000\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.listen_addr.to_string(), "0.0.0.0:9000");
    }
}

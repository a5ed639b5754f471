//! Engine configuration with TOML file support.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{constants, Address, PledgeError, Result};

/// Whether a release needs the referee's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefereePolicy {
    /// The referee is recorded on the promise but not checked.
    #[default]
    Advisory,
    /// A release must carry the referee's ed25519 endorsement.
    Signed,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
        }
    }
}

/// Configuration for a Pledge engine instance.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace for every derived address.
    pub program_id: Address,
    pub referee_policy: RefereePolicy,
    /// When set, forfeitures may only be paid into accounts this identity owns.
    pub collector: Option<Address>,
    /// Maximum display-name length in bytes.
    pub max_name_len: usize,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program_id: constants::DEFAULT_PROGRAM_ID
                .parse()
                .unwrap_or(Address([0u8; 32])),
            referee_policy: RefereePolicy::Advisory,
            collector: None,
            max_name_len: constants::DEFAULT_MAX_NAME_LEN,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string.
    ///
    /// # Errors
    /// [`PledgeError::Configuration`] on parse failure or invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(s).map_err(|e| PledgeError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// [`PledgeError::Io`] if the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// [`PledgeError::Configuration`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.max_name_len == 0 {
            return Err(PledgeError::Configuration(
                "max_name_len must be > 0".into(),
            ));
        }
        if let Some(collector) = self.collector {
            if !collector.is_on_curve() {
                return Err(PledgeError::Configuration(format!(
                    "collector {collector} is not a signer address"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.referee_policy, RefereePolicy::Advisory);
        assert!(cfg.collector.is_none());
        assert_eq!(cfg.max_name_len, 64);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(
            cfg.program_id.to_string(),
            constants::DEFAULT_PROGRAM_ID
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn parses_full_toml() {
        let toml = format!(
            r#"
            program_id = "{}"
            referee_policy = "signed"
            max_name_len = 16

            [logging]
            level = "debug"
            format = "json"
            "#,
            "11".repeat(32)
        );
        let cfg = EngineConfig::from_toml_str(&toml).unwrap();
        assert_eq!(cfg.program_id, Address([0x11; 32]));
        assert_eq!(cfg.referee_policy, RefereePolicy::Signed);
        assert_eq!(cfg.max_name_len, 16);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_name_len = 0"),
            Err(PledgeError::Configuration(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str(r#"program_id = "nothex""#),
            Err(PledgeError::Configuration(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str(r#"referee_policy = "maybe""#),
            Err(PledgeError::Configuration(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::from_toml_file("/nonexistent/pledge.toml").unwrap_err();
        assert!(matches!(err, PledgeError::Io(_)));
    }
}

//! Tracing subscriber setup.

use pledge_types::{LogFormat, LoggingConfig, PledgeError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level` when set.
///
/// # Errors
/// `Configuration` if the filter directive is malformed or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| PledgeError::Configuration(format!("log level: {e}")))?,
    };

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = match config.format {
        LogFormat::Human => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| PledgeError::Configuration(format!("tracing: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn malformed_level_rejected() {
        // Only reached when RUST_LOG is unset.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "pledge=loud".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_tracing(&config),
            Err(PledgeError::Configuration(_))
        ));
    }
}

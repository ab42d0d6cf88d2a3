//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, non-empty host, relative resources dir)
//! - Check that TLS material is configured as a pair
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::{Component, Path};

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("resources must be a relative directory path, got \"{0}\"")]
    InvalidResources(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("key_path and cert_path must be set together")]
    IncompleteTls,

    #[error("invalid metrics address \"{0}\"")]
    MetricsAddress(String),

    #[error("unknown log level \"{0}\"")]
    LogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    let resources = config.resources.as_str();
    let relative = !resources.is_empty()
        && !resources.ends_with('/')
        && Path::new(resources)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !relative {
        errors.push(ValidationError::InvalidResources(resources.to_string()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero("limits.max_body_size"));
    }

    if config.key_path.is_some() != config.cert_path.is_some() {
        errors.push(ValidationError::IncompleteTls);
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(obs.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_problem() {
        let mut config = ServerConfig::default();
        config.host = " ".into();
        config.resources = "/srv/static".into();
        config.timeouts.request_secs = 0;
        config.key_path = Some("key.pem".into());
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyHost,
                ValidationError::InvalidResources("/srv/static".into()),
                ValidationError::Zero("timeouts.request_secs"),
                ValidationError::IncompleteTls,
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn nested_resources_dir_is_allowed() {
        let mut config = ServerConfig::default();
        config.resources = "test/resources".into();
        assert!(validate_config(&config).is_ok());
        config.resources = "../outside".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nope".into())])
        );
    }
}

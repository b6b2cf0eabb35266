//! Configuration validation.
//!
//! Returns all validation errors, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::TrackerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check value ranges and formats the deserializer cannot express.
pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.gateway.url) {
        errors.push(ValidationError::new("gateway.url", format!("invalid URL: {}", e)));
    }
    if config.gateway.network.trim().is_empty() {
        errors.push(ValidationError::new("gateway.network", "must not be empty"));
    }
    if config.gateway.request_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.request_timeout_secs", "must be greater than 0"));
    }

    if config.account.native_token.trim().is_empty() {
        errors.push(ValidationError::new("account.native_token", "must not be empty"));
    }

    if config.polling.interval_ms == 0 {
        errors.push(ValidationError::new("polling.interval_ms", "must be greater than 0"));
    }
    if config.polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be at least 1"));
    }
    if config.polling.base_delay_ms > config.polling.max_delay_ms {
        errors.push(ValidationError::new(
            "polling.base_delay_ms",
            "must not exceed polling.max_delay_ms",
        ));
    }

    if !matches!(
        config.observability.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

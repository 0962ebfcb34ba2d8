use crate::config::types::{Config, CredentialsConfig, OutputConfig, PortalConfig, SessionConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_credentials_config(&config.credentials)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the portal endpoint
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http(s), got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates the account credentials
fn validate_credentials_config(config: &CredentialsConfig) -> Result<(), ConfigError> {
    if config.username.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty".to_string(),
        ));
    }

    if config.password.is_empty() {
        return Err(ConfigError::Validation(
            "password cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates session behavior settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.heartbeat_minutes < 1 || config.heartbeat_minutes > 120 {
        return Err(ConfigError::Validation(format!(
            "heartbeat-minutes must be between 1 and 120, got {}",
            config.heartbeat_minutes
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.snapshot_path.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

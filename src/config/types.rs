use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub output: OutputConfig,
}

/// Portal endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the portal installation
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Portal account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

/// Session behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes between keep-alive requests; the portal expires idle
    /// sessions after about half an hour
    #[serde(rename = "heartbeat-minutes", default = "default_heartbeat_minutes")]
    pub heartbeat_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_minutes: default_heartbeat_minutes(),
        }
    }
}

fn default_heartbeat_minutes() -> u64 {
    25
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where the snapshot JSON file is written
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

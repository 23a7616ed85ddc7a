//! Configuration Module
//!
//! A single TOML-loadable configuration struct with named optional fields
//! replaces per-option constructor permutations: broker address and
//! protocol, client identity, credentials, session options, reconnect
//! policy, dispatch concurrency, and TLS material for the transport
//! collaborator.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;


/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// Validation error
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Broker connection protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain MQTT over TCP
    #[default]
    Mqtt,
    /// MQTT over TLS
    Mqtts,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Mqtt => write!(f, "mqtt"),
            Protocol::Mqtts => write!(f, "mqtts"),
        }
    }
}

impl Protocol {
    /// Get default port for this protocol
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Mqtt => 1883,
            Protocol::Mqtts => 8883,
        }
    }

    /// Check if this protocol uses TLS
    pub fn uses_tls(&self) -> bool {
        matches!(self, Protocol::Mqtts)
    }
}

/// MQTT protocol version to request. When absent, the transport negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MqttVersion {
    /// MQTT v3.1.1
    V311,
    /// MQTT v5.0
    V5,
}

/// TLS material handed to the transport collaborator
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TlsConfig {
    /// Path to CA certificate file (PEM format)
    pub ca_cert: Option<String>,

    /// Path to client certificate file (PEM format)
    pub client_cert: Option<String>,

    /// Path to client private key file (PEM format)
    pub client_key: Option<String>,

    /// Password for an encrypted client private key
    pub key_password: Option<String>,
}

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Broker address (host:port or just host)
    pub address: String,

    /// Connection protocol
    #[serde(default)]
    pub protocol: Protocol,

    /// Client identifier presented to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Username for authentication
    pub username: Option<String>,

    /// Password for authentication
    pub password: Option<String>,

    /// Protocol version to request; negotiated when unset
    #[serde(default)]
    pub mqtt_version: Option<MqttVersion>,

    /// Use clean start (discard broker-side session state)
    #[serde(default)]
    pub clean_start: bool,

    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u16,

    /// Reconnect automatically after connection loss
    #[serde(default = "default_true")]
    pub automatic_reconnect: bool,

    /// Flat interval between reconnect attempts, in seconds
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval: u64,

    /// Number of dispatch workers (defaults to available parallelism)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// TLS configuration (required when protocol is mqtts)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

fn default_client_id() -> String {
    format!("mqhub-{}", std::process::id())
}

fn default_keep_alive() -> u16 {
    10
}

fn default_true() -> bool {
    true
}

fn default_reconnect_interval() -> u64 {
    5
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

// Helper to get number of CPUs
mod num_cpus {
    pub fn get() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            protocol: Protocol::default(),
            client_id: default_client_id(),
            username: None,
            password: None,
            mqtt_version: None,
            clean_start: false,
            keep_alive: default_keep_alive(),
            automatic_reconnect: true,
            reconnect_interval: default_reconnect_interval(),
            concurrency: default_concurrency(),
            tls: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::Invalid("address cannot be empty".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Invalid(
                "client_id cannot be empty".to_string(),
            ));
        }
        if self.protocol.uses_tls() && self.tls.is_none() {
            return Err(ConfigError::Invalid(
                "protocol mqtts requires a [tls] section".to_string(),
            ));
        }
        if let Some(tls) = &self.tls {
            if tls.client_key.is_some() && tls.client_cert.is_none() {
                return Err(ConfigError::Invalid(
                    "tls.client_key requires tls.client_cert".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parse address into host and port
    pub fn parse_address(&self) -> (String, u16) {
        if let Some((host, port_str)) = self.address.rsplit_once(':') {
            if let Ok(port) = port_str.parse::<u16>() {
                return (host.to_string(), port);
            }
        }
        (self.address.clone(), self.protocol.default_port())
    }

    /// Get the keep-alive interval as Duration
    pub fn keep_alive_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive))
    }

    /// Get the reconnect interval as Duration
    pub fn reconnect_interval_duration(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval)
    }
}

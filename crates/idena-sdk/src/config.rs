//! SDK configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::SdkError;

/// Top-level SDK configuration
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Node API key, sent as the `key` field of every request
    #[serde(default)]
    pub api_key: Option<String>,
    /// Confirmation polling
    #[serde(default)]
    pub poll: PollConfig,
    /// Fee fallback parameters
    #[serde(default)]
    pub fee: FeeConfig,
    /// HD wallet derivation path template; the account index is appended
    #[serde(default = "default_derivation_path")]
    pub derivation_path: String,
    /// Hardware wallet BIP32 path prefix; the account index is appended
    #[serde(default = "default_hardware_path")]
    pub hardware_path: String,
}

/// Confirmation polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between two transaction lookups, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Lookups made before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Fee configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Network size assumed by the fallback fee-per-byte formula
    #[serde(default = "default_assumed_network_size")]
    pub assumed_network_size: u64,
}

fn default_rpc_url() -> String {
    "https://rpc.idena.dev".to_string()
}

fn default_derivation_path() -> String {
    "m/44'/515'/0'/0".to_string()
}

fn default_hardware_path() -> String {
    "44'/515'/0'/0".to_string()
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    15
}

fn default_assumed_network_size() -> u64 {
    10_000
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            api_key: None,
            poll: PollConfig::default(),
            fee: FeeConfig::default(),
            derivation_path: default_derivation_path(),
            hardware_path: default_hardware_path(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            assumed_network_size: default_assumed_network_size(),
        }
    }
}

impl PollConfig {
    /// Build a polling configuration
    ///
    /// The interval is kept in whole milliseconds; anything shorter than 1 ms
    /// becomes 0, which polling rejects.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            max_attempts,
        }
    }

    /// Delay between polls
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl SdkConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, SdkError> {
        let config: SdkConfig =
            toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SdkError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, SdkError> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), SdkError> {
        if self.poll.interval_ms == 0 {
            return Err(SdkError::Config("poll.interval_ms must be positive".to_string()));
        }
        if self.poll.max_attempts == 0 {
            return Err(SdkError::Config("poll.max_attempts must be positive".to_string()));
        }
        if self.fee.assumed_network_size == 0 {
            return Err(SdkError::Config(
                "fee.assumed_network_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration file of the `splithub` binary.
//!
//! ```json
//! {
//!   "relayUrl": "http://localhost:3000",
//!   "rpcUrl": "https://sepolia.base.org",
//!   "chain": "base-sepolia",
//!   "deployments": {
//!     "84532": {
//!       "payments": "0x…",
//!       "registry": "0x…",
//!       "token": "0x…"
//!     }
//!   },
//!   "deadlineWindowSecs": 3600,
//!   "confirmationDelayMs": 1500,
//!   "relayTimeoutSecs": 30
//! }
//! ```
//!
//! `chain` is a known network name, `eip155:<id>` or a bare chain id.
//! Without `relayTimeoutSecs`, relay requests use the HTTP client's default.

use serde::{Deserialize, Deserializer};
use splithub_flow::{DEFAULT_CONFIRMATION_DELAY, DEFAULT_DEADLINE_WINDOW, FlowConfig};
use splithub_types::chain::ChainReference;
use splithub_types::deployment::{ContractDeployment, Deployments};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("No SplitHub deployment for {chain} (configured: {configured})")]
    NoDeployment {
        chain: ChainReference,
        configured: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub relay_url: Url,
    pub rpc_url: Url,
    #[serde(deserialize_with = "deserialize_chain")]
    pub chain: ChainReference,
    pub deployments: Deployments,
    #[serde(default = "default_deadline_window_secs")]
    pub deadline_window_secs: u64,
    #[serde(default = "default_confirmation_delay_ms")]
    pub confirmation_delay_ms: u64,
    #[serde(default)]
    pub relay_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::default()
            .with_deadline_window(Duration::from_secs(self.deadline_window_secs))
            .with_confirmation_delay(Duration::from_millis(self.confirmation_delay_ms))
    }

    pub fn relay_timeout(&self) -> Option<Duration> {
        self.relay_timeout_secs.map(Duration::from_secs)
    }

    /// Contracts on the configured `chain`.
    pub fn deployment(&self) -> Result<ContractDeployment, ConfigError> {
        self.deployments
            .for_chain(&self.chain)
            .copied()
            .ok_or_else(|| {
                let mut configured: Vec<String> =
                    self.deployments.chains().map(ToString::to_string).collect();
                configured.sort();
                ConfigError::NoDeployment {
                    chain: self.chain,
                    configured: if configured.is_empty() {
                        "none".to_string()
                    } else {
                        configured.join(", ")
                    },
                }
            })
    }
}

fn default_deadline_window_secs() -> u64 {
    DEFAULT_DEADLINE_WINDOW.as_secs()
}

fn default_confirmation_delay_ms() -> u64 {
    DEFAULT_CONFIRMATION_DELAY.as_millis() as u64
}

fn deserialize_chain<'de, D>(deserializer: D) -> Result<ChainReference, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(u64),
        Name(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Id(id) => Ok(ChainReference::new(id)),
        Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "relayUrl": "http://localhost:3000",
        "rpcUrl": "https://sepolia.base.org",
        "chain": "base-sepolia",
        "deployments": {
            "84532": {
                "payments": "0x1111111111111111111111111111111111111111",
                "registry": "0x2222222222222222222222222222222222222222",
                "token": "0x3333333333333333333333333333333333333333"
            }
        }
    }"#;

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(config.chain, ChainReference::new(84532));
        assert!(config.deployments.for_chain(&config.chain).is_some());
        assert_eq!(config.flow_config(), FlowConfig::default());
        assert_eq!(config.relay_timeout(), None);
        let deployment = config.deployment().unwrap();
        assert_eq!(Some(&deployment), config.deployments.for_chain(&config.chain));
    }

    #[test]
    fn test_config_relay_timeout() {
        let raw = CONFIG.replace(r#""chain""#, r#""relayTimeoutSecs": 30, "chain""#);
        let config: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(config.relay_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_missing_deployment_lists_configured_chains() {
        let raw = CONFIG.replace(r#""base-sepolia""#, r#""etherlink""#);
        let config: Config = serde_json::from_str(&raw).unwrap();
        let err = config.deployment().unwrap_err();
        assert!(matches!(err, ConfigError::NoDeployment { .. }));
        assert_eq!(
            err.to_string(),
            "No SplitHub deployment for eip155:42793 (configured: eip155:84532)"
        );
    }

    #[test]
    fn test_config_chain_forms() {
        for chain in [r#""eip155:42793""#, r#""42793""#, "42793", r#""etherlink""#] {
            let raw = CONFIG.replace(r#""base-sepolia""#, chain);
            let config: Config = serde_json::from_str(&raw).unwrap();
            assert_eq!(config.chain, ChainReference::new(42793), "{chain}");
        }
    }

    #[test]
    fn test_config_overrides_flow_tunables() {
        let raw = CONFIG.replace(
            r#""chain""#,
            r#""deadlineWindowSecs": 60, "confirmationDelayMs": 0, "chain""#,
        );
        let config: Config = serde_json::from_str(&raw).unwrap();
        let flow = config.flow_config();
        assert_eq!(flow.deadline_window, Duration::from_secs(60));
        assert_eq!(flow.confirmation_delay, Duration::ZERO);
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::load(Path::new("/nonexistent/splithub.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

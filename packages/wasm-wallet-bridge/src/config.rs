//! Bridge configuration.
//!
//! One `BridgeConfig` replaces the per-deployment builds: each deployment
//! picks a preset (or passes a config object from JavaScript) that fixes the
//! network endpoint, the mount target and the outbound event name.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Event name the embedded host listens on.
pub const DEFAULT_EVENT_NAME: &str = "dwa-pubkey";

/// Element id the embedded host reserves for the connect control.
pub const DEFAULT_MOUNT_TARGET_ID: &str = "dioxus-wallet-adapter";

/// Well-known Solana clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[serde(alias = "mainnet")]
    MainnetBeta,
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    pub fn endpoint_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn endpoint(&self) -> Result<ConnectionEndpoint, BridgeError> {
        ConnectionEndpoint::parse(self.endpoint_url())
    }
}

impl FromStr for Cluster {
    type Err = BridgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "local" | "localhost" => Ok(Cluster::Localnet),
            other => Err(BridgeError::Config(format!("unknown cluster: {}", other))),
        }
    }
}

/// The RPC endpoint the wallet UI connects through. Fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionEndpoint(Url);

impl ConnectionEndpoint {
    pub fn parse(value: &str) -> Result<Self, BridgeError> {
        let url = Url::parse(value)
            .map_err(|e| BridgeError::Config(format!("invalid endpoint {:?}: {}", value, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(ConnectionEndpoint(url)),
            scheme => Err(BridgeError::Config(format!(
                "endpoint must be http or https, got {}",
                scheme
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ConnectionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ConnectionEndpoint {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConnectionEndpoint::parse(&value)
    }
}

impl From<ConnectionEndpoint> for String {
    fn from(endpoint: ConnectionEndpoint) -> Self {
        endpoint.0.into()
    }
}

/// What the host boundary does with a failure after logging it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    /// Log and hand back nothing; the host reads "no result" as failure.
    #[default]
    Suppress,
    /// Log and hand the error back to the host.
    Propagate,
}

impl ErrorPolicy {
    /// Apply the policy to an already logged result.
    pub fn apply<T>(self, result: Result<T, BridgeError>) -> Result<Option<T>, BridgeError> {
        match (result, self) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(_), ErrorPolicy::Suppress) => Ok(None),
            (Err(e), ErrorPolicy::Propagate) => Err(e),
        }
    }
}

/// Bridge configuration, deserializable from a JavaScript object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    pub endpoint: ConnectionEndpoint,
    #[serde(default = "default_mount_target_id")]
    pub mount_target_id: String,
    #[serde(default = "default_event_name")]
    pub event_name: String,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_mount_target_id() -> String {
    DEFAULT_MOUNT_TARGET_ID.to_string()
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

impl BridgeConfig {
    pub fn new(endpoint: ConnectionEndpoint) -> Self {
        Self {
            endpoint,
            mount_target_id: default_mount_target_id(),
            event_name: default_event_name(),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn for_cluster(cluster: Cluster) -> Result<Self, BridgeError> {
        Ok(Self::new(cluster.endpoint()?))
    }

    /// Mainnet, mounted into the embedded host's reserved element.
    pub fn production() -> Result<Self, BridgeError> {
        Self::for_cluster(Cluster::MainnetBeta)
    }

    /// Local validator on the default RPC port.
    pub fn local() -> Result<Self, BridgeError> {
        Self::for_cluster(Cluster::Localnet)
    }

    /// Standalone page build with its own mount element.
    pub fn embedded() -> Result<Self, BridgeError> {
        Ok(Self::production()?.with_mount_target_id("plsss"))
    }

    pub fn devnet() -> Result<Self, BridgeError> {
        Self::for_cluster(Cluster::Devnet)
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Result<Self, BridgeError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "mainnet" => Self::production(),
            "local" | "localnet" => Self::local(),
            "embedded" => Self::embedded(),
            "devnet" => Self::devnet(),
            other => Err(BridgeError::Config(format!("unknown preset: {}", other))),
        }
    }

    pub fn with_mount_target_id(mut self, id: impl Into<String>) -> Self {
        self.mount_target_id = id.into();
        self
    }

    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.mount_target_id.trim().is_empty() {
            return Err(BridgeError::Config("mountTargetId must not be empty".into()));
        }
        if self.event_name.trim().is_empty() {
            return Err(BridgeError::Config("eventName must not be empty".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

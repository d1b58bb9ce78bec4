// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gate Configuration
//!
//! User-editable configuration for a gate node: app identity, network
//! binding, storage location and the decorative policy tick. Defaults mirror
//! the stock deployment; a YAML file discovered via the `--config` flag,
//! `GATE_CONFIG_PATH`, the working directory or the home directory overrides
//! them.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// App name shown in the config descriptor
    pub name: String,

    /// App description
    pub description: String,

    /// App domain
    pub domain: String,

    /// Optional backend; the gate stays fully functional without it
    pub backend_url: String,

    /// Testnet (sandbox) mode flag
    pub sandbox: bool,

    /// HTTP API bind address
    pub bind_addr: String,

    /// Data directory for the durable store; in-memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Byte quota for the durable store; unlimited when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<u64>,

    /// Wallet signer bridge URL; the scripted stub wallet is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_bridge_url: Option<String>,

    /// Decorative inter-check delay during policy review, in milliseconds
    pub policy_tick_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: "SmartContract Control Gate".to_string(),
            description:
                "A simple control gate for smart contract calls with policy checks and execution logging"
                    .to_string(),
            domain: "smartcontract.pi".to_string(),
            backend_url: "https://smartcontractgate.vercel.app".to_string(),
            sandbox: true,
            bind_addr: "127.0.0.1:8000".to_string(),
            data_dir: None,
            quota_bytes: None,
            wallet_bridge_url: None,
            policy_tick_ms: 0,
        }
    }
}

impl GateConfig {
    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Discover and load a config file, falling back to defaults.
    ///
    /// Discovery order: explicit override, `GATE_CONFIG_PATH`,
    /// `./gate-config.yaml`, `~/.contract-gate/config.yaml`.
    pub fn load_or_default(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = config_override {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var("GATE_CONFIG_PATH") {
            return Self::from_file(path);
        }
        let local = PathBuf::from("./gate-config.yaml");
        if local.exists() {
            return Self::from_file(local);
        }
        if let Some(home) = dirs::home_dir() {
            let user = home.join(".contract-gate").join("config.yaml");
            if user.exists() {
                return Self::from_file(user);
            }
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid(format!("bind_addr '{}' is not an address: {}", self.bind_addr, e))
        })?;
        if self.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "quota_bytes must be greater than zero when set".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parsed bind address. Call `validate` first; defaults are always valid.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!("bind_addr '{}' is not an address: {}", self.bind_addr, e))
        })
    }
}

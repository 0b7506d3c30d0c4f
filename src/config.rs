use crate::core::constants::{
    DEFAULT_FEE_AMOUNT, DEFAULT_FEE_DENOM, DEFAULT_GAS_LIMIT, DEFAULT_POLL_INTERVAL,
};
use crate::core::indexer::client::{FallbackIndexer, HttpIndexer};
use crate::error::TradeError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Contracts, indexer endpoints and fees of one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub registry_address: String,
    pub wrapper_address: String,
    pub indexer_endpoint: String,
    pub indexer_backup_endpoint: String,
    pub fee_denom: String,
    pub fee_amount: u64,
    pub gas_limit: u64,
    pub poll_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            registry_address: String::new(),
            wrapper_address: String::new(),
            indexer_endpoint: String::new(),
            indexer_backup_endpoint: String::new(),
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            fee_amount: DEFAULT_FEE_AMOUNT,
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl NetworkConfig {
    pub fn new(registry_address: &str, wrapper_address: &str) -> Self {
        Self {
            registry_address: registry_address.to_string(),
            wrapper_address: wrapper_address.to_string(),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        if self.poll_interval_secs == 0 {
            return DEFAULT_POLL_INTERVAL;
        }
        Duration::from_secs(self.poll_interval_secs)
    }

    // Primary endpoint with the backup as fallback
    pub fn indexer_client(&self) -> Result<FallbackIndexer<HttpIndexer>> {
        if self.indexer_endpoint.trim().is_empty() || self.indexer_backup_endpoint.trim().is_empty() {
            return Err(anyhow!("Indexer endpoints are not configured"));
        }
        Ok(FallbackIndexer::new(
            HttpIndexer::new(&self.indexer_endpoint),
            HttpIndexer::new(&self.indexer_backup_endpoint),
        ))
    }
}

/// Per-chain settings keyed by chain id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomyConfig {
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert("osmosis-1".to_string(), NetworkConfig::new("", ""));
        networks.insert(
            "osmo-test-4".to_string(),
            NetworkConfig::new(
                "osmo17p0twl5p4r3f3u09lqluamm8260et8p9vwaudt2mp508508uaxnse0xlwj",
                "osmo1g5kx37pu93ha2uk8c8w23d8s2m95a7pe8au9qnj2mjpy662vfqwsvvq9ec",
            ),
        );
        Self { networks }
    }
}

impl AutonomyConfig {
    // Reads the TOML file at `path`, writing the defaults there first if it is missing
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let config: Self = confy::load_path(&path)
            .with_context(|| format!("Error loading config from {}", path.display()))?;
        Ok(config)
    }

    pub fn store_to(&self, path: PathBuf) -> Result<()> {
        confy::store_path(&path, self)
            .with_context(|| format!("Error storing config to {}", path.display()))?;
        Ok(())
    }

    pub fn network(&self, chain_id: &str) -> Result<&NetworkConfig> {
        self.networks
            .get(chain_id)
            .ok_or_else(|| TradeError::UnknownNetwork(chain_id.to_string()).into())
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::pool::{Pool, Reservation};
use crate::wire::types::{FixedV4, MacAddress};

fn default_max_concurrent_requests() -> usize {
    50
}

fn default_request_timeout_seconds() -> u64 {
    5
}

/// Top-level parsed configuration. Mirrors the single YAML document read
/// at startup via `--conf`; no profile layering or hot reload.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub interfaces: Vec<String>,
    pub leasedir: PathBuf,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    pub pools: Vec<PoolConfig>,
}

#[derive(Debug, Deserialize)]
pub struct PoolConfig {
    pub name: String,
    pub network: FixedV4,
    pub mask: FixedV4,
    pub start: FixedV4,
    pub end: FixedV4,
    pub myip: FixedV4,
    #[serde(default)]
    pub routers: Vec<FixedV4>,
    #[serde(default)]
    pub dns: Vec<FixedV4>,
    pub leasetime: u32,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

#[derive(Debug, Deserialize)]
pub struct HostConfig {
    pub ip: FixedV4,
    pub hw: MacAddress,
    #[serde(default)]
    pub hostname: String,
}

impl Settings {
    /// Reads and validates the single configuration document at `path`.
    /// A missing file, YAML syntax error, or failed validation are all
    /// reported as a `ConfigError`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interfaces.is_empty() {
            return Err(ConfigError::NoInterfaces);
        }

        let mut seen_names = HashSet::new();
        let mut seen_networks: Vec<(&str, FixedV4, FixedV4)> = Vec::new();

        for pool in &self.pools {
            if pool.name.contains('/') {
                return Err(ConfigError::InvalidPoolName(pool.name.clone()));
            }
            if !seen_names.insert(pool.name.as_str()) {
                return Err(ConfigError::DuplicatePoolName(pool.name.clone()));
            }

            if pool.network.to_u32() & !pool.mask.to_u32() != 0 {
                return Err(ConfigError::InvalidAddress {
                    pool: pool.name.clone(),
                    value: pool.network.to_string(),
                    reason: "network address is not aligned to mask".into(),
                });
            }

            for &(other_name, network, mask) in &seen_networks {
                if network == pool.network && mask == pool.mask {
                    return Err(ConfigError::DuplicateNetwork {
                        first: other_name.to_string(),
                        second: pool.name.clone(),
                        network: pool.network.to_string(),
                    });
                }
            }
            seen_networks.push((pool.name.as_str(), pool.network, pool.mask));
        }

        Ok(())
    }

    /// Builds the server's pool registry from validated configuration.
    /// Duplicate reservations within a pool fail here, surfaced from
    /// `Pool::new`.
    pub fn build_pools(&self) -> Result<Vec<Pool>, ConfigError> {
        self.pools.iter().map(|pc| pc.to_pool(&self.leasedir)).collect()
    }
}

impl PoolConfig {
    fn to_pool(&self, leasedir: &Path) -> Result<Pool, ConfigError> {
        let reservations = self
            .hosts
            .iter()
            .map(|host| Reservation {
                mac: host.hw,
                ip: host.ip,
                hostname: host.hostname.clone(),
            })
            .collect();
        let lease_file = leasedir.join(format!("{}.json", self.name));

        Pool::new(
            self.name.clone(),
            self.network,
            self.mask,
            self.start,
            self.end,
            self.myip,
            self.routers.clone(),
            self.dns.clone(),
            self.leasetime,
            reservations,
            lease_file,
        )
    }
}

//! Chain identifiers and the endpoint registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Display label attached to every token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainLabel {
    Eth,
    Base,
    Polygon,
}

impl ChainLabel {
    pub const ETHEREUM_ID: u64 = 1;
    pub const BASE_ID: u64 = 8453;
    pub const POLYGON_ID: u64 = 137;

    pub fn chain_id(self) -> u64 {
        match self {
            Self::Eth => Self::ETHEREUM_ID,
            Self::Base => Self::BASE_ID,
            Self::Polygon => Self::POLYGON_ID,
        }
    }
}

impl fmt::Display for ChainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eth => write!(f, "ETH"),
            Self::Base => write!(f, "BASE"),
            Self::Polygon => write!(f, "POLYGON"),
        }
    }
}

/// A configured JSON-RPC endpoint for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub chain_id: u64,
    pub label: ChainLabel,
    pub rpc_url: String,
}

impl ChainEndpoint {
    pub fn new(label: ChainLabel, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id: label.chain_id(),
            label,
            rpc_url: rpc_url.into(),
        }
    }
}

/// Public endpoints used when no override is configured.
pub mod defaults {
    pub const ETHEREUM_RPC: &str = "https://cloudflare-eth.com";
    pub const BASE_RPC: &str = "https://mainnet.base.org";
    pub const POLYGON_RPC: &str = "https://polygon-rpc.com";
}

/// Immutable chain id → endpoint mapping, built once at startup.
///
/// Lookups fail closed: an id that was not registered has no endpoint.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    endpoints: BTreeMap<u64, ChainEndpoint>,
}

impl ChainRegistry {
    pub fn new(endpoints: impl IntoIterator<Item = ChainEndpoint>) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(|e| (e.chain_id, e)).collect(),
        }
    }

    /// Registry for Ethereum, Base and Polygon with the given RPC URLs.
    pub fn from_urls(
        ethereum: impl Into<String>,
        base: impl Into<String>,
        polygon: impl Into<String>,
    ) -> Self {
        Self::new([
            ChainEndpoint::new(ChainLabel::Eth, ethereum),
            ChainEndpoint::new(ChainLabel::Base, base),
            ChainEndpoint::new(ChainLabel::Polygon, polygon),
        ])
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainEndpoint> {
        self.endpoints.get(&chain_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainEndpoint> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChainRegistry {
        ChainRegistry::from_urls(
            defaults::ETHEREUM_RPC,
            defaults::BASE_RPC,
            defaults::POLYGON_RPC,
        )
    }

    #[test]
    fn known_chains_resolve() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get(1).unwrap().label, ChainLabel::Eth);
        assert_eq!(reg.get(8453).unwrap().rpc_url, "https://mainnet.base.org");
        assert_eq!(reg.get(137).unwrap().label, ChainLabel::Polygon);
    }

    #[test]
    fn unknown_chain_fails_closed() {
        let reg = registry();
        assert!(reg.get(999).is_none());
        assert!(reg.get(10).is_none());
    }

    #[test]
    fn label_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ChainLabel::Base).unwrap(), "\"BASE\"");
        assert_eq!(ChainLabel::Polygon.to_string(), "POLYGON");
    }
}

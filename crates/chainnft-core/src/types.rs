//! Contract calls, log filters, raw logs and the records returned to clients.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::abi::{self, to_hex};
use crate::chain::ChainLabel;

/// Parse a `0x`-prefixed 20-byte hex address. Case-insensitive.
pub fn parse_address(text: &str) -> Option<Address> {
    let lower = text.trim().to_ascii_lowercase();
    let digits = lower.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some(Address::from_slice(&bytes))
}

/// Lowercase `0x` form used in requests and responses.
pub fn format_address(address: &Address) -> String {
    to_hex(address.as_slice())
}

/// A read-only call against one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Vec<u8>,
}

impl ContractCall {
    pub fn new(to: Address, selector: abi::Selector, args: &[U256]) -> Self {
        Self {
            to,
            data: abi::call_data(selector, args),
        }
    }

    /// The call object passed as the first `eth_call` parameter.
    pub fn to_json(&self) -> Value {
        json!({
            "to": format_address(&self.to),
            "data": to_hex(&self.data),
        })
    }
}

/// One `eth_getLogs` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
}

impl LogFilter {
    /// Mint events (`Transfer` from the zero address) of `address` in `[from, to]`.
    pub fn mints(address: Address, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            address,
            topics: vec![abi::topics::TRANSFER, abi::topics::ZERO_ADDRESS],
        }
    }

    pub fn to_json(&self) -> Value {
        let topics: Vec<String> = self.topics.iter().map(|t| to_hex(t)).collect();
        json!({
            "fromBlock": abi::format_quantity(self.from_block),
            "toBlock": abi::format_quantity(self.to_block),
            "address": format_address(&self.address),
            "topics": topics,
        })
    }
}

/// A raw EVM log as returned by `eth_getLogs`. Only `topics` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Token id carried by the fourth topic of an ERC-721 `Transfer`.
    pub fn transfer_token_id(&self) -> Option<U256> {
        let topic = self.topics.get(3)?;
        let bytes = abi::decode_hex(topic).ok()?;
        abi::decode_uint(&bytes).ok()
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// Collection-level facts read from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    #[serde(with = "decimal")]
    pub total_supply: U256,
    pub enumerable: bool,
}

/// One `{key, value}` trait of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Token,
}

/// A token as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub kind: RecordKind,
    #[serde(with = "decimal")]
    pub id: U256,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub chain: ChainLabel,
    /// Always `true` for records read straight from the contract.
    pub verified: bool,
    /// On-chain reads carry no price; serialized as `null`.
    #[serde(rename = "priceEth", default)]
    pub price_eth: Option<f64>,
    pub collection: String,
    pub attributes: Vec<Attribute>,
}

/// `U256` as a decimal string, so clients never lose precision.
pub mod decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::abi::parse_uint(&text).map_err(serde::de::Error::custom)
    }
}

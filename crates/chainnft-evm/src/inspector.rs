//! Collection-level reads against an ERC-721 contract.
//!
//! Each read is one `eth_call` with hand-built call data. The enumerability
//! probe is a capability check and never fails: any error answering
//! `tokenByIndex(0)` means the contract is not enumerable.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use chainnft_core::abi::{self, selectors, Selector};
use chainnft_core::types::{format_address, parse_address, CollectionInfo, ContractCall};

use crate::error::ReaderError;
use crate::rpc::ChainRpc;

/// Validate `text` as a contract address.
pub fn require_address(text: &str) -> Result<Address, ReaderError> {
    parse_address(text).ok_or_else(|| ReaderError::InvalidAddress(text.to_string()))
}

#[derive(Clone)]
pub struct CollectionInspector {
    rpc: Arc<ChainRpc>,
}

impl CollectionInspector {
    pub fn new(rpc: Arc<ChainRpc>) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &ChainRpc {
        &self.rpc
    }

    /// Read name, symbol and total supply, then probe enumerability.
    ///
    /// The chain is checked before the address, so an unknown chain is
    /// reported even when the address is malformed too.
    pub async fn info(&self, chain_id: u64, address: &str) -> Result<CollectionInfo, ReaderError> {
        self.rpc.endpoint(chain_id)?;
        let contract = require_address(address)?;
        let collection = format_address(&contract);

        let read = async {
            let name = self.read_string(chain_id, contract, selectors::NAME).await?;
            let symbol = self.read_string(chain_id, contract, selectors::SYMBOL).await?;
            let total_supply = self.total_supply(chain_id, contract).await?;
            Ok::<_, ReaderError>((name, symbol, total_supply))
        };
        let (name, symbol, total_supply) = read.await.map_err(|e| {
            tracing::warn!(chain_id, address = %collection, error = %e, "collection read failed");
            ReaderError::contract_read(&collection, e)
        })?;

        let enumerable = self.is_enumerable(chain_id, contract).await;
        tracing::debug!(chain_id, address = %collection, %total_supply, enumerable, "collection info");

        Ok(CollectionInfo {
            address: collection,
            name,
            symbol,
            total_supply,
            enumerable,
        })
    }

    /// `true` if `tokenByIndex(0)` answers without error.
    pub async fn is_enumerable(&self, chain_id: u64, contract: Address) -> bool {
        match self.token_by_index(chain_id, contract, U256::ZERO).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(chain_id, error = %e, "tokenByIndex(0) probe failed");
                false
            }
        }
    }

    pub async fn total_supply(&self, chain_id: u64, contract: Address) -> Result<U256, ReaderError> {
        self.read_uint(chain_id, contract, selectors::TOTAL_SUPPLY, &[]).await
    }

    pub async fn token_by_index(
        &self,
        chain_id: u64,
        contract: Address,
        index: U256,
    ) -> Result<U256, ReaderError> {
        self.read_uint(chain_id, contract, selectors::TOKEN_BY_INDEX, &[index]).await
    }

    pub async fn token_uri(
        &self,
        chain_id: u64,
        contract: Address,
        token_id: U256,
    ) -> Result<String, ReaderError> {
        let data = self
            .call(chain_id, contract, selectors::TOKEN_URI, &[token_id])
            .await?;
        Ok(abi::decode_dynamic_string(&data))
    }

    /// Current owner of `token_id`, decoded from the low 20 bytes of the word.
    pub async fn owner_of(
        &self,
        chain_id: u64,
        contract: Address,
        token_id: U256,
    ) -> Result<Address, ReaderError> {
        let word = self
            .read_uint(chain_id, contract, selectors::OWNER_OF, &[token_id])
            .await?;
        let bytes = abi::encode_uint(word);
        Ok(Address::from_slice(&bytes[12..]))
    }

    async fn read_string(
        &self,
        chain_id: u64,
        contract: Address,
        selector: Selector,
    ) -> Result<String, ReaderError> {
        let data = self.call(chain_id, contract, selector, &[]).await?;
        Ok(abi::decode_dynamic_string(&data))
    }

    async fn read_uint(
        &self,
        chain_id: u64,
        contract: Address,
        selector: Selector,
        args: &[U256],
    ) -> Result<U256, ReaderError> {
        let data = self.call(chain_id, contract, selector, args).await?;
        Ok(abi::decode_uint(&data)?)
    }

    async fn call(
        &self,
        chain_id: u64,
        contract: Address,
        selector: Selector,
        args: &[U256],
    ) -> Result<Vec<u8>, ReaderError> {
        let call = ContractCall::new(contract, selector, args);
        self.rpc.eth_call(chain_id, &call).await
    }
}

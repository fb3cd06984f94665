use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use std::str::FromStr;

use crate::chain::contract::mint_event_from_logs;
use crate::error::{AppError, Result};

/// Mint facts recovered from the chain for a claimed transaction
#[derive(Debug, Clone)]
pub struct VerifiedMint {
    pub recipient: String,
    pub token_id: String,
}

/// Read-side check that a claimed mint really happened.
///
/// `fetch_mint` returns `MintNotVerified` when the transaction is missing,
/// reverted, or carries no mint event from the registry contract; transport
/// failures surface as `Chain` errors instead so callers can tell an
/// unreachable node apart from a bogus claim.
#[async_trait]
pub trait MintVerifier: Send + Sync {
    async fn fetch_mint(&self, tx_hash: &str) -> Result<VerifiedMint>;
}

/// Verifier backed by a JSON-RPC node
pub struct RpcMintVerifier {
    rpc_url: String,
    contract: Address,
}

impl RpcMintVerifier {
    pub fn new(rpc_url: &str, contract_address: &str) -> Result<Self> {
        let contract = Address::from_str(contract_address).map_err(|e| {
            AppError::Internal(format!(
                "Invalid registry contract address '{contract_address}': {e}"
            ))
        })?;

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            contract,
        })
    }
}

#[async_trait]
impl MintVerifier for RpcMintVerifier {
    async fn fetch_mint(&self, tx_hash: &str) -> Result<VerifiedMint> {
        let hash = TxHash::from_str(tx_hash.trim()).map_err(|_| {
            AppError::MintNotVerified(format!("Malformed transaction hash '{tx_hash}'"))
        })?;

        let url = self
            .rpc_url
            .parse()
            .map_err(|e| AppError::Chain(format!("Invalid RPC URL: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);

        let receipt = provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| AppError::Chain(format!("Receipt lookup failed: {e}")))?
            .ok_or_else(|| {
                AppError::MintNotVerified(format!(
                    "Transaction {tx_hash} was not found on chain or is not yet confirmed"
                ))
            })?;

        if !receipt.status() {
            return Err(AppError::MintNotVerified(format!(
                "Transaction {tx_hash} reverted"
            )));
        }

        let event = mint_event_from_logs(receipt.inner.logs(), self.contract).ok_or_else(|| {
            AppError::MintNotVerified(format!(
                "Transaction {tx_hash} contains no mint event from the registry contract"
            ))
        })?;

        Ok(VerifiedMint {
            recipient: event.recipient.to_string(),
            token_id: event.token_id.to_string(),
        })
    }
}

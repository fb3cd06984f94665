use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::contract::{mint_event_from_logs, IIpNft};
use crate::workflow::{MintWallet, MintedToken, WorkflowError};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Local-key wallet that mints through the registry contract
pub struct WalletMinter {
    signer: PrivateKeySigner,
    rpc_url: String,
    contract: Address,
}

impl WalletMinter {
    pub fn new(
        private_key: &str,
        rpc_url: &str,
        contract_address: &str,
    ) -> Result<Self, WorkflowError> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| WorkflowError::Wallet(format!("invalid private key: {e}")))?;
        let contract = Address::from_str(contract_address).map_err(|e| {
            WorkflowError::Wallet(format!("invalid contract address '{contract_address}': {e}"))
        })?;

        Ok(Self {
            signer,
            rpc_url: rpc_url.to_string(),
            contract,
        })
    }

    /// Address of the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn provider(&self) -> Result<impl Provider, WorkflowError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| WorkflowError::Wallet(format!("invalid RPC URL: {e}")))?;
        Ok(ProviderBuilder::new().wallet(wallet).connect_http(url))
    }
}

#[async_trait]
impl MintWallet for WalletMinter {
    async fn submit_mint(
        &self,
        recipient: &str,
        token_uri: &str,
    ) -> Result<String, WorkflowError> {
        let to = Address::from_str(recipient)
            .map_err(|e| WorkflowError::Wallet(format!("invalid recipient address: {e}")))?;

        let provider = self.provider()?;
        let contract = IIpNft::new(self.contract, &provider);

        let pending_tx = contract
            .safeMint(to, token_uri.to_string())
            .send()
            .await
            .map_err(|e| WorkflowError::Wallet(format!("mint transaction rejected: {e}")))?;

        let tx_hash = *pending_tx.tx_hash();
        tracing::debug!("Mint transaction submitted: {:?}", tx_hash);
        Ok(format!("{:?}", tx_hash))
    }

    async fn wait_for_mint(&self, tx_hash: &str) -> Result<MintedToken, WorkflowError> {
        let hash = TxHash::from_str(tx_hash.trim())
            .map_err(|e| WorkflowError::Wallet(format!("invalid transaction hash: {e}")))?;
        let provider = self.provider()?;

        // Confirmation is externally paced; poll until the receipt shows up
        // and leave any timeout to the caller.
        loop {
            match provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if !receipt.status() {
                        return Err(WorkflowError::Wallet(format!(
                            "transaction {tx_hash} reverted"
                        )));
                    }
                    let event = mint_event_from_logs(receipt.inner.logs(), self.contract)
                        .ok_or(WorkflowError::MissingMintEvent)?;
                    return Ok(MintedToken {
                        token_id: event.token_id.to_string(),
                        recipient: event.recipient.to_string(),
                    });
                }
                Ok(None) => {
                    tracing::debug!("Transaction {} not yet confirmed", tx_hash);
                }
                Err(e) => {
                    return Err(WorkflowError::Wallet(format!(
                        "receipt polling failed: {e}"
                    )));
                }
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

use async_trait::async_trait;

pub mod api;
pub mod phase;
pub mod runner;

pub use api::*;
pub use phase::*;
pub use runner::*;

/// Errors surfaced by the client-side mint workflow
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The advisory usage check refused the upload before any network call.
    #[error("{0}")]
    Quota(String),

    /// The registry API refused the request or could not be reached.
    #[error("registry API error: {0}")]
    Api(String),

    /// The wallet rejected, failed to sign, or could not reach the node.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// The confirmed transaction did not emit a mint event.
    #[error("the confirmed transaction contains no mint event")]
    MissingMintEvent,
}

/// Token facts returned once a mint transaction confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedToken {
    pub token_id: String,
    pub recipient: String,
}

/// Wallet abstraction driving the on-chain half of the workflow
#[async_trait]
pub trait MintWallet: Send + Sync {
    /// Submit the mint and return its transaction hash.
    ///
    /// Suspends for as long as the signer takes to approve; a rejection is an
    /// ordinary `Wallet` error.
    async fn submit_mint(&self, recipient: &str, token_uri: &str)
        -> Result<String, WorkflowError>;

    /// Wait until the transaction confirmed and extract the minted token.
    async fn wait_for_mint(&self, tx_hash: &str) -> Result<MintedToken, WorkflowError>;
}

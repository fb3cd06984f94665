use crate::models::MintConfirmationResponse;

/// Phases of one upload-and-mint attempt, strictly ordered.
///
/// Every run walks the sequence in order until it reaches a terminal
/// phase; there are no parallel branches and no retries. The payloads
/// carry everything a display layer needs without reaching back into
/// the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum MintPhase {
    Idle,
    CheckingLimits,
    UploadingFile { filename: String },
    PreparingMetadata { filename: String },
    WaitingForSignature { token_uri: String },
    Minting { tx_hash: String },
    ConfirmingBackend { tx_hash: String, token_id: String },
    Succeeded { outcome: MintConfirmationResponse },
    Failed { message: String },
}

impl MintPhase {
    /// User-facing progress label.
    pub fn label(&self) -> String {
        match self {
            MintPhase::Idle => "Ready.".to_string(),
            MintPhase::CheckingLimits => "Checking usage limits...".to_string(),
            MintPhase::UploadingFile { filename } => {
                format!("Uploading {filename}...")
            }
            MintPhase::PreparingMetadata { .. } => "Preparing metadata on IPFS...".to_string(),
            MintPhase::WaitingForSignature { .. } => {
                "Please confirm the mint transaction in your wallet...".to_string()
            }
            MintPhase::Minting { tx_hash } => {
                format!("Minting (tx {}...)", shortened(tx_hash))
            }
            MintPhase::ConfirmingBackend { .. } => "Saving record...".to_string(),
            MintPhase::Succeeded { .. } => "Record created successfully.".to_string(),
            MintPhase::Failed { message } => format!("Error: {message}"),
        }
    }

    /// Terminal phases end the run; nothing is published after them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MintPhase::Succeeded { .. } | MintPhase::Failed { .. })
    }
}

fn shortened(tx_hash: &str) -> &str {
    tx_hash.get(..10).unwrap_or(tx_hash)
}

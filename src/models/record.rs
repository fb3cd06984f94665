use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Immutable descriptor of uploaded file content
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub sha256_hash: String,
    pub storage_provider: String,
    pub storage_ref: String,
    pub created_at: String,
}

/// Timestamp record anchoring a file to an on-chain mint
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IpRecord {
    pub id: String,
    pub user_id: String,
    pub file_id: String,
    pub asset_name: String,
    pub asset_description: String,
    pub blockchain_tx_hash: String,
    pub nft_contract_address: Option<String>,
    pub nft_token_id: String,
    pub metadata_cid: String,
    pub status: String,
    pub created_at: String,
}

/// Response of the upload/prepare endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareMintResponse {
    pub message: String,
    pub token_uri: String,
    pub file_hash: String,
    pub file_cid: String,
    pub original_filename: String,
}

/// Confirm-mint request sent after the wallet transaction confirmed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintConfirmationRequest {
    pub tx_hash: String,
    pub token_id: String,
    pub file_hash: String,
    pub file_cid: String,
    pub metadata_cid: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

/// Confirm-mint response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintConfirmationResponse {
    pub message: String,
    pub file_record_id: String,
    pub ip_record_id: String,
    pub token_id: String,
    pub tx_hash: String,
}

/// Verify-by-hash request body
#[derive(Debug, Deserialize)]
pub struct VerifyHashRequest {
    pub hash: String,
}

/// One verification match, built from a file row and its timestamp record
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMatch {
    pub file_name: String,
    pub file_hash: String,
    pub file_cid: String,
    pub asset_name: String,
    pub status: String,
    pub timestamp: String,
    pub anchoring_tx_hash: String,
    pub nft_contract_address: Option<String>,
    pub nft_token_id: String,
    pub metadata_cid: String,
}

/// Verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: String,
    pub results: Vec<VerificationMatch>,
}

/// File fields embedded in a record listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFileInfo {
    pub id: String,
    pub original_filename: String,
    pub sha256_hash: String,
    pub storage_ref: String,
}

/// One entry of the authenticated record listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    pub asset_name: String,
    pub status: String,
    pub created_at: String,
    pub nft_token_id: String,
    pub nft_contract_address: Option<String>,
    pub metadata_cid: String,
    pub file: RecordFileInfo,
}

use bytes::Bytes;

use crate::chain::MintVerifier;
use crate::config::LimitsConfig;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{MintConfirmationRequest, MintConfirmationResponse, PrepareMintResponse};
use crate::pinning::Pinner;
use crate::services::usage::{LimitDecision, UsageService};
use crate::util::hash::{normalize_sha256, sha256_hex};

/// An upload accepted for mint preparation
pub struct UploadedAsset {
    pub bytes: Bytes,
    pub filename: String,
    pub mime_type: String,
}

/// Mint preparation and confirmation service
pub struct MintService;

impl MintService {
    /// Prepare an upload for minting: gate, hash, pin file, pin metadata.
    ///
    /// Persists nothing; the DTO it returns is all the client needs to mint,
    /// and an abandoned attempt leaves only pinned content behind.
    pub async fn prepare(
        db: &Database,
        pinner: &dyn Pinner,
        limits: &LimitsConfig,
        user_id: &str,
        asset: &UploadedAsset,
    ) -> Result<PrepareMintResponse> {
        match UsageService::check_limits(db, limits, user_id, asset.bytes.len() as i64).await? {
            LimitDecision::Allowed => {}
            LimitDecision::Denied { reason } => return Err(AppError::Quota(reason)),
        }

        let file_hash = sha256_hex(&asset.bytes);

        let file_cid = pinner
            .pin_bytes(asset.bytes.clone(), &asset.filename)
            .await?
            .ok_or_else(|| AppError::Pinning("Failed to upload file to IPFS.".to_string()))?;

        let metadata = Self::build_metadata(
            &asset.filename,
            &asset.mime_type,
            asset.bytes.len() as i64,
            &file_hash,
            &file_cid,
        );
        let metadata_name = format!("{file_cid}.json");
        let metadata_cid = pinner
            .pin_json(&metadata, &metadata_name)
            .await?
            .ok_or_else(|| {
                AppError::Pinning("Failed to upload metadata JSON to IPFS.".to_string())
            })?;

        tracing::info!(
            "Prepared mint for '{}': file CID {}, metadata CID {}",
            asset.filename,
            file_cid,
            metadata_cid
        );

        Ok(PrepareMintResponse {
            message: "File uploaded and metadata prepared for minting.".to_string(),
            token_uri: format!("ipfs://{metadata_cid}"),
            file_hash,
            file_cid,
            original_filename: asset.filename.clone(),
        })
    }

    /// NFT metadata document pinned next to the file.
    fn build_metadata(
        filename: &str,
        mime_type: &str,
        size_bytes: i64,
        file_hash: &str,
        file_cid: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "name": filename,
            "description": format!("Timestamped asset: {filename}"),
            "image": format!("ipfs://{file_cid}"),
            "properties": {
                "fileHash": file_hash,
                "mimeType": mime_type,
                "sizeBytes": size_bytes,
                "originalFilename": filename,
            }
        })
    }

    /// Persist a confirmed mint: one file row plus one timestamp record.
    ///
    /// When a verifier is supplied, the claimed transaction is checked on
    /// chain first and nothing is written unless it really minted the
    /// claimed token. The two inserts share one transaction; the usage
    /// counter bump afterwards is best effort.
    pub async fn confirm(
        db: &Database,
        verifier: Option<&dyn MintVerifier>,
        contract_address: Option<&str>,
        storage_provider: &str,
        user_id: &str,
        req: &MintConfirmationRequest,
    ) -> Result<MintConfirmationResponse> {
        Self::validate_confirmation(req)?;
        let file_hash = normalize_sha256(&req.file_hash).ok_or_else(|| {
            AppError::BadRequest("Invalid SHA-256 hash format provided.".to_string())
        })?;

        if let Some(verifier) = verifier {
            let onchain = verifier.fetch_mint(&req.tx_hash).await?;
            if onchain.token_id != req.token_id.trim() {
                return Err(AppError::MintNotVerified(format!(
                    "Claimed token id {} does not match on-chain token id {}",
                    req.token_id, onchain.token_id
                )));
            }
            tracing::debug!(
                "Verified mint {} of token {} to {}",
                req.tx_hash,
                onchain.token_id,
                onchain.recipient
            );
        }

        let file_record_id = uuid::Uuid::new_v4().to_string();
        let ip_record_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let asset_name = req.original_filename.clone();
        let asset_description = format!("Timestamped asset: {}", req.original_filename);

        // Both rows or neither
        let mut tx = db.pool().begin().await?;
        sqlx::query(
            "INSERT INTO files (id, user_id, original_filename, mime_type, size_bytes, sha256_hash, storage_provider, storage_ref, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file_record_id)
        .bind(user_id)
        .bind(&req.original_filename)
        .bind(&req.mime_type)
        .bind(req.size_bytes)
        .bind(&file_hash)
        .bind(storage_provider)
        .bind(&req.file_cid)
        .bind(&now)
        .execute(tx.as_mut())
        .await?;

        sqlx::query(
            "INSERT INTO ip_records (id, user_id, file_id, asset_name, asset_description, blockchain_tx_hash, nft_contract_address, nft_token_id, metadata_cid, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'minted', ?)",
        )
        .bind(&ip_record_id)
        .bind(user_id)
        .bind(&file_record_id)
        .bind(&asset_name)
        .bind(&asset_description)
        .bind(&req.tx_hash)
        .bind(contract_address)
        .bind(req.token_id.trim())
        .bind(&req.metadata_cid)
        .bind(&now)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;

        match UsageService::increment_usage(db, user_id, req.size_bytes).await {
            Ok(0) => tracing::warn!(
                "Usage profile missing for {} after mint confirmation",
                user_id
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to update usage counters for {}: {}", user_id, e),
        }

        tracing::info!(
            "Confirmed mint of token {} for user {} (record {})",
            req.token_id,
            user_id,
            ip_record_id
        );

        Ok(MintConfirmationResponse {
            message: "Minting confirmed and records saved successfully.".to_string(),
            file_record_id,
            ip_record_id,
            token_id: req.token_id.trim().to_string(),
            tx_hash: req.tx_hash.clone(),
        })
    }

    fn validate_confirmation(req: &MintConfirmationRequest) -> Result<()> {
        let any_missing = req.tx_hash.trim().is_empty()
            || req.token_id.trim().is_empty()
            || req.file_hash.trim().is_empty()
            || req.file_cid.trim().is_empty()
            || req.metadata_cid.trim().is_empty()
            || req.original_filename.trim().is_empty()
            || req.mime_type.trim().is_empty()
            || req.size_bytes <= 0;

        if any_missing {
            return Err(AppError::BadRequest(
                "Missing required minting details.".to_string(),
            ));
        }
        Ok(())
    }
}

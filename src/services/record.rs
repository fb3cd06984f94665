use sqlx::FromRow;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{FileRecord, IpRecord, RecordFileInfo, RecordSummary};

/// Flat join row behind the dashboard listing
#[derive(Debug, FromRow)]
struct ListingRow {
    id: String,
    asset_name: String,
    status: String,
    created_at: String,
    nft_token_id: String,
    nft_contract_address: Option<String>,
    metadata_cid: String,
    file_id: String,
    original_filename: String,
    sha256_hash: String,
    storage_ref: String,
}

/// Queries over a user's timestamp records
pub struct RecordService;

impl RecordService {
    /// All records owned by the user, newest first, with file info attached.
    pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<RecordSummary>> {
        let rows: Vec<ListingRow> = sqlx::query_as(
            "SELECT ip.id, ip.asset_name, ip.status, ip.created_at, ip.nft_token_id, \
                    ip.nft_contract_address, ip.metadata_cid, \
                    f.id AS file_id, f.original_filename, f.sha256_hash, f.storage_ref \
             FROM ip_records ip \
             JOIN files f ON f.id = ip.file_id \
             WHERE ip.user_id = ? \
             ORDER BY ip.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RecordSummary {
                id: row.id,
                asset_name: row.asset_name,
                status: row.status,
                created_at: row.created_at,
                nft_token_id: row.nft_token_id,
                nft_contract_address: row.nft_contract_address,
                metadata_cid: row.metadata_cid,
                file: RecordFileInfo {
                    id: row.file_id,
                    original_filename: row.original_filename,
                    sha256_hash: row.sha256_hash,
                    storage_ref: row.storage_ref,
                },
            })
            .collect())
    }

    /// Fetch one record plus its file, refusing records the user does not own.
    ///
    /// Ownership failures and missing ids look the same to the caller.
    pub async fn fetch_owned(
        db: &Database,
        user_id: &str,
        record_id: &str,
    ) -> Result<(IpRecord, FileRecord)> {
        let record: IpRecord =
            sqlx::query_as("SELECT * FROM ip_records WHERE id = ? AND user_id = ?")
                .bind(record_id)
                .bind(user_id)
                .fetch_optional(db.pool())
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("IP Record not found or access denied.".to_string())
                })?;

        let file: FileRecord = sqlx::query_as("SELECT * FROM files WHERE id = ?")
            .bind(&record.file_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| {
                tracing::error!(
                    "File row {} missing for record {}",
                    record.file_id,
                    record.id
                );
                AppError::Internal("Associated file data not found.".to_string())
            })?;

        Ok((record, file))
    }
}

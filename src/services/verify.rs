use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::VerificationMatch;
use crate::util::hash::{normalize_sha256, sha256_hex};

/// Outcome of a verification lookup, before it is shaped into a response
#[derive(Debug)]
pub enum VerificationOutcome {
    /// One or more confirmed timestamp records match the hash.
    Matches(Vec<VerificationMatch>),
    /// The hash belongs to a stored file that has no timestamp record yet.
    FileWithoutRecord,
    /// The hash is not present in any stored file.
    HashUnknown,
}

/// Public verification lookups, no authentication involved
pub struct VerifyService;

impl VerifyService {
    /// Verify a caller-supplied hash string.
    pub async fn verify_hash(db: &Database, raw_hash: &str) -> Result<VerificationOutcome> {
        let hash = normalize_sha256(raw_hash).ok_or_else(|| {
            AppError::BadRequest("Invalid SHA-256 hash format provided.".to_string())
        })?;
        tracing::debug!("Verifying provided hash {hash}");
        Self::lookup(db, &hash).await
    }

    /// Hash an uploaded document and verify the digest.
    pub async fn verify_bytes(db: &Database, data: &[u8]) -> Result<VerificationOutcome> {
        let hash = sha256_hex(data);
        tracing::debug!("Verifying uploaded content, digest {hash}");
        Self::lookup(db, &hash).await
    }

    async fn lookup(db: &Database, hash: &str) -> Result<VerificationOutcome> {
        let matches: Vec<VerificationMatch> = sqlx::query_as(
            "SELECT f.original_filename AS file_name, f.sha256_hash AS file_hash, \
                    f.storage_ref AS file_cid, ip.asset_name, ip.status, \
                    ip.created_at AS timestamp, ip.blockchain_tx_hash AS anchoring_tx_hash, \
                    ip.nft_contract_address, ip.nft_token_id, ip.metadata_cid \
             FROM files f \
             JOIN ip_records ip ON ip.file_id = f.id \
             WHERE f.sha256_hash = ? \
             ORDER BY ip.created_at DESC",
        )
        .bind(hash)
        .fetch_all(db.pool())
        .await?;

        if !matches.is_empty() {
            return Ok(VerificationOutcome::Matches(matches));
        }

        // A file row with no record is a different answer than an unknown hash.
        let files: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE sha256_hash = ?")
            .bind(hash)
            .fetch_one(db.pool())
            .await?;

        if files.0 > 0 {
            Ok(VerificationOutcome::FileWithoutRecord)
        } else {
            Ok(VerificationOutcome::HashUnknown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil::temp_db;

    const HELLO_HASH: &str = "7509e5bda0c762d2bac7f90d758b5b2263fa01ccbc542ab5e3df163be08e6ca9";

    async fn seed_file(db: &Database, file_id: &str, hash: &str) {
        sqlx::query(
            "INSERT INTO files (id, user_id, original_filename, mime_type, size_bytes, sha256_hash, storage_provider, storage_ref, created_at) \
             VALUES (?, 'user-1', 'design.png', 'image/png', 12, ?, 'ipfs', 'QmFileFake', '2026-08-24T10:00:00Z')",
        )
        .bind(file_id)
        .bind(hash)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn seed_record(db: &Database, record_id: &str, file_id: &str, created_at: &str) {
        sqlx::query(
            "INSERT INTO ip_records (id, user_id, file_id, asset_name, asset_description, blockchain_tx_hash, nft_contract_address, nft_token_id, metadata_cid, status, created_at) \
             VALUES (?, 'user-1', ?, 'design.png', 'Timestamped asset: design.png', '0xabc123', '0x5FbDB2315678afecb367f032d93F642f64180aa3', '7', 'QmMetaFake', 'minted', ?)",
        )
        .bind(record_id)
        .bind(file_id)
        .bind(created_at)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn verify_hash_finds_confirmed_records() {
        let (_dir, db) = temp_db().await;
        seed_file(&db, "file-1", HELLO_HASH).await;
        seed_record(&db, "rec-1", "file-1", "2026-08-24T10:05:00Z").await;

        let outcome = VerifyService::verify_hash(&db, HELLO_HASH).await.unwrap();
        let matches = match outcome {
            VerificationOutcome::Matches(m) => m,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(matches.len(), 1);
        let hit = &matches[0];
        assert_eq!(hit.file_name, "design.png");
        assert_eq!(hit.file_hash, HELLO_HASH);
        assert_eq!(hit.file_cid, "QmFileFake");
        assert_eq!(hit.asset_name, "design.png");
        assert_eq!(hit.status, "minted");
        assert_eq!(hit.timestamp, "2026-08-24T10:05:00Z");
        assert_eq!(hit.anchoring_tx_hash, "0xabc123");
        assert_eq!(
            hit.nft_contract_address.as_deref(),
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert_eq!(hit.nft_token_id, "7");
        assert_eq!(hit.metadata_cid, "QmMetaFake");
    }

    #[tokio::test]
    async fn verify_hash_accepts_prefixed_uppercase_input() {
        let (_dir, db) = temp_db().await;
        seed_file(&db, "file-1", HELLO_HASH).await;
        seed_record(&db, "rec-1", "file-1", "2026-08-24T10:05:00Z").await;

        let prefixed = format!("0x{}", HELLO_HASH.to_uppercase());
        let outcome = VerifyService::verify_hash(&db, &prefixed).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::Matches(_)));
    }

    #[tokio::test]
    async fn verify_hash_rejects_malformed_input() {
        let (_dir, db) = temp_db().await;
        let err = VerifyService::verify_hash(&db, "not-a-hash").await.unwrap_err();
        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "Invalid SHA-256 hash format provided.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_hash_reports_an_unknown_hash() {
        let (_dir, db) = temp_db().await;
        let outcome = VerifyService::verify_hash(&db, HELLO_HASH).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::HashUnknown));
    }

    #[tokio::test]
    async fn verify_hash_reports_a_file_without_a_record() {
        let (_dir, db) = temp_db().await;
        seed_file(&db, "file-1", HELLO_HASH).await;

        let outcome = VerifyService::verify_hash(&db, HELLO_HASH).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::FileWithoutRecord));
    }

    #[tokio::test]
    async fn verify_bytes_hashes_then_looks_up() {
        let (_dir, db) = temp_db().await;
        seed_file(&db, "file-1", HELLO_HASH).await;
        seed_record(&db, "rec-1", "file-1", "2026-08-24T10:05:00Z").await;

        let outcome = VerifyService::verify_bytes(&db, b"hello world!").await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::Matches(_)));

        let outcome = VerifyService::verify_bytes(&db, b"different content").await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::HashUnknown));
    }

    #[tokio::test]
    async fn newest_record_listed_first() {
        let (_dir, db) = temp_db().await;
        seed_file(&db, "file-1", HELLO_HASH).await;
        seed_record(&db, "rec-old", "file-1", "2026-08-20T09:00:00Z").await;
        seed_record(&db, "rec-new", "file-1", "2026-08-24T10:05:00Z").await;

        let outcome = VerifyService::verify_hash(&db, HELLO_HASH).await.unwrap();
        let matches = match outcome {
            VerificationOutcome::Matches(m) => m,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].timestamp, "2026-08-24T10:05:00Z");
        assert_eq!(matches[1].timestamp, "2026-08-20T09:00:00Z");
    }
}

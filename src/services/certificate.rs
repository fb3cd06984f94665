use crate::db::Database;
use crate::error::Result;
use crate::models::{FileRecord, IpRecord};
use crate::services::record::RecordService;
use crate::util::pdf::{Font, PageBuilder};

/// Proof-of-existence certificate rendering
pub struct CertificateService;

impl CertificateService {
    /// Render the certificate PDF for a record the user owns.
    pub async fn render(db: &Database, user_id: &str, record_id: &str) -> Result<Vec<u8>> {
        let (record, file) = RecordService::fetch_owned(db, user_id, record_id).await?;
        tracing::info!("Generating certificate for record {}", record.id);
        Ok(Self::build_pdf(&record, &file))
    }

    fn build_pdf(record: &IpRecord, file: &FileRecord) -> Vec<u8> {
        let contract = record.nft_contract_address.as_deref().unwrap_or("N/A");
        let mut page = PageBuilder::new();
        page.text(
            Font::Bold,
            20,
            "Veltis Protocol - Proof of Existence Certificate",
        )
        .gap(24)
        .text(Font::Bold, 12, &format!("Asset Name: {}", record.asset_name))
        .text(
            Font::Bold,
            12,
            &format!("Original Filename: {}", file.original_filename),
        )
        .gap(12)
        .text(
            Font::Bold,
            12,
            &format!("Timestamp (UTC): {}", format_utc(&record.created_at)),
        )
        .gap(18)
        .text(Font::Bold, 10, "File Details:")
        .text(
            Font::Regular,
            10,
            &format!("- SHA-256 Hash: {}", file.sha256_hash),
        )
        .text(
            Font::Regular,
            10,
            &format!("- IPFS CID (File): {}", file.storage_ref),
        )
        .gap(18)
        .text(Font::Bold, 10, "Blockchain Record:")
        .text(
            Font::Regular,
            10,
            &format!("- Anchoring Transaction Hash: {}", record.blockchain_tx_hash),
        )
        .text(
            Font::Regular,
            10,
            &format!("- NFT Contract Address: {contract}"),
        )
        .text(
            Font::Regular,
            10,
            &format!("- NFT Token ID: {}", record.nft_token_id),
        )
        .text(
            Font::Regular,
            10,
            &format!("- Metadata IPFS CID: {}", record.metadata_cid),
        )
        .gap(36)
        .text(
            Font::Oblique,
            8,
            &format!(
                "Certificate generated on: {}. Record ID: {}.",
                format_utc(&chrono::Utc::now().to_rfc3339()),
                record.id
            ),
        )
        .text(
            Font::Oblique,
            8,
            "Verification details can be cross-referenced using the provided hashes and CIDs.",
        );
        page.render()
    }
}

/// Human-readable UTC rendering of a stored RFC 3339 timestamp.
fn format_utc(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&chrono::Utc)
            .format("%a, %d %b %Y %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil::temp_db;
    use crate::error::AppError;

    async fn seed(db: &Database, contract: Option<&str>) {
        sqlx::query(
            "INSERT INTO files (id, user_id, original_filename, mime_type, size_bytes, sha256_hash, storage_provider, storage_ref, created_at) \
             VALUES ('file-1', 'user-1', 'design (final).png', 'image/png', 12, \
                     '7509e5bda0c762d2bac7f90d758b5b2263fa01ccbc542ab5e3df163be08e6ca9', \
                     'ipfs', 'QmFileFake', '2026-08-24T10:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO ip_records (id, user_id, file_id, asset_name, asset_description, blockchain_tx_hash, nft_contract_address, nft_token_id, metadata_cid, status, created_at) \
             VALUES ('rec-1', 'user-1', 'file-1', 'design (final).png', 'Timestamped asset: design (final).png', \
                     '0xabc123', ?, '7', 'QmMetaFake', 'minted', '2026-08-24T10:05:00Z')",
        )
        .bind(contract)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn renders_a_complete_certificate() {
        let (_dir, db) = temp_db().await;
        seed(&db, Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")).await;

        let pdf = CertificateService::render(&db, "user-1", "rec-1").await.unwrap();
        let doc = String::from_utf8(pdf).unwrap();

        assert!(doc.starts_with("%PDF-1.4\n"));
        assert!(doc.contains("Veltis Protocol - Proof of Existence Certificate"));
        assert!(doc.contains(r"Asset Name: design \(final\).png"));
        assert!(doc.contains(
            "- SHA-256 Hash: 7509e5bda0c762d2bac7f90d758b5b2263fa01ccbc542ab5e3df163be08e6ca9"
        ));
        assert!(doc.contains("- IPFS CID \\(File\\): QmFileFake"));
        assert!(doc.contains(
            "- NFT Contract Address: 0x5FbDB2315678afecb367f032d93F642f64180aa3"
        ));
        assert!(doc.contains("- NFT Token ID: 7"));
        assert!(doc.contains("Timestamp \\(UTC\\): Mon, 24 Aug 2026 10:05:00 UTC"));
        assert!(doc.contains("Record ID: rec-1."));
    }

    #[tokio::test]
    async fn missing_contract_address_prints_placeholder() {
        let (_dir, db) = temp_db().await;
        seed(&db, None).await;

        let pdf = CertificateService::render(&db, "user-1", "rec-1").await.unwrap();
        let doc = String::from_utf8(pdf).unwrap();
        assert!(doc.contains("- NFT Contract Address: N/A"));
    }

    #[tokio::test]
    async fn refuses_records_of_other_users() {
        let (_dir, db) = temp_db().await;
        seed(&db, None).await;

        let err = CertificateService::render(&db, "user-2", "rec-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn format_utc_falls_back_to_the_raw_value() {
        assert_eq!(
            format_utc("2026-08-24T10:05:00Z"),
            "Mon, 24 Aug 2026 10:05:00 UTC"
        );
        assert_eq!(format_utc("not a timestamp"), "not a timestamp");
    }
}

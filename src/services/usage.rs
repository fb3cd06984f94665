use crate::config::LimitsConfig;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    record_limit_message, storage_limit_message, Profile, UsageLimits, UsageResponse,
};

/// Outcome of the pre-upload quota gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    Denied { reason: String },
}

/// Usage accounting service
pub struct UsageService;

impl UsageService {
    /// Create the usage profile row if this user has none yet.
    ///
    /// Called from the auth middleware so every authenticated request can
    /// assume the row exists.
    pub async fn ensure_profile(db: &Database, user_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR IGNORE INTO profiles (id, tier, ip_record_count, storage_used_bytes, created_at, updated_at) \
             VALUES (?, 'free', 0, 0, ?, ?)",
        )
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;
        Ok(())
    }

    /// Get a usage profile by user id
    pub async fn get_profile(db: &Database, user_id: &str) -> Result<Profile> {
        let profile: Profile = sqlx::query_as("SELECT * FROM profiles WHERE id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("Usage profile not found".to_string()))?;

        Ok(profile)
    }

    /// Snapshot a profile together with the configured ceilings
    pub fn snapshot(profile: &Profile, limits: &LimitsConfig) -> UsageResponse {
        UsageResponse {
            record_count: profile.ip_record_count,
            storage_used_bytes: profile.storage_used_bytes,
            tier: profile.tier.clone(),
            limits: UsageLimits {
                free_record_limit: limits.free_record_limit,
                free_storage_limit_bytes: limits.free_storage_limit_bytes,
            },
        }
    }

    /// Check the lifetime ceilings before accepting an upload.
    ///
    /// This is a point-in-time read, not a reservation: two concurrent
    /// uploads can both pass and the later confirmations may overshoot the
    /// ceiling. `reconcile` exposes the recount that audits such drift.
    pub async fn check_limits(
        db: &Database,
        limits: &LimitsConfig,
        user_id: &str,
        incoming_bytes: i64,
    ) -> Result<LimitDecision> {
        let profile = Self::get_profile(db, user_id).await?;

        if !profile.is_free_tier() {
            return Ok(LimitDecision::Allowed);
        }

        if profile.ip_record_count >= limits.free_record_limit {
            return Ok(LimitDecision::Denied {
                reason: record_limit_message(limits.free_record_limit),
            });
        }

        if profile.storage_used_bytes + incoming_bytes > limits.free_storage_limit_bytes {
            return Ok(LimitDecision::Denied {
                reason: storage_limit_message(limits.free_storage_limit_bytes),
            });
        }

        Ok(LimitDecision::Allowed)
    }

    /// Bump the lifetime counters after a confirmed mint.
    ///
    /// Returns the number of updated rows; 0 means the profile vanished,
    /// which callers treat as drift to log rather than a failure.
    pub async fn increment_usage(
        db: &Database,
        user_id: &str,
        size_bytes: i64,
    ) -> Result<u64> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE profiles SET ip_record_count = ip_record_count + 1, \
             storage_used_bytes = storage_used_bytes + ?, updated_at = ? WHERE id = ?",
        )
        .bind(size_bytes)
        .bind(&now)
        .bind(user_id)
        .execute(db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Recompute the counters from the records themselves and persist them.
    ///
    /// The audit operation for counter drift: the durable truth is the join
    /// of `ip_records` and `files`, the counters are a cache of it.
    pub async fn reconcile(db: &Database, user_id: &str) -> Result<Profile> {
        let (record_count, storage_used_bytes): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(ip.id), COALESCE(SUM(f.size_bytes), 0) \
             FROM ip_records ip JOIN files f ON ip.file_id = f.id \
             WHERE ip.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(db.pool())
        .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let updated = sqlx::query(
            "UPDATE profiles SET ip_record_count = ?, storage_used_bytes = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(record_count)
        .bind(storage_used_bytes)
        .bind(&now)
        .bind(user_id)
        .execute(db.pool())
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Usage profile not found".to_string()));
        }

        tracing::info!(
            "Reconciled usage for {}: {} records, {} bytes",
            user_id,
            record_count,
            storage_used_bytes
        );

        Self::get_profile(db, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil::temp_db;

    fn limits() -> LimitsConfig {
        LimitsConfig {
            free_record_limit: 5,
            free_storage_limit_bytes: 100 * 1024 * 1024,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }

    async fn seed_profile(db: &Database, user_id: &str, count: i64, used: i64, tier: &str) {
        UsageService::ensure_profile(db, user_id).await.unwrap();
        sqlx::query("UPDATE profiles SET ip_record_count = ?, storage_used_bytes = ?, tier = ? WHERE id = ?")
            .bind(count)
            .bind(used)
            .bind(tier)
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent() {
        let (_dir, db) = temp_db().await;
        UsageService::ensure_profile(&db, "user-1").await.unwrap();
        UsageService::ensure_profile(&db, "user-1").await.unwrap();

        let profile = UsageService::get_profile(&db, "user-1").await.unwrap();
        assert_eq!(profile.tier, "free");
        assert_eq!(profile.ip_record_count, 0);
        assert_eq!(profile.storage_used_bytes, 0);
    }

    #[tokio::test]
    async fn gate_allows_under_both_ceilings() {
        let (_dir, db) = temp_db().await;
        seed_profile(&db, "user-1", 4, 0, "free").await;

        let decision = UsageService::check_limits(&db, &limits(), "user-1", 1024)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Allowed);
    }

    #[tokio::test]
    async fn gate_refuses_at_record_ceiling() {
        let (_dir, db) = temp_db().await;
        seed_profile(&db, "user-1", 5, 0, "free").await;

        let decision = UsageService::check_limits(&db, &limits(), "user-1", 1)
            .await
            .unwrap();
        match decision {
            LimitDecision::Denied { reason } => assert!(reason.contains("record limit (5)")),
            LimitDecision::Allowed => panic!("expected denial"),
        }
    }

    #[tokio::test]
    async fn gate_counts_incoming_bytes_against_storage() {
        let (_dir, db) = temp_db().await;
        let ceiling = 100 * 1024 * 1024;
        seed_profile(&db, "user-1", 0, ceiling - 10, "free").await;

        assert_eq!(
            UsageService::check_limits(&db, &limits(), "user-1", 10)
                .await
                .unwrap(),
            LimitDecision::Allowed
        );
        match UsageService::check_limits(&db, &limits(), "user-1", 11)
            .await
            .unwrap()
        {
            LimitDecision::Denied { reason } => assert!(reason.contains("storage limit")),
            LimitDecision::Allowed => panic!("expected denial"),
        }
    }

    #[tokio::test]
    async fn paid_tier_bypasses_the_gate() {
        let (_dir, db) = temp_db().await;
        seed_profile(&db, "user-1", 1000, i64::MAX / 2, "pro").await;

        let decision = UsageService::check_limits(&db, &limits(), "user-1", 1 << 30)
            .await
            .unwrap();
        assert_eq!(decision, LimitDecision::Allowed);
    }

    #[tokio::test]
    async fn increment_reports_missing_profiles_instead_of_failing() {
        let (_dir, db) = temp_db().await;
        let updated = UsageService::increment_usage(&db, "ghost", 10).await.unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn increment_adds_one_record_and_the_byte_count() {
        let (_dir, db) = temp_db().await;
        seed_profile(&db, "user-1", 2, 500, "free").await;

        let updated = UsageService::increment_usage(&db, "user-1", 1500).await.unwrap();
        assert_eq!(updated, 1);

        let profile = UsageService::get_profile(&db, "user-1").await.unwrap();
        assert_eq!(profile.ip_record_count, 3);
        assert_eq!(profile.storage_used_bytes, 2000);
    }

    #[tokio::test]
    async fn reconcile_rewrites_counters_from_the_records() {
        let (_dir, db) = temp_db().await;
        // Drifted counters: claims 9 records and a wild byte count.
        seed_profile(&db, "user-1", 9, 999_999, "free").await;

        sqlx::query(
            "INSERT INTO files (id, user_id, original_filename, mime_type, size_bytes, sha256_hash, storage_provider, storage_ref, created_at) \
             VALUES ('f1', 'user-1', 'a.txt', 'text/plain', 1200, 'aa', 'ipfs', 'QmA', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO ip_records (id, user_id, file_id, asset_name, asset_description, blockchain_tx_hash, nft_contract_address, nft_token_id, metadata_cid, status, created_at) \
             VALUES ('r1', 'user-1', 'f1', 'a.txt', '', '0xabc', NULL, '0', 'QmM', 'minted', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let profile = UsageService::reconcile(&db, "user-1").await.unwrap();
        assert_eq!(profile.ip_record_count, 1);
        assert_eq!(profile.storage_used_bytes, 1200);
    }

    #[tokio::test]
    async fn reconcile_without_profile_is_not_found() {
        let (_dir, db) = temp_db().await;
        let err = UsageService::reconcile(&db, "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

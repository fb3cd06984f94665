use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Usage profile model, one row per user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: String,
    pub tier: String,
    pub ip_record_count: i64,
    pub storage_used_bytes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    pub fn is_free_tier(&self) -> bool {
        self.tier == "free"
    }
}

/// JWT claims issued by the external identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiration timestamp
    pub exp: usize,
}

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

/// Configured ceilings echoed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimits {
    pub free_record_limit: i64,
    pub free_storage_limit_bytes: i64,
}

/// Usage snapshot response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub record_count: i64,
    pub storage_used_bytes: i64,
    pub tier: String,
    pub limits: UsageLimits,
}

impl UsageResponse {
    /// Advisory pre-check mirrored by clients before they upload anything.
    ///
    /// The server re-checks authoritatively; this only exists so a client can
    /// refuse early with the same message the server would send.
    pub fn over_limit_reason(&self, incoming_bytes: i64) -> Option<String> {
        if self.tier != "free" {
            return None;
        }
        if self.record_count >= self.limits.free_record_limit {
            return Some(record_limit_message(self.limits.free_record_limit));
        }
        if self.storage_used_bytes + incoming_bytes > self.limits.free_storage_limit_bytes {
            return Some(storage_limit_message(self.limits.free_storage_limit_bytes));
        }
        None
    }
}

/// Message sent when the lifetime record ceiling is hit.
pub fn record_limit_message(limit: i64) -> String {
    format!("Free tier lifetime record limit ({limit}) reached. Please upgrade.")
}

/// Message sent when an upload would exceed the lifetime storage ceiling.
pub fn storage_limit_message(limit_bytes: i64) -> String {
    format!(
        "Free tier storage limit ({} MB) exceeded. Please upgrade.",
        limit_bytes / (1024 * 1024)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(record_count: i64, storage_used_bytes: i64, tier: &str) -> UsageResponse {
        UsageResponse {
            record_count,
            storage_used_bytes,
            tier: tier.to_string(),
            limits: UsageLimits {
                free_record_limit: 5,
                free_storage_limit_bytes: 100 * 1024 * 1024,
            },
        }
    }

    #[test]
    fn under_both_ceilings_is_allowed() {
        assert_eq!(snapshot(4, 0, "free").over_limit_reason(1024), None);
    }

    #[test]
    fn record_ceiling_refuses_regardless_of_size() {
        let reason = snapshot(5, 0, "free").over_limit_reason(1).unwrap();
        assert!(reason.contains("record limit (5)"));
    }

    #[test]
    fn storage_ceiling_counts_the_incoming_bytes() {
        let almost_full = snapshot(0, 100 * 1024 * 1024 - 10, "free");
        assert_eq!(almost_full.over_limit_reason(10), None);
        let reason = almost_full.over_limit_reason(11).unwrap();
        assert!(reason.contains("storage limit (100 MB)"));
    }

    #[test]
    fn paid_tier_bypasses_ceilings() {
        assert_eq!(snapshot(99, i64::MAX / 2, "pro").over_limit_reason(1 << 30), None);
    }
}

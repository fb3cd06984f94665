use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::pinning::Pinner;
use crate::util::hash::sha256_hex;

/// Development pinning provider that stores pinned content on local disk.
///
/// Content ids are the SHA-256 of the pinned bytes, so pinning the same
/// content twice yields the same id without talking to any network.
pub struct LocalPinner {
    base_path: PathBuf,
}

impl LocalPinner {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
        }
    }

    fn path_for(&self, cid: &str) -> PathBuf {
        self.base_path.join(cid)
    }

    async fn store(&self, data: &[u8], name: &str) -> Option<String> {
        let cid = sha256_hex(data);
        let full_path = self.path_for(&cid);

        if let Some(parent) = full_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                tracing::error!("Local pin directory unavailable: {}", e);
                return None;
            }
        }

        let written = async {
            let mut file = fs::File::create(&full_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            std::io::Result::Ok(())
        }
        .await;

        match written {
            Ok(()) => {
                tracing::debug!("Pinned '{}' locally as {}", name, cid);
                Some(cid)
            }
            Err(e) => {
                tracing::error!("Failed to pin '{}' locally: {}", name, e);
                None
            }
        }
    }
}

#[async_trait]
impl Pinner for LocalPinner {
    async fn pin_bytes(&self, data: Bytes, name: &str) -> Result<Option<String>> {
        Ok(self.store(&data, name).await)
    }

    async fn pin_json(&self, value: &serde_json::Value, name: &str) -> Result<Option<String>> {
        let serialized = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to serialize JSON pin '{}': {}", name, e);
                return Ok(None);
            }
        };
        Ok(self.store(&serialized, name).await)
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}

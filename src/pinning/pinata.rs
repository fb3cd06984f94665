use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::pinning::Pinner;

const PINATA_API_BASE: &str = "https://api.pinata.cloud";

/// Pinning provider backed by the Pinata REST API
pub struct PinataPinner {
    client: reqwest::Client,
    api_key: String,
    secret_api_key: String,
    base_url: String,
}

/// Successful pin response, shared by both pin endpoints
#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataPinner {
    /// Create a client; fails when either credential is missing.
    pub fn new(api_key: &str, secret_api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() || secret_api_key.trim().is_empty() {
            return Err(AppError::Internal(
                "Pinata API key or secret key is missing; configure [pinning] api_key and secret_api_key"
                    .to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            secret_api_key: secret_api_key.to_string(),
            base_url: PINATA_API_BASE.to_string(),
        })
    }

    /// Check the credentials against the live API. Logged, never fatal.
    pub async fn test_authentication(&self) -> bool {
        let url = format!("{}/data/testAuthentication", self.base_url);
        match self.authorized(self.client.get(url)).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Pinata client authenticated successfully");
                true
            }
            Ok(resp) => {
                tracing::warn!("Pinata authentication failed with status {}", resp.status());
                false
            }
            Err(e) => {
                tracing::warn!("Pinata authentication request failed: {}", e);
                false
            }
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
    }

    fn pin_file_url(&self) -> String {
        format!("{}/pinning/pinFileToIPFS", self.base_url)
    }

    fn pin_json_url(&self) -> String {
        format!("{}/pinning/pinJSONToIPFS", self.base_url)
    }

    /// `pinataMetadata` field attached to every pin.
    fn metadata_body(name: &str) -> serde_json::Value {
        serde_json::json!({ "name": name })
    }

    /// `pinataOptions` field: CID v0 for wider compatibility.
    fn options_body() -> serde_json::Value {
        serde_json::json!({ "cidVersion": 0 })
    }

    async fn extract_cid(resp: reqwest::Response, context: &str) -> Option<String> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("Pinata {} failed with {}: {}", context, status, body);
            return None;
        }

        match resp.json::<PinResponse>().await {
            Ok(body) => Some(body.ipfs_hash),
            Err(e) => {
                tracing::error!("Pinata {} returned an unreadable body: {}", context, e);
                None
            }
        }
    }
}

#[async_trait]
impl Pinner for PinataPinner {
    async fn pin_bytes(&self, data: Bytes, name: &str) -> Result<Option<String>> {
        tracing::debug!("Pinning file '{}' ({} bytes) via Pinata", name, data.len());

        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("pinataMetadata", Self::metadata_body(name).to_string())
            .text("pinataOptions", Self::options_body().to_string());

        let sent = self
            .authorized(self.client.post(self.pin_file_url()))
            .multipart(form)
            .send()
            .await;

        match sent {
            Ok(resp) => Ok(Self::extract_cid(resp, "pinFileToIPFS").await),
            Err(e) => {
                tracing::error!("Pinata pinFileToIPFS request failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn pin_json(&self, value: &serde_json::Value, name: &str) -> Result<Option<String>> {
        tracing::debug!("Pinning JSON '{}' via Pinata", name);

        let body = serde_json::json!({
            "pinataContent": value,
            "pinataMetadata": Self::metadata_body(name),
            "pinataOptions": Self::options_body(),
        });

        let sent = self
            .authorized(self.client.post(self.pin_json_url()))
            .json(&body)
            .send()
            .await;

        match sent {
            Ok(resp) => Ok(Self::extract_cid(resp, "pinJSONToIPFS").await),
            Err(e) => {
                tracing::error!("Pinata pinJSONToIPFS request failed: {}", e);
                Ok(None)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "ipfs"
    }
}

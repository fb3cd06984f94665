use async_trait::async_trait;
use bytes::Bytes;

use super::WorkflowError;
use crate::error::ErrorBody;
use crate::models::{
    MintConfirmationRequest, MintConfirmationResponse, PrepareMintResponse, UsageResponse,
};

/// File content handed to the workflow by its caller
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub bytes: Bytes,
    pub filename: String,
    pub mime_type: String,
}

/// Registry server surface the workflow depends on
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn usage(&self) -> Result<UsageResponse, WorkflowError>;
    async fn prepare_mint(&self, source: &UploadSource)
        -> Result<PrepareMintResponse, WorkflowError>;
    async fn confirm_mint(
        &self,
        req: &MintConfirmationRequest,
    ) -> Result<MintConfirmationResponse, WorkflowError>;
}

/// HTTP client for the registry server
pub struct HttpRegistryApi {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpRegistryApi {
    pub fn new(base_url: &str, bearer_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extract the `{message}` body of an error response, falling back to
    /// the bare status code when the body is not ours.
    async fn api_error(response: reqwest::Response) -> WorkflowError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => WorkflowError::Api(body.message),
            Err(_) => WorkflowError::Api(format!("unexpected status {status}")),
        }
    }
}

#[async_trait]
impl RegistryApi for HttpRegistryApi {
    async fn usage(&self) -> Result<UsageResponse, WorkflowError> {
        let response = self
            .client
            .get(self.url("/api/usage"))
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))
    }

    async fn prepare_mint(
        &self,
        source: &UploadSource,
    ) -> Result<PrepareMintResponse, WorkflowError> {
        let part = reqwest::multipart::Part::bytes(source.bytes.to_vec())
            .file_name(source.filename.clone())
            .mime_str(&source.mime_type)
            .map_err(|e| WorkflowError::Api(format!("invalid MIME type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/files/upload"))
            .bearer_auth(&self.bearer_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))
    }

    async fn confirm_mint(
        &self,
        req: &MintConfirmationRequest,
    ) -> Result<MintConfirmationResponse, WorkflowError> {
        let response = self
            .client
            .post(self.url("/api/files/confirm-mint"))
            .bearer_auth(&self.bearer_token)
            .json(req)
            .send()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| WorkflowError::Api(e.to_string()))
    }
}

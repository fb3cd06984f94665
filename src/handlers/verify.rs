use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{VerifyHashRequest, VerifyResponse};
use crate::services::verify::{VerificationOutcome, VerifyService};
use crate::AppState;

const NOTHING_TO_VERIFY: &str = "No file uploaded or hash provided for verification.";

/// Verify a file or hash against stored records. Public, no auth.
/// POST /api/verify with multipart `file` or JSON `{hash}`
pub async fn verify_asset(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<VerifyResponse>> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let outcome = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {}", e)))?;

        let mut data = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {}", e)))?
        {
            if field.name().unwrap_or("") == "file" {
                data = Some(field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file: {}", e))
                })?);
            }
        }

        let data = data.ok_or_else(|| AppError::BadRequest(NOTHING_TO_VERIFY.to_string()))?;
        VerifyService::verify_bytes(&state.db, &data).await?
    } else if content_type.starts_with("application/json") {
        let Json(body): Json<VerifyHashRequest> = Json::from_request(request, &state)
            .await
            .map_err(|_| AppError::BadRequest(NOTHING_TO_VERIFY.to_string()))?;
        if body.hash.trim().is_empty() {
            return Err(AppError::BadRequest(NOTHING_TO_VERIFY.to_string()));
        }
        VerifyService::verify_hash(&state.db, &body.hash).await?
    } else {
        return Err(AppError::BadRequest(NOTHING_TO_VERIFY.to_string()));
    };

    match outcome {
        VerificationOutcome::Matches(results) => Ok(Json(VerifyResponse {
            message: format!("Found {} record(s) matching the hash.", results.len()),
            results,
        })),
        VerificationOutcome::FileWithoutRecord => Err(AppError::NotFound(
            "File hash found, but no associated timestamp record exists yet.".to_string(),
        )),
        VerificationOutcome::HashUnknown => Err(AppError::NotFound(
            "Hash not found in Veltis Protocol records.".to_string(),
        )),
    }
}

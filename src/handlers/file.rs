use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use crate::error::{AppError, Result};
use crate::models::{CurrentUser, MintConfirmationRequest, MintConfirmationResponse, PrepareMintResponse};
use crate::services::mint::{MintService, UploadedAsset};
use crate::AppState;

/// Upload a file and prepare its mint metadata
/// POST /api/files/upload
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<PrepareMintResponse>> {
    let mut upload: Option<UploadedAsset> = None;

    // Process multipart fields
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {}", e)))?
    {
        if field.name().unwrap_or("") != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

        upload = Some(UploadedAsset {
            bytes,
            filename,
            mime_type,
        });
    }

    let asset = upload.ok_or_else(|| AppError::BadRequest("No file uploaded.".to_string()))?;
    if asset.bytes.len() > state.config.limits.max_upload_bytes {
        return Err(AppError::BadRequest(
            "File exceeds the upload size limit.".to_string(),
        ));
    }

    let response = MintService::prepare(
        &state.db,
        state.pinner.as_ref(),
        &state.config.limits,
        &current_user.id,
        &asset,
    )
    .await?;
    Ok(Json(response))
}

/// Persist a client-confirmed mint
/// POST /api/files/confirm-mint
pub async fn confirm_mint(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<MintConfirmationRequest>,
) -> Result<Json<MintConfirmationResponse>> {
    let contract = state.config.chain.contract_address.trim();
    let contract = (!contract.is_empty()).then_some(contract);

    let response = MintService::confirm(
        &state.db,
        state.verifier.as_deref(),
        contract,
        state.pinner.provider_name(),
        &current_user.id,
        &req,
    )
    .await?;
    Ok(Json(response))
}

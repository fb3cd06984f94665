use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Extension, Json,
};

use crate::error::{AppError, Result};
use crate::models::{CurrentUser, RecordSummary};
use crate::services::{CertificateService, RecordService};
use crate::AppState;

/// List the caller's timestamp records
/// GET /api/records
pub async fn list_records(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<Vec<RecordSummary>>> {
    let records = RecordService::list_for_user(&state.db, &current_user.id).await?;
    Ok(Json(records))
}

/// Download the PDF certificate for a record
/// GET /api/records/:id/certificate
pub async fn get_certificate(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let pdf = CertificateService::render(&state.db, &current_user.id, &id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, pdf.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"certificate-{}.pdf\"", id),
        )
        .body(Body::from(pdf))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::{CurrentUser, UsageResponse};
use crate::services::UsageService;
use crate::AppState;

/// Current usage snapshot with the configured ceilings
/// GET /api/usage
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<UsageResponse>> {
    let profile = UsageService::get_profile(&state.db, &current_user.id).await?;
    Ok(Json(UsageService::snapshot(&profile, &state.config.limits)))
}

/// Recompute usage counters from the persisted records
/// POST /api/usage/reconcile
pub async fn reconcile_usage(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<UsageResponse>> {
    let profile = UsageService::reconcile(&state.db, &current_user.id).await?;
    Ok(Json(UsageService::snapshot(&profile, &state.config.limits)))
}

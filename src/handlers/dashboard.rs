use axum::{extract::State, Json};

use crate::{
    error::Result,
    middleware_layer::auth::CurrentUser,
    services::dashboard::{self as dashboard_service, DashboardSummary},
    state::AppState,
};

/// The dashboard: greeting, counters and recent tasks.
///
/// Mounted under a protected prefix, so the route guard has already
/// redirected anonymous visitors.
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<DashboardSummary>> {
    let summary = dashboard_service::summary(&state, session.user_id).await?;
    Ok(Json(summary))
}

// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::{db_utils::get_tenant_connection, error::ApiError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::dashboard::DashboardStats,
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores da clínica", body = DashboardStats),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Clínica desativada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<DashboardStats>, ApiError> {
    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .dashboard_service
        .get_stats(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Cards do topo do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: i64,
    pub total_professionals: i64,
    pub appointments_today: i64,
    pub appointments_this_month: i64,
    pub completed_this_month: i64,
    pub cancelled_this_month: i64,
    pub active_procedures: i64,
    pub recent_activities: Vec<Activity>,
}

// Feed de atividades (login, agendamentos, cadastros)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[schema(example = "APPOINTMENT_CREATED")]
    pub kind: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

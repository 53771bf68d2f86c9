// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// Tenant (A "Clínica")
// ---
// O ID é o mesmo do Manager. Os dados clínicos vivem no schema `schema_name`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Clínica Escola Centro")]
    pub name: String,
    #[schema(example = "clinica-centro")]
    pub slug: String,
    #[serde(skip_serializing)]
    pub schema_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

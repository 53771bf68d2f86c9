// src/models/clinic.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Procedimentos (catálogo da clínica) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: Uuid,
    #[schema(example = "Avaliação inicial")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 30)]
    pub duration_minutes: i32,
    #[schema(example = "120.00")]
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Profissionais (quem atende) ---
// `user_id` liga o profissional à conta de acesso em `public.users`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    #[schema(example = "Fisioterapia")]
    pub specialty: Option<String>,
    #[schema(example = "CREFITO-3 12345")]
    pub registry_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Pacientes ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    #[schema(example = "João da Silva")]
    pub name: String,
    #[schema(example = "123.456.789-00")]
    pub document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// src/models/scheduling.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---
// Guardado como TEXT no schema do tenant: tipos ENUM por schema quebrariam
// o cache de OIDs do sqlx quando a conexão troca de search_path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    /// Concluído e cancelado encerram o atendimento.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        !self.is_terminal() && *self != next
    }

    /// Cancelado e falta liberam o horário do profissional.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Volta a ocupar um horário que estava livre (ex.: NO_SHOW -> SCHEDULED).
    pub fn reclaims_slot(&self, next: AppointmentStatus) -> bool {
        !self.holds_slot() && next.holds_slot()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub procedure_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da agenda do dia, já com os nomes resolvidos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetail {
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub patient_id: Uuid,
    #[schema(example = "João da Silva")]
    pub patient_name: String,
    pub professional_id: Uuid,
    #[schema(example = "Dra. Ana Souza")]
    pub professional_name: String,
    pub procedure_id: Option<Uuid>,
    #[schema(example = "Limpeza")]
    pub procedure_name: Option<String>,
}

// src/db/appointment_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scheduling::{Appointment, AppointmentDetail, AppointmentStatus},
};

#[derive(Clone, Default)]
pub struct AppointmentRepository;

impl AppointmentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Agenda de uma janela de tempo, com nomes já resolvidos.
    /// `professional_id` restringe à agenda de um único profissional.
    pub async fn list_between<'e, E>(
        &self,
        executor: E,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<AppointmentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, AppointmentDetail>(
            r#"
            SELECT
                a.id, a.starts_at, a.ends_at, a.status, a.notes,
                a.patient_id, p.name AS patient_name,
                a.professional_id, pr.name AS professional_name,
                a.procedure_id, proc.name AS procedure_name
            FROM appointments a
            JOIN patients p ON p.id = a.patient_id
            JOIN professionals pr ON pr.id = a.professional_id
            LEFT JOIN procedures proc ON proc.id = a.procedure_id
            WHERE a.starts_at >= $1
              AND a.starts_at < $2
              AND ($3::uuid IS NULL OR a.professional_id = $3)
            ORDER BY a.starts_at ASC, pr.name ASC
            "#,
        )
            .bind(from)
            .bind(to)
            .bind(professional_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1",
        )
            .bind(appointment_id)
            .fetch_optional(executor)
            .await?;

        Ok(appointment)
    }

    /// Existe outro atendimento que ocupa o horário do profissional em [starts_at, ends_at)?
    /// `exclude_id` ignora o próprio atendimento numa troca de status.
    pub async fn has_overlap<'e, E>(
        &self,
        executor: E,
        professional_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let overlaps: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE professional_id = $1
                  AND status NOT IN ('CANCELLED', 'NO_SHOW')
                  AND starts_at < $3
                  AND ends_at > $2
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
            .bind(professional_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(exclude_id)
            .fetch_one(executor)
            .await?;

        Ok(overlaps)
    }

    pub async fn patient_exists<'e, E>(&self, executor: E, patient_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1 AND is_active = true)",
        )
            .bind(patient_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        patient_id: Uuid,
        professional_id: Uuid,
        procedure_id: Option<Uuid>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                patient_id, professional_id, procedure_id, starts_at, ends_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(patient_id)
            .bind(professional_id)
            .bind(procedure_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(appointment)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(appointment_id)
            .bind(status)
            .fetch_one(executor)
            .await?;

        Ok(appointment)
    }
}

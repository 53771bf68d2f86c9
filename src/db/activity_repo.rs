// src/db/activity_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::Activity};

// Tipos de atividade gravados no feed
pub const ACTIVITY_LOGIN: &str = "LOGIN";
pub const ACTIVITY_LOGOUT: &str = "LOGOUT";
pub const ACTIVITY_APPOINTMENT_CREATED: &str = "APPOINTMENT_CREATED";
pub const ACTIVITY_APPOINTMENT_STATUS: &str = "APPOINTMENT_STATUS_CHANGED";
pub const ACTIVITY_PATIENT_CREATED: &str = "PATIENT_CREATED";
pub const ACTIVITY_PROCEDURE_CREATED: &str = "PROCEDURE_CREATED";
pub const ACTIVITY_PROCEDURE_UPDATED: &str = "PROCEDURE_UPDATED";
pub const ACTIVITY_PROCEDURE_REMOVED: &str = "PROCEDURE_REMOVED";
pub const ACTIVITY_USER_CREATED: &str = "USER_CREATED";
pub const ACTIVITY_USER_STATUS: &str = "USER_STATUS_CHANGED";

#[derive(Clone, Default)]
pub struct ActivityRepository;

impl ActivityRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        kind: &str,
        description: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO activities (user_id, kind, description) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(kind)
            .bind(description)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn recent<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<Activity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities ORDER BY created_at DESC LIMIT $1",
        )
            .bind(limit)
            .fetch_all(executor)
            .await?;

        Ok(activities)
    }
}

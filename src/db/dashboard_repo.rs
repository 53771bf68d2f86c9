// src/db/dashboard_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::ActivityRepository,
    models::dashboard::DashboardStats,
};

const RECENT_ACTIVITY_LIMIT: i64 = 5;

#[derive(Clone, Default)]
pub struct DashboardRepository {
    activity_repo: ActivityRepository,
}

impl DashboardRepository {
    pub fn new(activity_repo: ActivityRepository) -> Self {
        Self { activity_repo }
    }

    pub async fn get_stats<'e, A>(
        &self,
        conn: A,
        today: (DateTime<Utc>, DateTime<Utc>),
        month: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<DashboardStats, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente dos contadores
        let mut tx = conn.begin().await?;

        // A. Cadastros
        let (total_patients, total_professionals, active_procedures): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM patients WHERE is_active = true),
                    (SELECT COUNT(*) FROM professionals WHERE is_active = true),
                    (SELECT COUNT(*) FROM procedures WHERE is_active = true)
                "#,
            )
                .fetch_one(&mut *tx)
                .await?;

        // B. Agenda de hoje (cancelados não contam)
        let appointments_today: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE starts_at >= $1 AND starts_at < $2
              AND status <> 'CANCELLED'
            "#,
        )
            .bind(today.0)
            .bind(today.1)
            .fetch_one(&mut *tx)
            .await?;

        // C. Mês corrente
        let (appointments_this_month, completed_this_month, cancelled_this_month): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE status <> 'CANCELLED'),
                    COUNT(*) FILTER (WHERE status = 'COMPLETED'),
                    COUNT(*) FILTER (WHERE status = 'CANCELLED')
                FROM appointments
                WHERE starts_at >= $1 AND starts_at < $2
                "#,
            )
                .bind(month.0)
                .bind(month.1)
                .fetch_one(&mut *tx)
                .await?;

        // D. Últimas atividades
        let recent_activities = self
            .activity_repo
            .recent(&mut *tx, RECENT_ACTIVITY_LIMIT)
            .await?;

        tx.commit().await?;

        Ok(DashboardStats {
            total_patients,
            total_professionals,
            appointments_today,
            appointments_this_month,
            completed_this_month,
            cancelled_this_month,
            active_procedures,
            recent_activities,
        })
    }
}

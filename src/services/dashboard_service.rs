// src/services/dashboard_service.rs

use chrono::FixedOffset;
use sqlx::{Acquire, Postgres};

use crate::{
    common::{dates, error::AppError},
    db::DashboardRepository,
    models::dashboard::DashboardStats,
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    clinic_offset: FixedOffset,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, clinic_offset: FixedOffset) -> Self {
        Self { repo, clinic_offset }
    }

    pub async fn get_stats<'e, A>(&self, conn: A) -> Result<DashboardStats, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let today = dates::local_today(self.clinic_offset);
        let day = dates::day_bounds(today, self.clinic_offset)?;
        let month = dates::month_bounds(today, self.clinic_offset)?;

        self.repo.get_stats(conn, day, month).await
    }
}

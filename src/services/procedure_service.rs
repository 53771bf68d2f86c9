// src/services/procedure_service.rs

use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{activity_repo, ActivityRepository, ProcedureRepository},
    models::{auth::User, clinic::Procedure},
};

#[derive(Debug, Clone)]
pub struct ProcedureInput<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct ProcedureService {
    repo: ProcedureRepository,
    activity_repo: ActivityRepository,
}

impl ProcedureService {
    pub fn new(repo: ProcedureRepository, activity_repo: ActivityRepository) -> Self {
        Self { repo, activity_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        search: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<Procedure>, AppError> {
        self.repo.list(conn, search, include_inactive).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        input: ProcedureInput<'_>,
    ) -> Result<Procedure, AppError> {
        let mut tx = conn.begin().await?;

        let procedure = self.repo
            .create(&mut *tx, input.name.trim(), input.description, input.duration_minutes, input.price)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_PROCEDURE_CREATED,
                &format!("{} cadastrou o procedimento {}", actor.name, procedure.name),
            )
            .await?;

        tx.commit().await?;
        Ok(procedure)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        procedure_id: Uuid,
        input: ProcedureInput<'_>,
    ) -> Result<Procedure, AppError> {
        let mut tx = conn.begin().await?;

        let procedure = self.repo
            .update(
                &mut *tx,
                procedure_id,
                input.name.trim(),
                input.description,
                input.duration_minutes,
                input.price,
                input.is_active,
            )
            .await?
            .ok_or(AppError::ProcedureNotFound)?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_PROCEDURE_UPDATED,
                &format!("{} alterou o procedimento {}", actor.name, procedure.name),
            )
            .await?;

        tx.commit().await?;
        Ok(procedure)
    }

    pub async fn remove(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        procedure_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;

        let procedure = self.repo
            .find_by_id(&mut *tx, procedure_id)
            .await?
            .ok_or(AppError::ProcedureNotFound)?;

        self.repo.deactivate(&mut *tx, procedure_id).await?;

        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_PROCEDURE_REMOVED,
                &format!("{} removeu o procedimento {}", actor.name, procedure.name),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

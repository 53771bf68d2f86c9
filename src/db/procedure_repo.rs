// src/db/procedure_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::like_pattern, error::AppError},
    models::clinic::Procedure,
};

// Repositório de schema de tenant: sem pool própria, sempre recebe a conexão
// já apontada para o schema da clínica (`get_tenant_connection`).
#[derive(Clone, Default)]
pub struct ProcedureRepository;

impl ProcedureRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<Procedure>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = like_pattern(search);

        let procedures = sqlx::query_as::<_, Procedure>(
            r#"
            SELECT * FROM procedures
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2 OR is_active = true)
            ORDER BY name ASC
            "#,
        )
            .bind(pattern)
            .bind(include_inactive)
            .fetch_all(executor)
            .await?;

        Ok(procedures)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        procedure_id: Uuid,
    ) -> Result<Option<Procedure>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let procedure = sqlx::query_as::<_, Procedure>("SELECT * FROM procedures WHERE id = $1")
            .bind(procedure_id)
            .fetch_optional(executor)
            .await?;

        Ok(procedure)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        duration_minutes: i32,
        price: Decimal,
    ) -> Result<Procedure, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let procedure = sqlx::query_as::<_, Procedure>(
            r#"
            INSERT INTO procedures (name, description, duration_minutes, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(description)
            .bind(duration_minutes)
            .bind(price)
            .fetch_one(executor)
            .await?;

        Ok(procedure)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        procedure_id: Uuid,
        name: &str,
        description: Option<&str>,
        duration_minutes: i32,
        price: Decimal,
        is_active: bool,
    ) -> Result<Option<Procedure>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let procedure = sqlx::query_as::<_, Procedure>(
            r#"
            UPDATE procedures
            SET name = $2, description = $3, duration_minutes = $4,
                price = $5, is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(procedure_id)
            .bind(name)
            .bind(description)
            .bind(duration_minutes)
            .bind(price)
            .bind(is_active)
            .fetch_optional(executor)
            .await?;

        Ok(procedure)
    }

    // Exclusão lógica: agendamentos antigos continuam apontando para o procedimento
    pub async fn deactivate<'e, E>(
        &self,
        executor: E,
        procedure_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE procedures SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
            .bind(procedure_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

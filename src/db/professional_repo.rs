// src/db/professional_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::clinic::Professional};

#[derive(Clone, Default)]
pub struct ProfessionalRepository;

impl ProfessionalRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        name: &str,
        specialty: Option<&str>,
        registry_number: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Professional, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let professional = sqlx::query_as::<_, Professional>(
            r#"
            INSERT INTO professionals (user_id, name, specialty, registry_number, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(user_id)
            .bind(name)
            .bind(specialty)
            .bind(registry_number)
            .bind(email)
            .bind(phone)
            .fetch_one(executor)
            .await?;

        Ok(professional)
    }

    pub async fn find_by_user_id<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Professional>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let professional = sqlx::query_as::<_, Professional>(
            "SELECT * FROM professionals WHERE user_id = $1",
        )
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(professional)
    }

    pub async fn is_active<'e, E>(&self, executor: E, professional_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM professionals WHERE id = $1 AND is_active = true)",
        )
            .bind(professional_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    // Acompanha a conta de acesso: desativar o usuário tira o profissional da agenda
    pub async fn set_active_by_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE professionals SET is_active = $2, updated_at = NOW() WHERE user_id = $1",
        )
            .bind(user_id)
            .bind(is_active)
            .execute(executor)
            .await?;

        Ok(())
    }
}

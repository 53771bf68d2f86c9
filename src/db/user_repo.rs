// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::auth::{User, UserRole};

// O repositório de usuários, responsável por todas as interações com a tabela 'public.users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo ID do Manager (o `sub` do token)
    pub async fn find_by_manager_id(&self, manager_user_id: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM public.users WHERE manager_user_id = $1",
        )
            .bind(manager_user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(maybe_user)
    }

    pub async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM public.users
            WHERE tenant_id = $1
            ORDER BY is_active DESC, name ASC
            "#,
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Cria ou atualiza o espelho local do usuário do Manager e marca o login.
    pub async fn upsert_on_login<'e, E>(
        &self,
        executor: E,
        manager_user_id: &str,
        tenant_id: Uuid,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // `is_active` não é tocado: desativar é decisão local da clínica
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO public.users (manager_user_id, tenant_id, name, email, role, last_login_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (manager_user_id) DO UPDATE SET
                tenant_id = EXCLUDED.tenant_id,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                last_login_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(manager_user_id)
            .bind(tenant_id)
            .bind(name)
            .bind(email)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)?;

        Ok(user)
    }

    // Cria um novo usuário já registrado no Manager
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        manager_user_id: &str,
        tenant_id: Uuid,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO public.users (manager_user_id, tenant_id, name, email, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(manager_user_id)
            .bind(tenant_id)
            .bind(name)
            .bind(email)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)?;

        Ok(user)
    }

    /// Ativa/desativa dentro da clínica. `None` se o usuário não pertence ao tenant.
    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE public.users
            SET is_active = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(user_id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?;

        Ok(user)
    }
}

// Converte erro de violação de chave única em um erro mais amigável
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::EmailAlreadyExists;
        }
    }
    e.into()
}

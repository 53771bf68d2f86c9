// src/db/tenancy_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::quote_ident, error::AppError};
use crate::models::tenancy::Tenant;

// DDL das tabelas clínicas, aplicado dentro do schema de cada tenant
const TENANT_SCHEMA_SQL: &str = include_str!("../../sql/tenant_schema.sql");

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        self.find_by_id_with(&self.pool, tenant_id).await
    }

    pub async fn find_by_id_with<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM public.tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(tenant)
    }

    /// Registra uma clínica vista pela primeira vez no login.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        slug: &str,
        schema_name: &str,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO public.tenants (id, name, slug, schema_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(name)
            .bind(slug)
            .bind(schema_name)
            .fetch_one(executor)
            .await?;

        Ok(tenant)
    }

    /// O Manager é a fonte da verdade do nome da clínica.
    pub async fn update_name<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE public.tenants
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(name)
            .fetch_one(executor)
            .await?;

        Ok(tenant)
    }

    /// Cria o schema do tenant e as suas tabelas. Idempotente.
    /// Deve rodar dentro de uma transação: o `SET LOCAL` morre no commit.
    pub async fn provision_schema(
        &self,
        conn: &mut PgConnection,
        schema_name: &str,
    ) -> Result<(), AppError> {
        // Identificadores não aceitam bind; o nome já foi validado por `schema_name_for_tenant`
        let schema = quote_ident(schema_name);

        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(&mut *conn)
            .await?;

        sqlx::query(&format!("SET LOCAL search_path TO {}, public", schema))
            .execute(&mut *conn)
            .await?;

        // Várias instruções num só texto: vai pelo protocolo simples
        (&mut *conn).execute(TENANT_SCHEMA_SQL).await?;

        tracing::info!("🏥 Schema '{}' provisionado.", schema_name);
        Ok(())
    }
}

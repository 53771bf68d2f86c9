use sqlx::{pool::PoolConnection, PgConnection, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::tenancy::TenantContext;

// Limite do Postgres para identificadores (NAMEDATALEN - 1)
const MAX_IDENTIFIER_LEN: usize = 63;
const SCHEMA_PREFIX: &str = "tenant_";

// ---
// Helper de Tenant: a "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e aponta o `search_path` para o schema do tenant.
/// O hook `after_release` da pool (ver `config::pool_options`) desfaz a troca.
pub(crate) async fn get_tenant_connection(
    app_state: &AppState,
    tenant: &TenantContext,
) -> Result<PoolConnection<Postgres>, AppError> {
    let schema = &tenant.0.schema_name;
    if !is_valid_schema_name(schema) {
        return Err(AppError::InvalidSchemaName(schema.clone()));
    }

    let mut conn = app_state.db_pool.acquire().await?;

    sqlx::query("SELECT set_config('search_path', $1, false)")
        .bind(search_path_for(schema))
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Versão transacional: o `search_path` vale só até o fim da transação corrente.
/// Usado quando uma mesma transação mexe no schema public e no do tenant.
pub(crate) async fn set_local_search_path(
    conn: &mut PgConnection,
    schema: &str,
) -> Result<(), AppError> {
    if !is_valid_schema_name(schema) {
        return Err(AppError::InvalidSchemaName(schema.to_string()));
    }

    sqlx::query("SELECT set_config('search_path', $1, true)")
        .bind(search_path_for(schema))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Valor de `search_path` para um tenant: o schema dele primeiro, `public` como fallback.
pub(crate) fn search_path_for(schema: &str) -> String {
    format!("{}, public", quote_ident(schema))
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Padrão de busca "contém" para ILIKE. A barra vai primeiro: é o caractere de escape.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
}

/// Só aceitamos `[a-z0-9_]`, começando por letra, dentro do limite do Postgres.
pub fn is_valid_schema_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_letter = matches!(chars.next(), Some(c) if c.is_ascii_lowercase());

    starts_with_letter
        && name.len() <= MAX_IDENTIFIER_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with("pg_")
}

/// "Clínica-Centro 2" + id -> "tenant_cl_nica_centro_2_<id em hex>"
/// O id da clínica no sufixo torna o nome único mesmo quando dois slugs normalizam igual.
pub fn schema_name_for_tenant(slug: &str, tenant_id: Uuid) -> Result<String, AppError> {
    let mut normalized = String::with_capacity(slug.len());
    let mut last_was_sep = true;

    for c in slug.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            normalized.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            normalized.push('_');
            last_was_sep = true;
        }
    }

    let suffix = tenant_id.simple().to_string();
    // Espaço para o slug: limite - prefixo - '_' - sufixo
    let room = MAX_IDENTIFIER_LEN - SCHEMA_PREFIX.len() - 1 - suffix.len();
    normalized.truncate(room);
    let normalized = normalized.trim_end_matches('_');

    let schema = if normalized.is_empty() {
        format!("{}{}", SCHEMA_PREFIX, suffix)
    } else {
        format!("{}{}_{}", SCHEMA_PREFIX, normalized, suffix)
    };

    if !is_valid_schema_name(&schema) {
        return Err(AppError::InvalidSchemaName(slug.to_string()));
    }
    Ok(schema)
}

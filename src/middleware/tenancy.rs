// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::auth::missing_session,
    models::tenancy::Tenant,
};

// A clínica da sessão. Não vem de cabeçalho: é sempre a do usuário autenticado,
// resolvida pelo `tenant_guard`, então ninguém consegue "pular" para outro tenant.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Tenant);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| missing_session(parts, state))
    }
}

// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{missing_session, AuthenticatedUser},
        i18n::Locale,
    },
    models::auth::UserRole,
};

/// 1. O Trait que define quem pode passar
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| missing_session(parts, state))?;

        if !T::allowed().contains(&user.0.role) {
            tracing::warn!(
                "🚫 Usuário {} ({}) sem papel para esta ação",
                user.0.id,
                user.0.role.as_str()
            );

            let app_state = AppState::from_ref(state);
            let locale = Locale::from_header(
                parts
                    .headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct RoleAdmin;
impl RoleDef for RoleAdmin {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
}

// Quem opera a agenda da clínica
pub struct RoleStaff;
impl RoleDef for RoleStaff {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Receptionist] }
}

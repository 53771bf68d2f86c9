// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::User,
    services::auth::Session,
};

// Nome do cookie onde o login grava o token do Manager
pub const AUTH_COOKIE: &str = "auth_token";

/// Cookie primeiro (navegador), depois `Authorization: Bearer` (clientes de API).
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<(String, Session), AppError> {
    let token = extract_token(headers).ok_or(AppError::InvalidToken)?;
    let session = app_state.auth_service.resolve_session(&token).await?;
    Ok((token, session))
}

// Coloca usuário, token e clínica nos "extensions" da requisição
fn attach_session(request: &mut Request, token: String, session: Session) {
    let extensions = request.extensions_mut();
    extensions.insert(AuthenticatedUser(session.user));
    extensions.insert(BearerToken(token));
    extensions.insert(TenantContext(session.tenant));
}

// O middleware de autenticação: token válido + usuário local ativo
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (token, session) = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    attach_session(&mut request, token, session);
    Ok(next.run(request).await)
}

// Autenticação + clínica ativa. Usado em todas as rotas com dados do tenant.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (token, session) = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !session.tenant.is_active {
        tracing::warn!(
            "🚫 Acesso negado: clínica {} desativada (usuário {})",
            session.tenant.id, session.user.id
        );
        return Err(AppError::TenantInactive.to_api_error(&locale, &app_state.i18n_store));
    }

    attach_session(&mut request, token, session);
    Ok(next.run(request).await)
}

// Rejeição comum dos extratores abaixo: rota montada sem o guard
pub(crate) fn missing_session<S>(parts: &Parts, state: &S) -> ApiError
where
    AppState: FromRef<S>,
{
    let app_state = AppState::from_ref(state);
    let locale = Locale::from_header(
        parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    );
    AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| missing_session(parts, state))
    }
}

// O token cru, para repassar ao Manager em nome do usuário
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or_else(|| missing_session(parts, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_cookie_falls_back_to_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token="));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn ignores_other_schemes_and_blank_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_token(&headers), None);

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}

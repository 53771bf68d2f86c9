// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{extract_token, AuthenticatedUser, AUTH_COOKIE},
        i18n::Locale,
        tenancy::TenantContext,
    },
    models::auth::{AuthResponse, LoginUserPayload, SessionResponse, User},
};

// ---
// Cookie de sessão
// ---
// O valor é o JWT do Manager (base64url + '.'), seguro para cookie sem escape.
fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE,
        token,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

fn set_cookie_header(value: String) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&value)
        .map_err(|e| anyhow::anyhow!("Cookie de sessão inválido: {}", e))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado; token também enviado no cookie auth_token", body = AuthResponse),
        (status = 400, description = "Campos ausentes ou inválidos"),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Usuário ou clínica desativados"),
        (status = 502, description = "Manager indisponível")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .auth_service
        .login_user(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let max_age = outcome.expires_at as i64 - Utc::now().timestamp();
    let headers = set_cookie_header(session_cookie(
        &outcome.token,
        max_age,
        app_state.config.cookie_secure,
    ))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let body = AuthResponse {
        token: outcome.token,
        user: outcome.user,
        tenant: outcome.tenant,
    };

    Ok((StatusCode::OK, headers, Json(body)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Sessão encerrada e cookie removido")
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_token(&request_headers) {
        app_state.auth_service.logout_user(&token).await;
    }

    let headers = set_cookie_header(clear_cookie(app_state.config.cookie_secure))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, headers, Json(json!({ "success": true }))))
}

// GET /api/auth/validate
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    tag = "Auth",
    responses(
        (status = 200, description = "Token válido", body = SessionResponse),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Usuário desativado")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate(
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
) -> Json<SessionResponse> {
    Json(SessionResponse { valid: true, user, tenant })
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário logado", body = User),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_with_max_age() {
        let cookie = session_cookie("a.b.c", 3600, false);
        assert_eq!(cookie, "auth_token=a.b.c; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");
    }

    #[test]
    fn secure_flag_is_optional() {
        assert!(session_cookie("a.b.c", 10, true).ends_with("; Secure"));
    }

    #[test]
    fn clearing_expires_immediately() {
        let cookie = clear_cookie(false);
        assert!(cookie.starts_with("auth_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn negative_lifetimes_are_clamped() {
        assert!(session_cookie("a.b.c", -5, false).contains("Max-Age=0"));
    }
}

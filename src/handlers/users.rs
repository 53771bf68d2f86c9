// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, BearerToken},
        i18n::Locale,
        rbac::{RequireRole, RoleAdmin},
        tenancy::TenantContext,
    },
    models::auth::{User, UserRole},
    services::user_service::{CreatedAccount, NewClinicianAccount},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[serde(default)]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(default)]
    pub email: String,

    #[validate(length(min = 8, message = "A senha deve ter pelo menos 8 caracteres."))]
    #[serde(default)]
    pub password: String,

    #[validate(required(message = "O campo 'role' é obrigatório."))]
    pub role: Option<UserRole>,

    // Só usados quando role = PROFESSIONAL
    pub specialty: Option<String>,
    pub registry_number: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusPayload {
    pub is_active: bool,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ---
// Handler: list_users
// ---
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Contas da clínica", body = Vec<User>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<RoleAdmin>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = app_state
        .user_service
        .list(&tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// ---
// Handler: create_user
// ---
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Conta criada no Manager e na clínica", body = CreatedAccount),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "E-mail já cadastrado"),
        (status = 502, description = "Manager indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    BearerToken(token): BearerToken,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    // `required` já garantiu o papel; sem ele a validação acima falhou
    let role = payload.role.unwrap_or(UserRole::Professional);

    let created = app_state
        .user_service
        .create_account(
            &tenant.0,
            &user.0,
            &token,
            NewClinicianAccount {
                name: payload.name.trim(),
                email: payload.email.trim(),
                password: &payload.password,
                role,
                specialty: non_blank(&payload.specialty),
                registry_number: non_blank(&payload.registry_number),
                phone: non_blank(&payload.phone),
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// ---
// Handler: update_user_status
// ---
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID local do usuário")),
    request_body = UpdateUserStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = User),
        (status = 404, description = "Usuário não pertence à clínica"),
        (status = 403, description = "Apenas administradores; ninguém desativa a própria conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleAdmin>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserStatusPayload>,
) -> Result<Json<User>, ApiError> {
    let updated = app_state
        .user_service
        .set_status(&tenant.0, &user.0, user_id, payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_is_required() {
        let payload: CreateUserPayload = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana@clinica.com",
            "password": "segura123"
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("role"));
    }

    #[test]
    fn short_password_and_bad_email_are_rejected() {
        let payload: CreateUserPayload = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana",
            "password": "123",
            "role": "RECEPTIONIST"
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert_eq!(payload.role, Some(UserRole::Receptionist));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&Some(" CRO-123 ".to_string())), Some("CRO-123"));
        assert_eq!(non_blank(&None), None);
    }
}

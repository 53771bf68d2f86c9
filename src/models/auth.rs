// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::tenancy::Tenant;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Professional,
    Receptionist,
}

impl UserRole {
    /// Converte o papel vindo do Manager. Papéis desconhecidos recebem o menor acesso.
    pub fn from_manager(role: &str) -> Self {
        match role.trim().to_ascii_uppercase().as_str() {
            "ADMIN" | "ADMINISTRATOR" | "ADMINISTRADOR" => UserRole::Admin,
            "RECEPTIONIST" | "RECEPCIONISTA" | "SECRETARY" | "SECRETARIA" => UserRole::Receptionist,
            _ => UserRole::Professional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Professional => "PROFESSIONAL",
            UserRole::Receptionist => "RECEPTIONIST",
        }
    }
}

// Conta local, espelho do usuário do Manager dentro de uma clínica
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub manager_user_id: String,
    pub tenant_id: Uuid,
    #[schema(example = "Dra. Ana Souza")]
    pub name: String,
    #[schema(example = "ana@clinica.com")]
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(default)]
    #[schema(example = "ana@clinica.com")]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    #[serde(default)]
    pub password: String,
}

// Resposta de login: o token também vai no cookie `auth_token`
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub tenant: Tenant,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub valid: bool,
    pub user: User,
    pub tenant: Tenant,
}

// Claims do JWT emitido pelo Manager (HS256, segredo compartilhado)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // ID do usuário no Manager
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "tenantId")]
    pub tenant_id: Uuid,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_roles_map_to_local_roles() {
        assert_eq!(UserRole::from_manager("admin"), UserRole::Admin);
        assert_eq!(UserRole::from_manager(" Recepcionista "), UserRole::Receptionist);
        assert_eq!(UserRole::from_manager("doctor"), UserRole::Professional);
        assert_eq!(UserRole::from_manager(""), UserRole::Professional);
    }

    #[test]
    fn login_payload_requires_both_fields() {
        let payload: LoginUserPayload = serde_json::from_str(r#"{"email":"ana@clinica.com"}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(!errors.field_errors().contains_key("email"));
    }
}

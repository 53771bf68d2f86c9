// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio. Os handlers convertem para `ApiError` (já traduzido) via `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário desativado")]
    UserInactive,

    #[error("Clínica desativada")]
    TenantInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Clínica não encontrada")]
    TenantNotFound,

    #[error("Paciente não encontrado")]
    PatientNotFound,

    #[error("Profissional não encontrado")]
    ProfessionalNotFound,

    #[error("Procedimento não encontrado")]
    ProcedureNotFound,

    #[error("Agendamento não encontrado")]
    AppointmentNotFound,

    #[error("Conflito de horário na agenda do profissional")]
    AppointmentConflict,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Usuário tentou desativar a própria conta")]
    CannotDeactivateSelf,

    #[error("Manager indisponível: {0}")]
    ManagerUnavailable(String),

    #[error("Nome de schema inválido: {0}")]
    InvalidSchemaName(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden
            | AppError::UserInactive
            | AppError::TenantInactive
            | AppError::CannotDeactivateSelf => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::TenantNotFound
            | AppError::PatientNotFound
            | AppError::ProfessionalNotFound
            | AppError::ProcedureNotFound
            | AppError::AppointmentNotFound => StatusCode::NOT_FOUND,
            AppError::AppointmentConflict
            | AppError::InvalidStatusTransition { .. }
            | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::ManagerUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidSchemaName(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::UserInactive => "user_inactive",
            AppError::TenantInactive => "tenant_inactive",
            AppError::UserNotFound => "user_not_found",
            AppError::TenantNotFound => "tenant_not_found",
            AppError::PatientNotFound => "patient_not_found",
            AppError::ProfessionalNotFound => "professional_not_found",
            AppError::ProcedureNotFound => "procedure_not_found",
            AppError::AppointmentNotFound => "appointment_not_found",
            AppError::AppointmentConflict => "appointment_conflict",
            AppError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::CannotDeactivateSelf => "cannot_deactivate_self",
            AppError::ManagerUnavailable(_) => "manager_unavailable",
            AppError::InvalidSchemaName(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => "internal_error",
        }
    }

    /// Traduz o erro para o idioma da requisição.
    /// Erros 5xx são logados com o detalhe completo e devolvidos com mensagem genérica.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        let lang = locale.0.as_str();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                (store.translate(lang, self.message_key()), Some(validation_details(errors)))
            }
            AppError::InvalidStatusTransition { from, to } => (
                store.translate_with(lang, self.message_key(), &[("from", from.as_str()), ("to", to.as_str())]),
                None,
            ),
            _ => (store.translate(lang, self.message_key()), None),
        };

        ApiError { status, error, details }
    }
}

// Agrupa as mensagens do `validator` por campo: { "email": ["..."], ... }
fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .map(Value::String)
            .collect();
        details.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(details)
}

// ---
// ApiError: a resposta HTTP final
// ---
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "obrigatório"))]
        name: String,
    }

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn maps_domain_errors_to_http_status() {
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TenantInactive.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ProcedureNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AppointmentConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ManagerUnavailable("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 1234"));
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Sample { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.unwrap()["name"][0], "obrigatório");
    }

    #[test]
    fn status_transition_message_names_both_states() {
        let err = AppError::InvalidStatusTransition {
            from: "CANCELLED".into(),
            to: "CONFIRMED".into(),
        };
        let api = err.to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.error, "Não é possível alterar o status de CANCELLED para CONFIRMED.");
    }
}

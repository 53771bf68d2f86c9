// src/handlers/patients.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{
        dates,
        db_utils::get_tenant_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleStaff},
        tenancy::TenantContext,
    },
    models::clinic::Patient,
    services::patient_service::NewPatient,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PatientQuery {
    /// Trecho do nome ou do documento
    pub search: Option<String>,
    /// Inclui pacientes desativados
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[serde(default)]
    pub name: String,

    #[validate(length(max = 40, message = "Documento muito longo."))]
    pub document: Option<String>,

    #[schema(example = "1985-04-12")]
    pub birth_date: Option<NaiveDate>,

    #[validate(length(max = 40, message = "Telefone muito longo."))]
    pub phone: Option<String>,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreatePatientPayload {
    fn to_input(&self, today: NaiveDate) -> Result<NewPatient<'_>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut consistent = true;

        let name = self.name.trim();
        if name.is_empty() {
            let mut err = ValidationError::new("length");
            err.message = Some("O nome é obrigatório.".into());
            errors.add("name", err);
            consistent = false;
        }

        if self.birth_date.is_some_and(|d| d > today) {
            let mut err = ValidationError::new("BirthDateInFuture");
            err.message = Some("A data de nascimento não pode estar no futuro.".into());
            errors.add("birthDate", err);
            consistent = false;
        }

        if !consistent {
            return Err(errors);
        }

        Ok(NewPatient {
            name,
            document: non_blank(&self.document),
            birth_date: self.birth_date,
            phone: non_blank(&self.phone),
            email: non_blank(&self.email),
        })
    }
}

// ---
// Handler: list_patients
// ---
#[utoipa::path(
    get,
    path = "/api/patients",
    tag = "Patients",
    params(PatientQuery),
    responses(
        (status = 200, description = "Pacientes em ordem alfabética", body = Vec<Patient>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_patients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let patients = app_state
        .patient_service
        .list(&mut *conn, query.search.as_deref(), query.include_inactive.unwrap_or(false))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(patients))
}

// ---
// Handler: create_patient
// ---
#[utoipa::path(
    post,
    path = "/api/patients",
    tag = "Patients",
    request_body = CreatePatientPayload,
    responses(
        (status = 201, description = "Paciente cadastrado", body = Patient),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administração e recepção")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_patient(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleStaff>,
    Json(payload): Json<CreatePatientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let today = dates::local_today(app_state.config.clinic_offset);
    let input = payload
        .to_input(today)
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let patient = app_state
        .patient_service
        .create(&mut *conn, &user.0, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(patient)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
    }

    fn payload(value: serde_json::Value) -> CreatePatientPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn name_is_required() {
        let p = payload(json!({}));
        assert!(p.validate().unwrap_err().field_errors().contains_key("name"));

        let blank = payload(json!({ "name": "   " }));
        assert!(blank.validate().is_ok());
        assert!(blank.to_input(today()).unwrap_err().field_errors().contains_key("name"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let p = payload(json!({ "name": "João", "email": "joao-arroba-x" }));
        assert!(p.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn birth_date_cannot_be_in_the_future() {
        let p = payload(json!({ "name": "João", "birthDate": "2025-05-03" }));
        assert!(p.validate().is_ok());
        let errors = p.to_input(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("birthDate"));
    }

    #[test]
    fn input_trims_and_drops_blank_fields() {
        let p = payload(json!({
            "name": "  Maria Souza ",
            "document": "  ",
            "birthDate": "1990-01-31",
            "phone": " (11) 99999-0000 "
        }));
        assert!(p.validate().is_ok());
        let input = p.to_input(today()).unwrap();
        assert_eq!(input.name, "Maria Souza");
        assert_eq!(input.document, None);
        assert_eq!(input.phone, Some("(11) 99999-0000"));
        assert_eq!(input.birth_date, NaiveDate::from_ymd_opt(1990, 1, 31));
        assert_eq!(input.email, None);
    }
}

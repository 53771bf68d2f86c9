// src/handlers/appointments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{
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
    models::scheduling::{Appointment, AppointmentDetail, AppointmentStatus},
    services::appointment_service::NewAppointment,
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    /// Dia no fuso da clínica (YYYY-MM-DD). Padrão: hoje.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentPayload {
    #[validate(required(message = "O campo 'patientId' é obrigatório."))]
    pub patient_id: Option<Uuid>,

    #[validate(required(message = "O campo 'professionalId' é obrigatório."))]
    pub professional_id: Option<Uuid>,

    pub procedure_id: Option<Uuid>,

    #[validate(required(message = "O campo 'startsAt' é obrigatório."))]
    pub starts_at: Option<DateTime<Utc>>,

    // Sem término: usa a duração do procedimento
    pub ends_at: Option<DateTime<Utc>>,

    #[validate(length(max = 2000, message = "Observações muito longas."))]
    pub notes: Option<String>,
}

impl CreateAppointmentPayload {
    // Regras entre campos + conversão para a entrada do serviço
    fn to_input(&self) -> Result<NewAppointment<'_>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut consistent = true;

        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at) {
            if ends_at <= starts_at {
                let mut err = ValidationError::new("EndsBeforeStart");
                err.message = Some("O término deve ser posterior ao início.".into());
                errors.add("endsAt", err);
                consistent = false;
            }
        }

        match (self.patient_id, self.professional_id, self.starts_at) {
            (Some(patient_id), Some(professional_id), Some(starts_at)) if consistent => {
                Ok(NewAppointment {
                    patient_id,
                    professional_id,
                    procedure_id: self.procedure_id,
                    starts_at,
                    ends_at: self.ends_at,
                    notes: self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    pub status: AppointmentStatus,
}

// ---
// Handler: list_today
// ---
#[utoipa::path(
    get,
    path = "/api/appointments/today",
    tag = "Appointments",
    params(DayQuery),
    responses(
        (status = 200, description = "Agenda do dia ordenada por horário", body = Vec<AppointmentDetail>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_today(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<AppointmentDetail>>, ApiError> {
    let date = query
        .date
        .unwrap_or_else(|| app_state.appointment_service.today());

    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let appointments = app_state
        .appointment_service
        .list_for_day(&mut *conn, date, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(appointments))
}

// ---
// Handler: create_appointment
// ---
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentPayload,
    responses(
        (status = 201, description = "Atendimento agendado", body = Appointment),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administração e recepção"),
        (status = 404, description = "Paciente, profissional ou procedimento inexistente"),
        (status = 409, description = "Conflito de horário")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleStaff>,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = payload
        .to_input()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .create(&mut *conn, &user.0, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

// ---
// Handler: update_status
// ---
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "ID do atendimento")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Appointment),
        (status = 403, description = "Atendimento de outro profissional"),
        (status = 404, description = "Atendimento inexistente"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<Appointment>, ApiError> {
    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .update_status(&mut *conn, &user.0, appointment_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(appointment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> CreateAppointmentPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_required_fields_fail_validation() {
        let p = payload(json!({ "patientId": Uuid::new_v4() }));
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("professional_id"));
        assert!(fields.contains_key("starts_at"));
        assert!(!fields.contains_key("patient_id"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let p = payload(json!({
            "patientId": Uuid::new_v4(),
            "professionalId": Uuid::new_v4(),
            "startsAt": "2025-03-10T14:00:00Z",
            "endsAt": "2025-03-10T13:30:00Z"
        }));
        assert!(p.validate().is_ok());
        let errors = p.to_input().unwrap_err();
        assert!(errors.field_errors().contains_key("endsAt"));
    }

    #[test]
    fn blank_notes_are_dropped() {
        let p = payload(json!({
            "patientId": Uuid::new_v4(),
            "professionalId": Uuid::new_v4(),
            "startsAt": "2025-03-10T14:00:00Z",
            "notes": "   "
        }));
        let input = p.to_input().unwrap();
        assert_eq!(input.notes, None);
        assert_eq!(input.ends_at, None);
    }

    #[test]
    fn status_payload_uses_screaming_case() {
        let p: UpdateStatusPayload = serde_json::from_value(json!({ "status": "NO_SHOW" })).unwrap();
        assert_eq!(p.status, AppointmentStatus::NoShow);
        assert!(serde_json::from_value::<UpdateStatusPayload>(json!({ "status": "done" })).is_err());
    }
}

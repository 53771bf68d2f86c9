// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(title = "Clínica API", description = "Backend multi-clínica com login delegado ao Manager"),
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::validate,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user_status,

        // --- Dashboard ---
        handlers::dashboard::get_stats,

        // --- Appointments ---
        handlers::appointments::list_today,
        handlers::appointments::create_appointment,
        handlers::appointments::update_status,

        // --- Patients ---
        handlers::patients::list_patients,
        handlers::patients::create_patient,

        // --- Procedures ---
        handlers::procedures::list_procedures,
        handlers::procedures::create_procedure,
        handlers::procedures::update_procedure,
        handlers::procedures::delete_procedure,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::SessionResponse,
            models::tenancy::Tenant,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::Activity,

            // --- Agenda ---
            models::scheduling::AppointmentStatus,
            models::scheduling::Appointment,
            models::scheduling::AppointmentDetail,

            // --- Cadastros ---
            models::clinic::Patient,
            models::clinic::Procedure,
            models::clinic::Professional,
            services::user_service::CreatedAccount,

            // --- Payloads ---
            handlers::appointments::CreateAppointmentPayload,
            handlers::appointments::UpdateStatusPayload,
            handlers::patients::CreatePatientPayload,
            handlers::procedures::ProcedurePayload,
            handlers::users::CreateUserPayload,
            handlers::users::UpdateUserStatusPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e validação de sessão (via Manager)"),
        (name = "Users", description = "Contas da clínica"),
        (name = "Dashboard", description = "Indicadores da clínica"),
        (name = "Appointments", description = "Agenda de atendimentos"),
        (name = "Patients", description = "Cadastro de pacientes"),
        (name = "Procedures", description = "Catálogo de procedimentos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/me",
            "/api/dashboard/stats",
            "/api/appointments/{id}/status",
            "/api/procedures/{id}",
            "/api/patients",
            "/api/users/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltando {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}

pub mod appointment_service;
pub mod auth;
pub mod dashboard_service;
pub mod manager;
pub mod patient_service;
pub mod procedure_service;
pub mod user_service;

pub use appointment_service::AppointmentService;
pub use auth::AuthService;
pub use dashboard_service::DashboardService;
pub use patient_service::PatientService;
pub use procedure_service::ProcedureService;
pub use user_service::UserService;

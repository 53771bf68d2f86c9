// Repositórios do schema public (pool própria)
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod user_repo;
pub use user_repo::UserRepository;

// Repositórios do schema de cada tenant (recebem a conexão do tenant)
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod appointment_repo;
pub use appointment_repo::AppointmentRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod patient_repo;
pub use patient_repo::PatientRepository;
pub mod procedure_repo;
pub use procedure_repo::ProcedureRepository;
pub mod professional_repo;
pub use professional_repo::ProfessionalRepository;

// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ActivityRepository, AppointmentRepository, DashboardRepository, PatientRepository,
        ProcedureRepository, ProfessionalRepository, TenantRepository, UserRepository,
    },
    services::{
        manager::{ManagerApi, ManagerClient},
        AppointmentService, AuthService, DashboardService, PatientService, ProcedureService,
        UserService,
    },
};

// Padrões
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MANAGER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CLINIC_UTC_OFFSET_HOURS: i32 = -3; // America/Sao_Paulo

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub manager_url: String,
    pub manager_jwt_secret: String,
    pub manager_timeout: Duration,
    pub manager_remote_validation: bool,
    pub cookie_secure: bool,
    pub clinic_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} deve ser definida", key))
        };

        let offset_hours: i32 = parse_or(&get, "CLINIC_UTC_OFFSET_HOURS", DEFAULT_CLINIC_UTC_OFFSET_HOURS)?;
        let clinic_offset = FixedOffset::east_opt(offset_hours * 3600)
            .with_context(|| format!("CLINIC_UTC_OFFSET_HOURS fora do intervalo: {}", offset_hours))?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            manager_url: required("MANAGER_URL")?,
            manager_jwt_secret: required("MANAGER_JWT_SECRET")?,
            manager_timeout: Duration::from_secs(parse_or(
                &get,
                "MANAGER_TIMEOUT_SECS",
                DEFAULT_MANAGER_TIMEOUT_SECS,
            )?),
            manager_remote_validation: parse_or(&get, "MANAGER_REMOTE_VALIDATION", false)?,
            cookie_secure: parse_or(&get, "COOKIE_SECURE", false)?,
            clinic_offset,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        None => Ok(default),
    }
}

/// Opções da pool. Toda conexão devolvida perde o `search_path` do tenant.
pub fn pool_options(config: &AppConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .after_release(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("RESET search_path").execute(&mut *conn).await?;
                Ok(true)
            })
        })
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub dashboard_service: DashboardService,
    pub appointment_service: AppointmentService,
    pub patient_service: PatientService,
    pub procedure_service: ProcedureService,
    pub user_service: UserService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = pool_options(&config)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let manager = ManagerClient::new(&config.manager_url, config.manager_timeout)?;

        Self::from_parts(config, db_pool, Arc::new(manager))
    }

    /// Monta o gráfico de dependências a partir de peças já prontas.
    pub fn from_parts(
        config: AppConfig,
        db_pool: PgPool,
        manager: Arc<dyn ManagerApi>,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new();
        let procedure_repo = ProcedureRepository::new();
        let professional_repo = ProfessionalRepository::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo,
            activity_repo.clone(),
            manager.clone(),
            config.manager_jwt_secret.clone(),
            config.manager_remote_validation,
            db_pool.clone(),
        );
        let dashboard_service = DashboardService::new(
            DashboardRepository::new(activity_repo.clone()),
            config.clinic_offset,
        );
        let appointment_service = AppointmentService::new(
            AppointmentRepository::new(),
            procedure_repo.clone(),
            professional_repo.clone(),
            activity_repo.clone(),
            config.clinic_offset,
        );
        let patient_service = PatientService::new(PatientRepository::new(), activity_repo.clone());
        let procedure_service = ProcedureService::new(procedure_repo, activity_repo.clone());
        let user_service = UserService::new(
            user_repo,
            professional_repo,
            activity_repo,
            manager,
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            dashboard_service,
            appointment_service,
            patient_service,
            procedure_service,
            user_service,
        })
    }
}

// src/services/user_service.rs

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{db_utils::set_local_search_path, error::AppError},
    db::{activity_repo, ActivityRepository, ProfessionalRepository, UserRepository},
    models::{
        auth::{User, UserRole},
        clinic::Professional,
        manager::NewManagerUser,
        tenancy::Tenant,
    },
    services::manager::ManagerApi,
};

#[derive(Debug, Clone)]
pub struct NewClinicianAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: UserRole,
    pub specialty: Option<&'a str>,
    pub registry_number: Option<&'a str>,
    pub phone: Option<&'a str>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub user: User,
    pub professional: Option<Professional>,
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    professional_repo: ProfessionalRepository,
    activity_repo: ActivityRepository,
    manager: Arc<dyn ManagerApi>,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        professional_repo: ProfessionalRepository,
        activity_repo: ActivityRepository,
        manager: Arc<dyn ManagerApi>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, professional_repo, activity_repo, manager, pool }
    }

    pub async fn list(&self, tenant: &Tenant) -> Result<Vec<User>, AppError> {
        self.user_repo.list_by_tenant(tenant.id).await
    }

    /// Cria a conta no Manager e, em seguida, o espelho local (+ cadastro de profissional).
    /// `token` é o do administrador logado: o Manager autoriza a criação com ele.
    pub async fn create_account(
        &self,
        tenant: &Tenant,
        actor: &User,
        token: &str,
        input: NewClinicianAccount<'_>,
    ) -> Result<CreatedAccount, AppError> {
        let manager_user = self.manager
            .create_user(
                token,
                &NewManagerUser {
                    name: input.name.to_string(),
                    email: input.email.to_string(),
                    password: input.password.to_string(),
                    role: input.role.as_str().to_string(),
                    tenant_id: tenant.id,
                },
            )
            .await?;

        // --- INÍCIO DA TRANSAÇÃO (public + schema do tenant) ---
        let result = async {
            let mut tx = self.pool.begin().await?;

            let user = self.user_repo
                .create_user(&mut *tx, &manager_user.id, tenant.id, input.name, input.email, input.role)
                .await?;

            set_local_search_path(&mut *tx, &tenant.schema_name).await?;

            let professional = match input.role {
                UserRole::Professional => Some(
                    self.professional_repo
                        .create(
                            &mut *tx,
                            Some(user.id),
                            input.name,
                            input.specialty,
                            input.registry_number,
                            Some(input.email),
                            input.phone,
                        )
                        .await?,
                ),
                UserRole::Admin | UserRole::Receptionist => None,
            };

            self.activity_repo
                .record(
                    &mut *tx,
                    Some(actor.id),
                    activity_repo::ACTIVITY_USER_CREATED,
                    &format!("{} criou a conta de {}", actor.name, user.name),
                )
                .await?;

            tx.commit().await?;
            Ok::<_, AppError>(CreatedAccount { user, professional })
        }
        .await;
        // --- FIM DA TRANSAÇÃO ---

        if let Err(e) = &result {
            // A conta já existe no Manager; o primeiro login dela recria o espelho local
            tracing::error!(
                "🔥 Conta {} criada no Manager mas não localmente: {}",
                manager_user.id, e
            );
        }

        result
    }

    pub async fn set_status(
        &self,
        tenant: &Tenant,
        actor: &User,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User, AppError> {
        if actor.id == user_id && !is_active {
            return Err(AppError::CannotDeactivateSelf);
        }

        let mut tx = self.pool.begin().await?;

        let user = self.user_repo
            .set_active(&mut *tx, tenant.id, user_id, is_active)
            .await?
            .ok_or(AppError::UserNotFound)?;

        set_local_search_path(&mut *tx, &tenant.schema_name).await?;

        self.professional_repo
            .set_active_by_user(&mut *tx, user.id, is_active)
            .await?;

        let verb = if is_active { "reativou" } else { "desativou" };
        self.activity_repo
            .record(
                &mut *tx,
                Some(actor.id),
                activity_repo::ACTIVITY_USER_STATUS,
                &format!("{} {} a conta de {}", actor.name, verb, user.name),
            )
            .await?;

        tx.commit().await?;
        Ok(user)
    }
}

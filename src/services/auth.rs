// src/services/auth.rs

use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{schema_name_for_tenant, set_local_search_path},
        error::AppError,
    },
    db::{activity_repo, ActivityRepository, TenantRepository, UserRepository},
    models::{
        auth::{Claims, User, UserRole},
        manager::ManagerLoginResponse,
        tenancy::Tenant,
    },
    services::manager::ManagerApi,
};

/// Sessão resolvida a partir de um token do Manager.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub tenant: Tenant,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: usize,
    pub user: User,
    pub tenant: Tenant,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    activity_repo: ActivityRepository,
    manager: Arc<dyn ManagerApi>,
    jwt_secret: String,
    remote_validation: bool,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        activity_repo: ActivityRepository,
        manager: Arc<dyn ManagerApi>,
        jwt_secret: String,
        remote_validation: bool,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, tenant_repo, activity_repo, manager, jwt_secret, remote_validation, pool }
    }

    /// Autentica no Manager e sincroniza clínica e usuário locais numa única transação.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let session = self.manager.login(email, password).await?;

        // O token precisa ser verificável com o nosso segredo, senão toda requisição seguinte falharia
        let claims = self.decode_claims(&session.token).map_err(|_| {
            AppError::ManagerUnavailable("token do Manager não pôde ser verificado".into())
        })?;
        check_consistency(&session, &claims)?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 1. Clínica: cria (e provisiona o schema) na primeira vez que aparece
        let tenant = match self.tenant_repo.find_by_id_with(&mut *tx, session.tenant.id).await? {
            Some(existing) if existing.name != session.tenant.name => {
                self.tenant_repo
                    .update_name(&mut *tx, existing.id, &session.tenant.name)
                    .await?
            }
            Some(existing) => existing,
            None => {
                let schema_name = schema_name_for_tenant(&session.tenant.slug, session.tenant.id)?;
                let created = self.tenant_repo
                    .create_tenant(
                        &mut *tx,
                        session.tenant.id,
                        &session.tenant.name,
                        &session.tenant.slug,
                        &schema_name,
                    )
                    .await?;
                self.tenant_repo.provision_schema(&mut *tx, &schema_name).await?;
                tracing::info!("🏥 Nova clínica registrada: {} ({})", created.name, created.id);
                created
            }
        };

        if !tenant.is_active {
            return Err(AppError::TenantInactive);
        }

        // 2. Usuário local (espelho do Manager)
        let role = session
            .user
            .role
            .as_deref()
            .or(claims.role.as_deref())
            .map(UserRole::from_manager)
            .unwrap_or(UserRole::Professional);

        let user = self.user_repo
            .upsert_on_login(
                &mut *tx,
                &session.user.id,
                tenant.id,
                &session.user.name,
                &session.user.email,
                role,
            )
            .await?;

        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        // 3. Feed de atividades (schema do tenant)
        set_local_search_path(&mut *tx, &tenant.schema_name).await?;
        self.activity_repo
            .record(
                &mut *tx,
                Some(user.id),
                activity_repo::ACTIVITY_LOGIN,
                &format!("{} entrou no sistema", user.name),
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🔐 Login de {} na clínica {}", user.email, tenant.id);

        Ok(LoginOutcome {
            token: session.token,
            expires_at: claims.exp,
            user,
            tenant,
        })
    }

    /// Valida assinatura e expiração; opcionalmente confirma com o Manager (revogação).
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_claims(token)?;

        if self.remote_validation {
            self.manager.validate(token).await?;
        }

        Ok(claims)
    }

    /// Token -> usuário e clínica locais.
    pub async fn resolve_session(&self, token: &str) -> Result<Session, AppError> {
        let claims = self.validate_token(token).await?;

        let user = self.user_repo
            .find_by_manager_id(&claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // Token emitido para outra clínica (usuário foi transferido desde então)
        if user.tenant_id != claims.tenant_id {
            return Err(AppError::InvalidToken);
        }

        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        let tenant = self.tenant_repo
            .find_by_id(user.tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound)?;

        Ok(Session { user, tenant })
    }

    /// Encerra a sessão no Manager. Nunca falha: o cookie local é limpo de qualquer forma.
    pub async fn logout_user(&self, token: &str) {
        // Resolvida antes do logout remoto, que revoga o token
        let session = self.resolve_session(token).await.ok();

        if let Err(e) = self.manager.logout(token).await {
            tracing::warn!("⚠️ Logout no Manager falhou (ignorado): {}", e);
        }

        if let Some(session) = session {
            if let Err(e) = self.record_logout(&session).await {
                tracing::warn!("⚠️ Não foi possível registrar o logout: {}", e);
            }
        }
    }

    async fn record_logout(&self, session: &Session) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        set_local_search_path(&mut *tx, &session.tenant.schema_name).await?;
        self.activity_repo
            .record(
                &mut *tx,
                Some(session.user.id),
                activity_repo::ACTIVITY_LOGOUT,
                &format!("{} saiu do sistema", session.user.name),
            )
            .await?;
        tx.commit().await?;
        Ok(())
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode_manager_token(token, &self.jwt_secret)
    }
}

/// Decodifica um JWT do Manager (HS256 + `exp`).
pub fn decode_manager_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
        .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}

// O corpo da resposta e o token precisam falar do mesmo usuário e da mesma clínica
fn check_consistency(session: &ManagerLoginResponse, claims: &Claims) -> Result<(), AppError> {
    if claims.sub != session.user.id || claims.tenant_id != session.tenant.id {
        tracing::error!(
            "🔥 Resposta do Manager inconsistente: token(sub={}, tenant={}) corpo(user={}, tenant={})",
            claims.sub, claims.tenant_id, session.user.id, session.tenant.id
        );
        return Err(AppError::ManagerUnavailable("resposta inconsistente do Manager".into()));
    }
    Ok(())
}

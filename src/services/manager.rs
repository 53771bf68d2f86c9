// src/services/manager.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    models::manager::{ManagerLoginResponse, ManagerUser, NewManagerUser},
};

/// Operações que delegamos ao Manager (Sistema 1).
/// O trait existe para que os testes troquem o cliente HTTP por um dublê.
#[async_trait]
pub trait ManagerApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<ManagerLoginResponse, AppError>;

    async fn logout(&self, token: &str) -> Result<(), AppError>;

    async fn validate(&self, token: &str) -> Result<(), AppError>;

    async fn create_user(&self, token: &str, user: &NewManagerUser) -> Result<ManagerUser, AppError>;
}

#[derive(Clone)]
pub struct ManagerClient {
    http: Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct CreatedUserEnvelope {
    user: ManagerUser,
}

impl ManagerClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Falha de transporte (timeout, DNS, conexão recusada)
fn unavailable(e: reqwest::Error) -> AppError {
    tracing::warn!("⚠️ Falha ao falar com o Manager: {}", e);
    AppError::ManagerUnavailable(e.to_string())
}

// Status inesperado do Manager: 5xx e afins viram 502
fn unexpected_status(status: StatusCode) -> AppError {
    tracing::warn!("⚠️ Manager respondeu com status inesperado: {}", status);
    AppError::ManagerUnavailable(format!("status {}", status))
}

#[async_trait]
impl ManagerApi for ManagerClient {
    async fn login(&self, email: &str, password: &str) -> Result<ManagerLoginResponse, AppError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            s if s.is_success() => response.json::<ManagerLoginResponse>().await.map_err(unavailable),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(AppError::InvalidCredentials)
            }
            s => Err(unexpected_status(s)),
        }
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.url("/api/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(unavailable)?;

        // Token já expirado no Manager também conta como sessão encerrada
        match response.status() {
            s if s.is_success() || s == StatusCode::UNAUTHORIZED => Ok(()),
            s => Err(unexpected_status(s)),
        }
    }

    async fn validate(&self, token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .get(self.url("/api/auth/validate"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::InvalidToken),
            s => Err(unexpected_status(s)),
        }
    }

    async fn create_user(&self, token: &str, user: &NewManagerUser) -> Result<ManagerUser, AppError> {
        let response = self
            .http
            .post(self.url("/api/users"))
            .bearer_auth(token)
            .json(user)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            s if s.is_success() => Ok(response
                .json::<CreatedUserEnvelope>()
                .await
                .map_err(unavailable)?
                .user),
            StatusCode::CONFLICT => Err(AppError::EmailAlreadyExists),
            StatusCode::UNAUTHORIZED => Err(AppError::InvalidToken),
            StatusCode::FORBIDDEN => Err(AppError::Forbidden),
            s => Err(unexpected_status(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = ManagerClient::new("http://manager.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/api/auth/login"), "http://manager.local/api/auth/login");
    }
}

// src/models/manager.rs

// Contratos JSON da API do Manager (Sistema 1)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerTenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerLoginResponse {
    pub token: String,
    pub user: ManagerUser,
    pub tenant: ManagerTenant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManagerUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub tenant_id: Uuid,
}

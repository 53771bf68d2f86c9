// src/handlers/procedures.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::get_tenant_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleAdmin},
        tenancy::TenantContext,
    },
    models::clinic::Procedure,
    services::procedure_service::ProcedureInput,
};

// ---
// Validação Customizada
// ---
// Coluna NUMERIC(12, 2): até 10 dígitos inteiros e 2 casas decimais
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    if *val > max_price() {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &max_price().to_string());
        err.message = Some("O valor excede o máximo permitido.".into());
        return Err(err);
    }
    if val.normalize().scale() > 2 {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &2);
        err.message = Some("O valor aceita no máximo duas casas decimais.".into());
        return Err(err);
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProcedureQuery {
    /// Trecho do nome (sem diferenciar maiúsculas)
    pub search: Option<String>,
    /// Inclui procedimentos removidos
    pub include_inactive: Option<bool>,
}

// Mesmo payload para criação e edição (PUT substitui o registro)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcedurePayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[serde(default)]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1440, message = "A duração deve estar entre 1 e 1440 minutos."))]
    #[serde(default)]
    pub duration_minutes: i32,

    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 150.0)]
    pub price: Decimal,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProcedurePayload {
    fn as_input(&self) -> ProcedureInput<'_> {
        ProcedureInput {
            name: self.name.trim(),
            description: self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
            duration_minutes: self.duration_minutes,
            price: self.price,
            is_active: self.is_active,
        }
    }
}

// ---
// Handler: list_procedures
// ---
#[utoipa::path(
    get,
    path = "/api/procedures",
    tag = "Procedures",
    params(ProcedureQuery),
    responses(
        (status = 200, description = "Procedimentos em ordem alfabética", body = Vec<Procedure>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_procedures(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ProcedureQuery>,
) -> Result<Json<Vec<Procedure>>, ApiError> {
    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let procedures = app_state
        .procedure_service
        .list(&mut *conn, search, query.include_inactive.unwrap_or(false))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(procedures))
}

// ---
// Handler: create_procedure
// ---
#[utoipa::path(
    post,
    path = "/api/procedures",
    tag = "Procedures",
    request_body = ProcedurePayload,
    responses(
        (status = 201, description = "Procedimento criado", body = Procedure),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_procedure(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<ProcedurePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let procedure = app_state
        .procedure_service
        .create(&mut *conn, &user.0, payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(procedure)))
}

// ---
// Handler: update_procedure
// ---
#[utoipa::path(
    put,
    path = "/api/procedures/{id}",
    tag = "Procedures",
    params(("id" = Uuid, Path, description = "ID do procedimento")),
    request_body = ProcedurePayload,
    responses(
        (status = 200, description = "Procedimento atualizado", body = Procedure),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Procedimento inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_procedure(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleAdmin>,
    Path(procedure_id): Path<Uuid>,
    Json(payload): Json<ProcedurePayload>,
) -> Result<Json<Procedure>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let procedure = app_state
        .procedure_service
        .update(&mut *conn, &user.0, procedure_id, payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(procedure))
}

// ---
// Handler: delete_procedure (remoção lógica)
// ---
#[utoipa::path(
    delete,
    path = "/api/procedures/{id}",
    tag = "Procedures",
    params(("id" = Uuid, Path, description = "ID do procedimento")),
    responses(
        (status = 204, description = "Procedimento desativado"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Procedimento inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_procedure(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleAdmin>,
    Path(procedure_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_tenant_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .procedure_service
        .remove(&mut *conn, &user.0, procedure_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn negative_price_is_rejected() {
        let payload: ProcedurePayload = serde_json::from_value(json!({
            "name": "Limpeza",
            "durationMinutes": 30,
            "price": -1.5
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    fn priced(price: serde_json::Value) -> ProcedurePayload {
        serde_json::from_value(json!({
            "name": "Limpeza",
            "durationMinutes": 30,
            "price": price
        }))
        .unwrap()
    }

    #[test]
    fn price_above_column_limit_is_rejected() {
        let errors = priced(json!(100000000000u64)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(priced(json!(1234567.5)).validate().is_ok());
    }

    #[test]
    fn price_with_more_than_two_decimals_is_rejected() {
        let errors = priced(json!(10.005)).validate().unwrap_err();
        assert_eq!(errors.field_errors()["price"][0].code, "scale");
        assert!(priced(json!(10.5)).validate().is_ok());
    }

    #[test]
    fn max_price_matches_numeric_column() {
        assert_eq!(max_price().to_string(), "9999999999.99");
    }

    #[test]
    fn missing_fields_fail_validation_instead_of_parsing() {
        let payload: ProcedurePayload = serde_json::from_value(json!({})).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("duration_minutes"));
        assert!(payload.is_active);
    }

    #[test]
    fn input_trims_text_fields() {
        let payload: ProcedurePayload = serde_json::from_value(json!({
            "name": "  Avaliação ",
            "description": "  ",
            "durationMinutes": 45,
            "price": 80
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        let input = payload.as_input();
        assert_eq!(input.name, "Avaliação");
        assert_eq!(input.description, None);
        assert_eq!(input.price, Decimal::from(80));
    }
}

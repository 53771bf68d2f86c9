// src/routes.rs

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn app_router(app_state: AppState) -> Router {
    // Rotas de autenticação: login/logout públicos, validate exige sessão
    let auth_routes = Router::new()
        .route("/validate", get(handlers::auth::validate))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // /me só precisa de sessão; o resto é administração da clínica
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        .merge(
            Router::new()
                .route("/"
                       ,get(handlers::users::list_users)
                       .post(handlers::users::create_user)
                )
                .route("/{id}/status"
                       ,patch(handlers::users::update_user_status)
                )
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    tenant_guard,
                )),
        );

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let appointment_routes = Router::new()
        .route("/", post(handlers::appointments::create_appointment))
        .route("/today", get(handlers::appointments::list_today))
        .route("/{id}/status", patch(handlers::appointments::update_status))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let patient_routes = Router::new()
        .route("/"
               ,get(handlers::patients::list_patients)
               .post(handlers::patients::create_patient)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let procedure_routes = Router::new()
        .route("/"
               ,get(handlers::procedures::list_procedures)
               .post(handlers::procedures::create_procedure)
        )
        .route("/{id}"
               ,put(handlers::procedures::update_procedure)
               .delete(handlers::procedures::delete_procedure)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // O front-end usa o cookie de sessão: origem refletida + credenciais
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT_LANGUAGE]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/docs/openapi.json", get(openapi))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/appointments", appointment_routes)
        .nest("/api/patients", patient_routes)
        .nest("/api/procedures", procedure_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        common::test_support::{lazy_state, StubManager},
        services::auth::tests::{claims_for, sign, SECRET},
    };

    // Manager que recusa qualquer login; nenhuma rota testada aqui abre conexão
    fn app() -> Router {
        app_router(lazy_state(StubManager::default()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/dashboard/stats", "/api/appointments/today", "/api/procedures", "/api/patients", "/api/users/me", "/api/auth/validate"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::get("/api/dashboard/stats")
                    .header(header::AUTHORIZATION, "Bearer isto-nao-e-um-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Token de autenticação inválido ou ausente.");
    }

    #[tokio::test]
    async fn expired_cookie_token_is_unauthorized() {
        let token = sign(&claims_for("42", Uuid::new_v4(), -3600), SECRET);
        let response = app()
            .oneshot(
                Request::get("/api/procedures")
                    .header(header::COOKIE, format!("auth_token={}", token))
                    .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_unauthorized() {
        let token = sign(&claims_for("42", Uuid::new_v4(), 3600), "outro-segredo");
        let response = app()
            .oneshot(
                Request::get("/api/users/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_without_password_is_a_validation_error() {
        let response = app()
            .oneshot(login_request(json!({ "email": "ana@clinica.com" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn rejected_credentials_are_unauthorized() {
        let response = app()
            .oneshot(login_request(json!({ "email": "ana@clinica.com", "password": "errada" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_without_session_still_clears_the_cookie() {
        let response = app()
            .oneshot(
                Request::post("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("auth_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(body_json(response).await, json!({ "success": true }));
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let response = app()
            .oneshot(Request::get("/api/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/appointments/today"].is_object());
        assert!(body["paths"]["/api/patients"]["post"].is_object());
    }
}

pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::services::{AuthService, Database, JwtService};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub auth_service: AuthService,
}

pub fn build_router(state: AppState) -> Router {
    // Everything except signup/login/health sits behind the bearer-token
    // middleware, which resolves the caller's capability set per request.
    let protected = Router::new()
        .route("/users", get(handlers::user::get_users))
        .route(
            "/users/:id",
            get(handlers::user::get_user_by_id)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route("/roles", get(handlers::role::get_roles))
        .route(
            "/courses",
            post(handlers::course::create_course).get(handlers::course::get_courses),
        )
        .route(
            "/courses/:id",
            get(handlers::course::get_course_by_id)
                .put(handlers::course::update_course)
                .delete(handlers::course::delete_course),
        )
        .route(
            "/permissions",
            post(handlers::permission::create_permission)
                .get(handlers::permission::get_permissions),
        )
        .route(
            "/permissions/:id",
            axum::routing::put(handlers::permission::update_permission)
                .delete(handlers::permission::delete_permission),
        )
        .route(
            "/masters",
            post(handlers::master::create_master).get(handlers::master::get_masters),
        )
        .route(
            "/masters/:id",
            get(handlers::master::get_master_by_id)
                .put(handlers::master::update_master)
                .delete(handlers::master::delete_master),
        )
        .route(
            "/submasters",
            post(handlers::submaster::create_sub_master).get(handlers::submaster::get_sub_masters),
        )
        .route(
            "/submasters/:id",
            get(handlers::submaster::get_sub_master_by_id)
                .put(handlers::submaster::update_sub_master)
                .delete(handlers::submaster::delete_sub_master),
        )
        .route(
            "/employee-permissions",
            post(handlers::employee_permission::create_employee_permission)
                .get(handlers::employee_permission::get_employee_permissions),
        )
        .route(
            "/employee-permissions/:id",
            get(handlers::employee_permission::get_employee_permission_by_id)
                .put(handlers::employee_permission::update_employee_permission)
                .delete(handlers::employee_permission::delete_employee_permission),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(
            config
                .security
                .allowed_origins
                .iter()
                .filter_map(|origin| {
                    origin
                        .parse::<axum::http::HeaderValue>()
                        .map_err(|e| {
                            tracing::error!(origin = %origin, error = %e, "Invalid CORS origin, skipping");
                            e
                        })
                        .ok()
                })
                .collect::<Vec<axum::http::HeaderValue>>(),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Service health check: liveness plus a database ping.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}

//! Signup and login endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::handlers::ApiResponse;
use crate::models::user::{AuthResponse, LoginRequest, SignupRequest};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let result = state.auth_service.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User registered successfully.", result)),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let result = state.auth_service.login(req).await?;

    Ok(Json(ApiResponse::new("Login successful.", result)))
}

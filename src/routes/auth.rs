use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::{issue_token, verify_credentials};
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let Some(user) = verify_credentials(&state.db, &payload.username, &payload.password).await?
    else {
        tracing::info!("Auth | POST /auth/login | user={} | res=denied", payload.username);
        return Err(AppError::Unauthorized("Invalid username/password.".to_string()));
    };

    let ttl = state.config.access_token_ttl_secs;
    let access_token = issue_token(&user, &state.config.jwt_secret, ttl)?;

    tracing::info!("Auth | POST /auth/login | user={} | res=ok", user.username);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ttl,
    }))
}

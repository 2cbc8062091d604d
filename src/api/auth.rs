//! Registration and login endpoints

use axum::{Json, Router, extract::State, routing::post};

use super::dto::TokenResponse;
use crate::AppState;
use crate::error::AppError;
use crate::service::{IdentityService, LoginRequest, RegisterRequest};

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

fn identity_service(state: &AppState) -> IdentityService {
    IdentityService::new(state.db.clone(), state.config.owner.id.clone())
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = identity_service(&state).register(request).await?;
    Ok(Json(TokenResponse { token }))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = identity_service(&state).login(request).await?;
    Ok(Json(TokenResponse { token }))
}

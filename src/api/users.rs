//! User administration endpoints

use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch},
};
use serde::Deserialize;
use serde_json::Value;

use super::dto::UserResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::policy::Policy;
use crate::service::UserAdminService;

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/", get(list_users))
        .route("/:id/role", patch(change_role))
        .route("/:id", delete(delete_user))
}

fn user_admin_service(state: &AppState) -> UserAdminService {
    UserAdminService::new(
        state.db.clone(),
        Policy::new(state.config.owner.id.clone()),
    )
}

/// GET /api/users/me
async fn me(CurrentUser(actor): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(actor))
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user_admin_service(&state).list(&actor).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Default, Deserialize)]
struct ChangeRoleRequest {
    role: Option<Value>,
}

/// PATCH /api/users/:id/role
async fn change_role(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let role = match &request.role {
        Some(Value::String(role)) if !role.is_empty() => role.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(AppError::Validation("Role is required.".to_string()));
        }
        // Non-string payloads fall through to the role parser and fail there.
        Some(other) => other.to_string(),
    };

    let user = user_admin_service(&state)
        .change_role(&actor, &id, &role)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/:id
async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    user_admin_service(&state).delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

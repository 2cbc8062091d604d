//! Post endpoints
//!
//! Reads are public; mutations require a bearer token.

use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::Post;
use crate::error::AppError;
use crate::policy::Policy;
use crate::service::{CreatePostRequest, EditPostRequest, PostService};

pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/owner", get(owner_posts))
        .route("/:id", get(get_post).patch(edit_post).delete(delete_post))
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(
        state.db.clone(),
        Policy::new(state.config.owner.id.clone()),
    )
}

/// GET /api/posts
async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = post_service(&state).list().await?;
    Ok(Json(posts))
}

/// GET /api/posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, AppError> {
    let post = post_service(&state).get(&id).await?;
    Ok(Json(post))
}

/// GET /api/posts/owner
async fn owner_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = post_service(&state).owner_feed().await?;
    Ok(Json(posts))
}

/// POST /api/posts
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let post = post_service(&state).create(&actor, request).await?;
    Ok(Json(post))
}

/// PATCH /api/posts/:id
async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<EditPostRequest>,
) -> Result<Json<Post>, AppError> {
    let post = post_service(&state).edit(&actor, &id, request).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    post_service(&state).delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

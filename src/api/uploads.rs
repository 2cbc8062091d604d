//! Image upload endpoints
//!
//! Authenticated users upload images to the local blob store; stored
//! images are served back publicly by file name.

use axum::http::{HeaderMap, HeaderValue, header};
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, post},
};

use super::dto::UploadResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;

pub fn uploads_router() -> Router<AppState> {
    Router::new().route("/image", post(upload_image))
}

pub fn serve_router() -> Router<AppState> {
    Router::new().route("/uploads/images/:file", get(serve_image))
}

/// POST /api/uploads/image
///
/// Expects a multipart body with an `image` field.
async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field
            .content_type()
            .ok_or_else(|| {
                AppError::Validation("Image field must declare a content type.".to_string())
            })?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read image field: {e}")))?;

        let image_url = state.storage.store(&bytes, &content_type).await?;
        return Ok(Json(UploadResponse { image_url }));
    }

    Err(AppError::Validation("No image file provided".to_string()))
}

/// GET /uploads/images/:file
async fn serve_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), AppError> {
    let (bytes, content_type) = state.storage.open(&file).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    Ok((headers, bytes))
}

//! API layer
//!
//! HTTP handlers for:
//! - Registration / login
//! - Posts (public reads, authenticated mutations)
//! - User administration
//! - Image uploads

mod auth;
mod dto;
mod posts;
mod uploads;
mod users;

pub use dto::*;

pub use auth::auth_router;
pub use posts::posts_router;
pub use uploads::{serve_router, uploads_router};
pub use users::users_router;

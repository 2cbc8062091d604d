//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate validation, the authorization policy, and the
//! database.

mod identity;
mod posts;
mod users;

pub use identity::{IdentityService, LoginRequest, RegisterRequest, validate_login, validate_register};
pub use posts::{
    CreatePostRequest, EditPostRequest, PostService, format_calendar_date, validate_create,
    validate_edit,
};
pub use users::UserAdminService;

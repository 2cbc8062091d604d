//! Authentication
//!
//! Bearer-token resolution middleware plus password hashing and token
//! generation primitives.

mod middleware;
mod password;

pub use middleware::CurrentUser;
pub use password::{generate_token, hash_password, verify_dummy_password, verify_password};

//! API response DTOs
//!
//! Posts serialize directly from the data model; users go through
//! [`UserResponse`] so credentials never leave the API surface.

use serde::{Deserialize, Serialize};

use crate::data::{Role, User};

/// Token issued at registration and returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A user with credentials stripped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Result of an image upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_strips_credentials() {
        let user = User {
            id: "id".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "secret-hash".to_string(),
            token: "secret-token".to_string(),
            role: Role::User,
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("token").is_none());
    }
}

//! Identity service
//!
//! Registration, login, and bearer-token resolution. Request bodies are
//! loosely typed (every field optional, any JSON type) and go through an
//! explicit validation pass before anything touches the store.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::auth;
use crate::data::{Database, EntityId, Role, User};
use crate::error::AppError;

lazy_static::lazy_static! {
    static ref USERNAME_RE: regex::Regex = regex::Regex::new(r"^[a-z0-9_.]+$").unwrap();
    static ref EMAIL_RE: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap();
}

/// Usernames containing any of these are rejected outright.
const BLOCKED_WORDS: &[&str] = &["admin", "owner", "moderator", "support", "system", "root"];

const PASSWORD_SPECIAL_CHARS: &str = "@$!%*?&";

/// Raw registration request body
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<Value>,
}

/// Raw login request body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// Validated registration command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validated login command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

fn require_present<'a>(value: &'a Option<Value>, message: &str) -> Result<&'a Value, AppError> {
    value
        .as_ref()
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn require_string<'a>(value: &'a Value, message: &str) -> Result<&'a str, AppError> {
    value
        .as_str()
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn contains_blocked_word(username: &str) -> bool {
    BLOCKED_WORDS.iter().any(|word| username.contains(word))
}

/// Password strength: length ≥ 8; at least one lower, upper, digit, and
/// special character; no characters outside those classes.
fn password_is_strong(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIAL_CHARS.contains(c))
}

/// Parse a registration body: field presence, field types, password
/// confirmation, username length, username charset, username blocklist
///
/// The first failure wins. Email shape and password strength are checked
/// later because uniqueness lookups are interleaved between the stages.
fn parse_register_fields(request: &RegisterRequest) -> Result<RegisterCommand, AppError> {
    let username = require_present(&request.username, "Username is required.")?;
    let email = require_present(&request.email, "Email is required.")?;
    let password = require_present(&request.password, "Password is required.")?;
    let confirm_password =
        require_present(&request.confirm_password, "You must confirm your password.")?;

    let username = require_string(username, "Username must be a string.")?;
    let email = require_string(email, "Email must be a string.")?;
    let password = require_string(password, "Password must be a string.")?;
    let confirm_password = require_string(confirm_password, "Confirm password must be a string.")?;

    if password != confirm_password {
        return Err(AppError::Validation("Passwords are not matching.".to_string()));
    }

    let username_len = username.chars().count();
    if !(3..=50).contains(&username_len) {
        return Err(AppError::Validation(
            "Username must be between 3 and 50 characters long.".to_string(),
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "Username must include only lower-case letters, numbers, _ or .".to_string(),
        ));
    }
    if contains_blocked_word(username) {
        return Err(AppError::Validation(
            "Username includes a blacklisted word.".to_string(),
        ));
    }

    Ok(RegisterCommand {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

fn validate_email_shape(email: &str) -> Result<(), AppError> {
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation(
            "The provided email is invalid.".to_string(),
        ));
    }
    Ok(())
}

fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if !password_is_strong(password) {
        return Err(AppError::Validation(
            "The password must contain at least 8 characters, including at least one \
             uppercase letter, one lowercase letter, one number and one special character."
                .to_string(),
        ));
    }
    Ok(())
}

/// Full store-free validation pass over a registration body
///
/// Equivalent to the sequence [`IdentityService::register`] runs, minus
/// the uniqueness lookups.
pub fn validate_register(request: &RegisterRequest) -> Result<RegisterCommand, AppError> {
    let command = parse_register_fields(request)?;
    validate_email_shape(&command.email)?;
    validate_password_strength(&command.password)?;
    Ok(command)
}

/// Validate a login body into a command
pub fn validate_login(request: &LoginRequest) -> Result<LoginCommand, AppError> {
    let email = require_present(&request.email, "Email is required.")?;
    let password = require_present(&request.password, "Password is required.")?;

    let email = require_string(email, "Email must be a string.")?;
    let password = require_string(password, "Password must be a string.")?;

    Ok(LoginCommand {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Identity service
pub struct IdentityService {
    db: Arc<Database>,
    owner_id: String,
}

impl IdentityService {
    pub fn new(db: Arc<Database>, owner_id: String) -> Self {
        Self { db, owner_id }
    }

    /// Register a new user
    ///
    /// Validation order, first failure wins: field presence and types,
    /// password confirmation, username shape and blocklist, username
    /// uniqueness, email shape, email uniqueness, password strength.
    /// On success the stored bearer token is returned.
    pub async fn register(&self, request: RegisterRequest) -> Result<String, AppError> {
        let command = parse_register_fields(&request)?;

        if self
            .db
            .get_user_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already in use.".to_string()));
        }

        validate_email_shape(&command.email)?;
        if self.db.get_user_by_email(&command.email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use.".to_string()));
        }

        validate_password_strength(&command.password)?;

        let id = EntityId::new().0;
        let role = if id == self.owner_id {
            Role::Owner
        } else {
            Role::User
        };

        let user = User {
            id,
            username: command.username,
            email: command.email,
            password_hash: auth::hash_password(&command.password)?,
            token: auth::generate_token(),
            role,
        };

        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user.token)
    }

    /// Log a user in
    ///
    /// Returns the token issued at registration. An unknown email and a
    /// wrong password produce the identical error: both paths verify one
    /// hash and return the same generic message.
    pub async fn login(&self, request: LoginRequest) -> Result<String, AppError> {
        let command = validate_login(&request)?;

        let user = self.db.get_user_by_email(&command.email).await?;

        match user {
            Some(user) => {
                if auth::verify_password(&command.password, &user.password_hash) {
                    Ok(user.token)
                } else {
                    Err(AppError::InvalidCredentials)
                }
            }
            None => {
                auth::verify_dummy_password(&command.password);
                Err(AppError::InvalidCredentials)
            }
        }
    }

    /// Resolve a bearer token back to its user
    ///
    /// Exposed for the request-authentication middleware.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.db.get_user_by_token(token).await
    }
}

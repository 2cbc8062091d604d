//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs; ULIDs are roughly time-ordered, so
//! descending-id order approximates reverse-chronological order.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Role
// =============================================================================

/// User role
///
/// `Owner` is normally held only by the account whose id matches the
/// configured owner identifier, but admins/owners may escalate other
/// accounts. Role is an orthogonal attribute of a user, not a lifecycle
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Parse a role string; unknown values yield `None`
    ///
    /// An unknown role is invalid input, not an authorization failure.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Elevated roles that may moderate content and manage users
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// `password_hash` and `token` are credentials and must be stripped
/// before a user leaves the API surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// One-way argon2 hash of the password
    pub password_hash: String,
    /// Opaque bearer credential, generated once at registration
    /// (login returns this same token, there is no rotation)
    pub token: String,
    pub role: Role,
}

// =============================================================================
// Post
// =============================================================================

/// Denormalized author snapshot captured at post creation
///
/// Not a live reference: renaming a user never changes the byline on
/// existing posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub username: String,
}

/// Content block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// One ordered, typed segment of a post's body
///
/// A value type embedded in the post; it has no identity beyond its
/// position. `content` is raw text for `text` blocks and a URL/path for
/// `image` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    /// Render order; not unique, ties preserve insertion order
    #[serde(default)]
    pub position: i64,
}

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    /// Plain string body kept for single-block posts predating blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    /// Human-readable calendar date (e.g. "May 3, 2024"), never mutated
    pub created_at: String,
    pub author: AuthorRef,
}

impl Post {
    /// Sort blocks by position ascending
    ///
    /// `sort_by_key` is stable, so blocks with equal positions keep their
    /// insertion order.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|block| block.position);
    }
}

//! Post lifecycle service
//!
//! Validated, authorized mutations over the post store. Bodies are loosely
//! typed and pass through explicit validation producing typed commands;
//! block order is fixed once at creation (stable sort by position).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::data::{AuthorRef, BlockKind, ContentBlock, Database, EntityId, Post, Role, User};
use crate::error::AppError;
use crate::policy::{Deny, Policy};

const MAX_TITLE_CHARS: usize = 50;

/// Raw post creation request body
#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<Value>,
    pub content: Option<Value>,
    #[serde(rename = "coverImageUrl")]
    pub cover_image_url: Option<Value>,
    pub blocks: Option<Value>,
}

/// Raw post edit request body
#[derive(Debug, Default, Deserialize)]
pub struct EditPostRequest {
    pub content: Option<Value>,
}

/// Validated post creation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub legacy_content: Option<String>,
    pub cover_image_url: Option<String>,
    pub blocks: Vec<ContentBlock>,
}

/// Format an instant as a human-readable calendar date, e.g. "May 3, 2024"
pub fn format_calendar_date(instant: DateTime<Utc>) -> String {
    instant.format("%B %-d, %Y").to_string()
}

fn deny_to_error(deny: Deny) -> AppError {
    match deny {
        Deny::Forbidden => AppError::Forbidden,
        Deny::ProtectedAccount => {
            AppError::ProtectedAccount("Operation targets a protected account.".to_string())
        }
    }
}

fn parse_block(value: &Value) -> Result<ContentBlock, AppError> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::Validation("Each block must be an object.".to_string()))?;

    let kind = match object.get("type").and_then(Value::as_str) {
        Some("text") => BlockKind::Text,
        Some("image") => BlockKind::Image,
        _ => {
            return Err(AppError::Validation(
                "Block type must be one of: text, image.".to_string(),
            ));
        }
    };

    let content = object
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("Block content must be a string.".to_string()))?;
    if content.is_empty() {
        return Err(AppError::Validation(
            "Block content must not be empty.".to_string(),
        ));
    }

    let position = match object.get("position") {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .ok_or_else(|| AppError::Validation("Block position must be a number.".to_string()))?,
    };

    Ok(ContentBlock {
        kind,
        content: content.to_string(),
        position,
    })
}

fn content_is_missing(content: &Option<Value>) -> bool {
    match content {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn blocks_are_missing(blocks: &Option<Value>) -> bool {
    match blocks {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Validate a post creation body into a command
///
/// Checks run in a fixed precedence, first failure wins: missing title,
/// missing content and blocks, wrong value types, blocks not an array,
/// per-block rules, title length.
pub fn validate_create(request: &CreatePostRequest) -> Result<NewPost, AppError> {
    let title = request
        .title
        .as_ref()
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::Validation("Title is required.".to_string()))?;

    if content_is_missing(&request.content) && blocks_are_missing(&request.blocks) {
        return Err(AppError::Validation(
            "Content or blocks are required.".to_string(),
        ));
    }

    let title = title
        .as_str()
        .ok_or_else(|| AppError::Validation("Title must be a string.".to_string()))?;

    let legacy_content = match &request.content {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Some(_) => {
            return Err(AppError::Validation("Content must be a string.".to_string()));
        }
    };

    let cover_image_url = match &request.cover_image_url {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(AppError::Validation(
                "Cover image URL must be a string.".to_string(),
            ));
        }
    };

    let blocks = match &request.blocks {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_block)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(AppError::Validation("Blocks must be an array.".to_string()));
        }
    };

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(
            "The title may not exceed 50 characters.".to_string(),
        ));
    }

    Ok(NewPost {
        title: title.to_string(),
        legacy_content,
        cover_image_url,
        blocks,
    })
}

/// Validate a post edit body: content must be a non-empty string
pub fn validate_edit(request: &EditPostRequest) -> Result<String, AppError> {
    let content = request
        .content
        .as_ref()
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::Validation("Content is required.".to_string()))?;

    let content = content
        .as_str()
        .ok_or_else(|| AppError::Validation("Content must be a string.".to_string()))?;
    if content.is_empty() {
        return Err(AppError::Validation("Content is required.".to_string()));
    }

    Ok(content.to_string())
}

/// Post lifecycle service
pub struct PostService {
    db: Arc<Database>,
    policy: Policy,
}

impl PostService {
    pub fn new(db: Arc<Database>, policy: Policy) -> Self {
        Self { db, policy }
    }

    /// Create a new post
    ///
    /// Snapshots the author from the actor, assigns a generated id, and
    /// stamps a formatted calendar date. Blocks are sorted by position
    /// before persisting so reads return them in render order.
    pub async fn create(&self, actor: &User, request: CreatePostRequest) -> Result<Post, AppError> {
        self.policy
            .allow_create_post(actor)
            .map_err(deny_to_error)?;

        let command = validate_create(&request)?;

        let mut post = Post {
            id: EntityId::new().0,
            title: command.title,
            legacy_content: command.legacy_content,
            cover_image_url: command.cover_image_url,
            blocks: command.blocks,
            created_at: format_calendar_date(Utc::now()),
            author: AuthorRef {
                id: actor.id.clone(),
                username: actor.username.clone(),
            },
        };
        post.sort_blocks();

        self.db.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, author = %post.author.username, "Post created");

        Ok(post)
    }

    /// Get post by ID
    pub async fn get(&self, id: &str) -> Result<Post, AppError> {
        self.db
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("There is no post with this id.".to_string()))
    }

    /// List all posts
    ///
    /// No pagination at this layer; paging the full list is a client
    /// concern.
    pub async fn list(&self) -> Result<Vec<Post>, AppError> {
        self.db.list_posts().await
    }

    /// Replace a post's legacy content field
    ///
    /// Structured blocks are not editable through this operation.
    pub async fn edit(&self, actor: &User, id: &str, request: EditPostRequest) -> Result<Post, AppError> {
        let content = validate_edit(&request)?;

        let post = self.get(id).await?;
        self.policy
            .allow_edit_post(actor, &post)
            .map_err(deny_to_error)?;

        self.db.update_post_content(&post.id, &content).await?;

        Ok(Post {
            legacy_content: Some(content),
            ..post
        })
    }

    /// Delete a post
    pub async fn delete(&self, actor: &User, id: &str) -> Result<(), AppError> {
        let post = self.get(id).await?;
        self.policy
            .allow_delete_post(actor, &post)
            .map_err(deny_to_error)?;

        self.db.delete_post(&post.id).await?;

        tracing::info!(post_id = %post.id, actor = %actor.username, "Post deleted");

        Ok(())
    }

    /// Posts authored by any user currently holding role `owner`,
    /// newest first (descending id approximates reverse-chronological)
    pub async fn owner_feed(&self) -> Result<Vec<Post>, AppError> {
        let owner_ids = self.db.list_user_ids_with_role(Role::Owner).await?;
        let posts = self.db.list_posts_by_authors(&owner_ids).await?;

        if posts.is_empty() {
            return Err(AppError::NotFound(
                "The owner has not published a post yet.".to_string(),
            ));
        }

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_value(kind: &str, content: &str, position: i64) -> Value {
        serde_json::json!({ "type": kind, "content": content, "position": position })
    }

    fn expect_validation_message(result: Result<NewPost, AppError>, expected: &str) {
        match result {
            Err(AppError::Validation(message)) => assert_eq!(message, expected),
            other => panic!("expected validation error {expected:?}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_legacy_content_post() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: Some(Value::from("hello world")),
            cover_image_url: None,
            blocks: None,
        };
        let command = validate_create(&request).unwrap();
        assert_eq!(command.legacy_content.as_deref(), Some("hello world"));
        assert!(command.blocks.is_empty());
    }

    #[test]
    fn accepts_block_post_without_legacy_content() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: Some(Value::from("/uploads/images/cover.png")),
            blocks: Some(Value::Array(vec![block_value("text", "hello", 0)])),
        };
        let command = validate_create(&request).unwrap();
        assert!(command.legacy_content.is_none());
        assert_eq!(command.blocks.len(), 1);
        assert_eq!(
            command.cover_image_url.as_deref(),
            Some("/uploads/images/cover.png")
        );
    }

    #[test]
    fn missing_title_fails_first() {
        let request = CreatePostRequest::default();
        expect_validation_message(validate_create(&request), "Title is required.");
    }

    #[test]
    fn empty_blocks_and_empty_content_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: Some(Value::from("")),
            cover_image_url: None,
            blocks: Some(Value::Array(Vec::new())),
        };
        expect_validation_message(validate_create(&request), "Content or blocks are required.");
    }

    #[test]
    fn missing_content_takes_precedence_over_bad_title_type() {
        let request = CreatePostRequest {
            title: Some(Value::from(42)),
            content: None,
            cover_image_url: None,
            blocks: None,
        };
        expect_validation_message(validate_create(&request), "Content or blocks are required.");
    }

    #[test]
    fn non_string_title_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from(42)),
            content: Some(Value::from("hello")),
            cover_image_url: None,
            blocks: None,
        };
        expect_validation_message(validate_create(&request), "Title must be a string.");
    }

    #[test]
    fn non_array_blocks_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::from("not-an-array")),
        };
        expect_validation_message(validate_create(&request), "Blocks must be an array.");
    }

    #[test]
    fn block_with_unknown_type_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::Array(vec![block_value("video", "x", 0)])),
        };
        expect_validation_message(
            validate_create(&request),
            "Block type must be one of: text, image.",
        );
    }

    #[test]
    fn block_with_empty_content_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::Array(vec![block_value("text", "", 0)])),
        };
        expect_validation_message(validate_create(&request), "Block content must not be empty.");
    }

    #[test]
    fn block_with_non_numeric_position_rejected() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::Array(vec![serde_json::json!({
                "type": "text",
                "content": "hello",
                "position": "first",
            })])),
        };
        expect_validation_message(validate_create(&request), "Block position must be a number.");
    }

    #[test]
    fn block_position_defaults_to_zero() {
        let request = CreatePostRequest {
            title: Some(Value::from("Hi")),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::Array(vec![serde_json::json!({
                "type": "text",
                "content": "hello",
            })])),
        };
        let command = validate_create(&request).unwrap();
        assert_eq!(command.blocks[0].position, 0);
    }

    #[test]
    fn long_title_fails_last() {
        // Per-block errors outrank title length.
        let request = CreatePostRequest {
            title: Some(Value::from("x".repeat(51))),
            content: None,
            cover_image_url: None,
            blocks: Some(Value::Array(vec![block_value("video", "x", 0)])),
        };
        expect_validation_message(
            validate_create(&request),
            "Block type must be one of: text, image.",
        );

        let request = CreatePostRequest {
            title: Some(Value::from("x".repeat(51))),
            content: Some(Value::from("hello")),
            cover_image_url: None,
            blocks: None,
        };
        expect_validation_message(
            validate_create(&request),
            "The title may not exceed 50 characters.",
        );
    }

    #[test]
    fn title_of_exactly_fifty_chars_accepted() {
        let request = CreatePostRequest {
            title: Some(Value::from("x".repeat(50))),
            content: Some(Value::from("hello")),
            cover_image_url: None,
            blocks: None,
        };
        assert!(validate_create(&request).is_ok());
    }

    #[test]
    fn edit_requires_non_empty_string_content() {
        assert!(matches!(
            validate_edit(&EditPostRequest { content: None }),
            Err(AppError::Validation(message)) if message == "Content is required."
        ));
        assert!(matches!(
            validate_edit(&EditPostRequest {
                content: Some(Value::from(""))
            }),
            Err(AppError::Validation(message)) if message == "Content is required."
        ));
        assert!(matches!(
            validate_edit(&EditPostRequest {
                content: Some(Value::from(5))
            }),
            Err(AppError::Validation(message)) if message == "Content must be a string."
        ));
        assert_eq!(
            validate_edit(&EditPostRequest {
                content: Some(Value::from("updated"))
            })
            .unwrap(),
            "updated"
        );
    }

    #[test]
    fn calendar_date_format() {
        let instant = chrono::DateTime::parse_from_rfc3339("2024-05-03T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_calendar_date(instant), "May 3, 2024");
    }
}

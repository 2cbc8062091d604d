//! SQLite database operations
//!
//! All database access goes through this module. Each request is an
//! independent unit of work against the shared pool; the only consistency
//! guarantee for concurrent writes to the same row is SQLite's per-row
//! atomicity (last write wins).

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;

use super::models::{AuthorRef, ContentBlock, Post, Role, User};
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    let role_str: String = row.try_get("role")?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("unknown role in users table: {role_str}"))
    })?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        token: row.try_get("token")?,
        role,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, AppError> {
    let blocks_json: String = row.try_get("blocks")?;
    let blocks: Vec<ContentBlock> = serde_json::from_str(&blocks_json).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("malformed blocks column in posts table: {e}"))
    })?;

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        legacy_content: row.try_get("legacy_content")?,
        cover_image_url: row.try_get("cover_image_url")?,
        blocks,
        created_at: row.try_get("created_at")?,
        author: AuthorRef {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
        },
    })
}

impl Database {
    /// Connect to SQLite database, creating file and schema if needed
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, token, role)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.token)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Resolve a bearer token back to its user
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// List all users, oldest first (ids are roughly time-ordered)
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Update a user's role
    pub async fn update_user_role(&self, id: &str, role: Role) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a user row
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// IDs of all users currently holding the given role
    pub async fn list_user_ids_with_role(&self, role: Role) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT id FROM users WHERE role = ? ORDER BY id ASC")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("id").map_err(AppError::from))
            .collect()
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        let blocks_json = serde_json::to_string(&post.blocks)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode blocks: {e}")))?;

        sqlx::query(
            "INSERT INTO posts
             (id, title, legacy_content, cover_image_url, blocks, created_at, author_id, author_username)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.legacy_content)
        .bind(&post.cover_image_url)
        .bind(&blocks_json)
        .bind(&post.created_at)
        .bind(&post.author.id)
        .bind(&post.author.username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    /// List all posts, oldest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query("SELECT * FROM posts ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// List posts by any of the given author ids, newest first
    pub async fn list_posts_by_authors(&self, author_ids: &[String]) -> Result<Vec<Post>, AppError> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; author_ids.len()].join(", ");
        let sql = format!(
            "SELECT * FROM posts WHERE author_id IN ({placeholders}) ORDER BY id DESC"
        );

        let mut query = sqlx::query(&sql);
        for author_id in author_ids {
            query = query.bind(author_id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(post_from_row).collect()
    }

    /// Replace the legacy content field of a post
    pub async fn update_post_content(&self, id: &str, content: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE posts SET legacy_content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a post row
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete all posts by the given author
    ///
    /// # Returns
    /// Number of posts removed
    pub async fn delete_posts_by_author(&self, author_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE author_id = ?")
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! User administration service
//!
//! Listing users, role changes, and user deletion with cascading removal
//! of the deleted user's posts.

use std::sync::Arc;

use crate::data::{Database, Role, User};
use crate::error::AppError;
use crate::policy::{Deny, Policy};

fn deny_to_error(deny: Deny) -> AppError {
    match deny {
        Deny::Forbidden => AppError::Forbidden,
        Deny::ProtectedAccount => {
            AppError::ProtectedAccount("Cannot modify the owner account.".to_string())
        }
    }
}

/// User administration service
pub struct UserAdminService {
    db: Arc<Database>,
    policy: Policy,
}

impl UserAdminService {
    pub fn new(db: Arc<Database>, policy: Policy) -> Self {
        Self { db, policy }
    }

    /// List all users
    ///
    /// Credentials are stripped at the API layer before serialization.
    pub async fn list(&self, actor: &User) -> Result<Vec<User>, AppError> {
        self.policy.allow_list_users(actor).map_err(deny_to_error)?;
        self.db.list_users().await
    }

    /// Change a user's role
    ///
    /// The role string is validated before the policy is consulted: an
    /// unknown role is invalid input, not an authorization failure.
    pub async fn change_role(
        &self,
        actor: &User,
        target_id: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let requested = Role::parse(role).ok_or_else(|| {
            AppError::InvalidRole("Invalid role. Must be one of: user, admin, owner".to_string())
        })?;

        let target = self
            .db
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        self.policy
            .allow_change_role(actor, &target, requested)
            .map_err(|deny| match deny {
                Deny::ProtectedAccount => AppError::ProtectedAccount(
                    "Cannot change the role of the owner.".to_string(),
                ),
                Deny::Forbidden => AppError::Forbidden,
            })?;

        self.db.update_user_role(&target.id, requested).await?;

        tracing::info!(
            target = %target.username,
            role = requested.as_str(),
            actor = %actor.username,
            "User role updated"
        );

        Ok(User {
            role: requested,
            ..target
        })
    }

    /// Delete a user and cascade-delete their posts
    ///
    /// Posts are removed first, then the user row. The two steps are
    /// sequential with no compensating transaction: a failure in between
    /// leaves a state that is recoverable by re-invoking the delete.
    pub async fn delete(&self, actor: &User, target_id: &str) -> Result<(), AppError> {
        let target = self
            .db
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        self.policy
            .allow_delete_user(actor, &target)
            .map_err(|deny| match deny {
                Deny::ProtectedAccount => {
                    AppError::ProtectedAccount("Cannot delete the owner account.".to_string())
                }
                Deny::Forbidden => AppError::Forbidden,
            })?;

        let removed_posts = self.db.delete_posts_by_author(&target.id).await?;
        self.db.delete_user(&target.id).await?;

        tracing::info!(
            target = %target.username,
            posts_removed = removed_posts,
            actor = %actor.username,
            "User deleted"
        );

        Ok(())
    }
}

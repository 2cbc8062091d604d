//! Authorization policy
//!
//! Pure decision functions over (actor, action, resource). No I/O and no
//! side effects: callers fetch actor and resource data first, then ask the
//! policy. The configured owner identifier is injected once at startup and
//! passed into every decision through [`Policy`].
//!
//! Rule precedence:
//! 1. The configured owner may do everything, except moving its own role
//!    away from `owner` or deleting its own account.
//! 2. Role changes and deletions targeting the configured owner record are
//!    denied regardless of caller privilege.
//! 3. User administration (list/role/delete) requires admin or owner role.
//! 4. Post reads are public and never reach the policy.
//! 5. Any authenticated actor may create posts.
//! 6. A specific post may be edited or deleted by its author or by
//!    admin/owner (the chosen resolution of the historically inconsistent
//!    gate; see DESIGN.md).

use crate::data::{Post, Role, User};

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    /// Authenticated but insufficient privilege
    Forbidden,
    /// Operation targets the immutable owner record
    ProtectedAccount,
}

/// Policy decision result
pub type Decision = Result<(), Deny>;

/// Authorization policy over the configured owner identifier
#[derive(Debug, Clone)]
pub struct Policy {
    owner_id: String,
}

impl Policy {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }

    /// Whether the given user id is the configured owner
    pub fn is_configured_owner(&self, user_id: &str) -> bool {
        user_id == self.owner_id
    }

    fn has_staff_privilege(&self, actor: &User) -> bool {
        actor.role.is_staff() || self.is_configured_owner(&actor.id)
    }

    /// May the actor list all users?
    pub fn allow_list_users(&self, actor: &User) -> Decision {
        if self.has_staff_privilege(actor) {
            Ok(())
        } else {
            Err(Deny::Forbidden)
        }
    }

    /// May the actor set the target user's role to `requested`?
    ///
    /// The requested role must already have been validated; an unknown role
    /// string is invalid input, not a policy question.
    pub fn allow_change_role(&self, actor: &User, target: &User, requested: Role) -> Decision {
        if self.is_configured_owner(&actor.id) {
            // The owner record's role is frozen even against itself.
            if self.is_configured_owner(&target.id) && requested != Role::Owner {
                return Err(Deny::ProtectedAccount);
            }
            return Ok(());
        }

        if self.is_configured_owner(&target.id) {
            return Err(Deny::ProtectedAccount);
        }

        if actor.role.is_staff() {
            Ok(())
        } else {
            Err(Deny::Forbidden)
        }
    }

    /// May the actor delete the target user?
    pub fn allow_delete_user(&self, actor: &User, target: &User) -> Decision {
        if self.is_configured_owner(&target.id) {
            // Protects the owner record even from itself.
            return Err(Deny::ProtectedAccount);
        }

        if self.has_staff_privilege(actor) {
            Ok(())
        } else {
            Err(Deny::Forbidden)
        }
    }

    /// May the actor create a post?
    ///
    /// Any authenticated actor may; the middleware has already rejected
    /// anonymous callers.
    pub fn allow_create_post(&self, _actor: &User) -> Decision {
        Ok(())
    }

    /// May the actor edit the post's content?
    pub fn allow_edit_post(&self, actor: &User, post: &Post) -> Decision {
        self.allow_post_mutation(actor, post)
    }

    /// May the actor delete the post?
    pub fn allow_delete_post(&self, actor: &User, post: &Post) -> Decision {
        self.allow_post_mutation(actor, post)
    }

    fn allow_post_mutation(&self, actor: &User, post: &Post) -> Decision {
        if self.has_staff_privilege(actor) || post.author.id == actor.id {
            Ok(())
        } else {
            Err(Deny::Forbidden)
        }
    }
}

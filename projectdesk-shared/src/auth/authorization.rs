/// Access policy
///
/// Every ownership check in the API goes through [`can_access`]. Handlers
/// describe the target as a [`Resource`] (carrying just the ids the rule
/// needs) and the intended [`Action`].
///
/// # Rules
///
/// Administrators pass every check. For everyone else:
///
/// | Resource | Read | Update | Delete | ManageMembers | Complete |
/// |---|---|---|---|---|---|
/// | User | self | self | never | never | never |
/// | Project | anyone | manager | manager | manager | never |
/// | Task | anyone | manager, assignee | manager | never | manager, assignee |
///
/// "manager" on a task means the manager of the project owning the task.
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::authorization::{can_access, Action, Resource};
/// use projectdesk_shared::auth::middleware::AuthContext;
/// use projectdesk_shared::models::user::UserRole;
///
/// let actor = AuthContext {
///     user_id: 2,
///     name: "Ana".to_string(),
///     email: "ana@example.com".to_string(),
///     role: UserRole::User,
/// };
///
/// assert!(can_access(&actor, &Resource::Project { manager_id: 2 }, Action::Delete));
/// assert!(!can_access(&actor, &Resource::User { id: 3 }, Action::Read));
/// ```

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller may not perform this action on this resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// What is being accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A user account or its derived data (projects, tasks, stats)
    User { id: i64 },

    /// A project, identified by who manages it
    Project { manager_id: i64 },

    /// A task, with its project's manager and current assignee
    Task {
        project_manager_id: i64,
        assigned_to: Option<i64>,
    },
}

/// What the caller wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
    ManageMembers,
    Complete,
}

/// Decides whether `actor` may perform `action` on `resource`
pub fn can_access(actor: &AuthContext, resource: &Resource, action: Action) -> bool {
    if actor.is_admin() {
        return true;
    }

    match (*resource, action) {
        (Resource::User { id }, Action::Read | Action::Update) => id == actor.user_id,
        (Resource::User { .. }, _) => false,

        (Resource::Project { .. }, Action::Read) => true,
        (Resource::Project { manager_id }, Action::Update | Action::Delete | Action::ManageMembers) => {
            manager_id == actor.user_id
        }
        (Resource::Project { .. }, Action::Complete) => false,

        (Resource::Task { .. }, Action::Read) => true,
        (
            Resource::Task {
                project_manager_id,
                assigned_to,
            },
            Action::Update | Action::Complete,
        ) => project_manager_id == actor.user_id || assigned_to == Some(actor.user_id),
        (Resource::Task { project_manager_id, .. }, Action::Delete) => {
            project_manager_id == actor.user_id
        }
        (Resource::Task { .. }, Action::ManageMembers) => false,
    }
}

/// [`can_access`] as a `Result`, for use with `?` in handlers
pub fn require_access(
    actor: &AuthContext,
    resource: &Resource,
    action: Action,
) -> Result<(), AuthzError> {
    if can_access(actor, resource, action) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = actor.user_id,
            resource = ?resource,
            action = ?action,
            "Access denied"
        );
        Err(AuthzError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn user(id: i64) -> AuthContext {
        AuthContext {
            user_id: id,
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            role: UserRole::User,
        }
    }

    fn admin(id: i64) -> AuthContext {
        AuthContext {
            role: UserRole::Admin,
            ..user(id)
        }
    }

    #[test]
    fn test_admin_passes_everything() {
        let actor = admin(1);
        let resources = [
            Resource::User { id: 9 },
            Resource::Project { manager_id: 9 },
            Resource::Task {
                project_manager_id: 9,
                assigned_to: None,
            },
        ];
        let actions = [
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::ManageMembers,
            Action::Complete,
        ];

        for resource in &resources {
            for action in actions {
                assert!(can_access(&actor, resource, action));
            }
        }
    }

    #[test]
    fn test_user_resource_is_self_only() {
        let actor = user(2);

        assert!(can_access(&actor, &Resource::User { id: 2 }, Action::Read));
        assert!(can_access(&actor, &Resource::User { id: 2 }, Action::Update));
        assert!(!can_access(&actor, &Resource::User { id: 3 }, Action::Read));
        assert!(!can_access(&actor, &Resource::User { id: 3 }, Action::Update));
        // Deleting accounts is an admin operation, even your own
        assert!(!can_access(&actor, &Resource::User { id: 2 }, Action::Delete));
    }

    #[test]
    fn test_project_manager_rules() {
        let manager = user(5);
        let other = user(6);
        let project = Resource::Project { manager_id: 5 };

        assert!(can_access(&other, &project, Action::Read));

        for action in [Action::Update, Action::Delete, Action::ManageMembers] {
            assert!(can_access(&manager, &project, action));
            assert!(!can_access(&other, &project, action));
        }
    }

    #[test]
    fn test_task_assignee_can_update_but_not_delete() {
        let task = Resource::Task {
            project_manager_id: 5,
            assigned_to: Some(7),
        };
        let assignee = user(7);
        let manager = user(5);
        let stranger = user(8);

        assert!(can_access(&assignee, &task, Action::Update));
        assert!(can_access(&assignee, &task, Action::Complete));
        assert!(!can_access(&assignee, &task, Action::Delete));

        assert!(can_access(&manager, &task, Action::Delete));
        assert!(can_access(&manager, &task, Action::Complete));

        assert!(can_access(&stranger, &task, Action::Read));
        assert!(!can_access(&stranger, &task, Action::Update));
        assert!(!can_access(&stranger, &task, Action::Complete));
    }

    #[test]
    fn test_unassigned_task_only_manager() {
        let task = Resource::Task {
            project_manager_id: 5,
            assigned_to: None,
        };

        assert!(can_access(&user(5), &task, Action::Update));
        assert!(!can_access(&user(6), &task, Action::Update));
    }

    #[test]
    fn test_require_access_maps_to_error() {
        let actor = user(1);
        assert!(require_access(&actor, &Resource::User { id: 1 }, Action::Read).is_ok());
        assert!(matches!(
            require_access(&actor, &Resource::User { id: 2 }, Action::Read),
            Err(AuthzError::NotAuthorized)
        ));
    }
}

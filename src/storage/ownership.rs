// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for record mutations.
//!
//! Runs after the role gate and after the record has been fetched, right
//! before the mutation. Roles never bypass these rules: an `OWNER` of the
//! workspace still cannot edit a task they neither wrote nor were assigned.
//!
//! | Mutation | Allowed when |
//! |----------|--------------|
//! | create | always (caller becomes the author) |
//! | read | always (role gate decides) |
//! | update | caller is the author or the assignee |
//! | delete | caller is the author |
//! | bulk delete | rows not authored by the caller, or outside the parent scope, are skipped |

use crate::auth::Principal;

/// A record carrying author/assignee ownership fields.
pub trait OwnedResource {
    /// Name used in denial messages.
    fn resource_kind(&self) -> &'static str;

    /// Creator of the record; never changes after creation.
    fn author_id(&self) -> &str;

    /// Current assignee, if any.
    fn assignee_id(&self) -> Option<&str>;

    /// Parent scope (e.g. project) the record belongs to.
    fn parent_id(&self) -> &str;
}

/// Kind of mutation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    #[error("You do not have permission to update this {0}")]
    UpdateDenied(&'static str),

    #[error("Only the author can delete this {0}")]
    DeleteDenied(&'static str),
}

/// Stateless ownership rules.
pub struct ResourceAuthorizer;

impl ResourceAuthorizer {
    /// Decide whether `principal` may apply `mutation` to `record`.
    pub fn authorize<R: OwnedResource + ?Sized>(
        principal: &Principal,
        mutation: Mutation,
        record: &R,
    ) -> Result<(), OwnershipError> {
        let result = match mutation {
            Mutation::Create | Mutation::Read => Ok(()),
            Mutation::Update => {
                if Self::is_author(principal, record) || Self::is_assignee(principal, record) {
                    Ok(())
                } else {
                    Err(OwnershipError::UpdateDenied(record.resource_kind()))
                }
            }
            Mutation::Delete if Self::is_author(principal, record) => Ok(()),
            Mutation::Delete => Err(OwnershipError::DeleteDenied(record.resource_kind())),
        };

        if let Err(e) = &result {
            tracing::warn!(
                user_id = %principal.user_id,
                mutation = ?mutation,
                error = %e,
                "Ownership check failed"
            );
        }

        result
    }

    /// Author identity stamped into a record being created.
    pub fn creator_id(principal: &Principal) -> &str {
        &principal.user_id
    }

    /// Row filter for bulk deletion by `principal` inside `parent_id`.
    pub fn bulk_delete_scope(principal: &Principal, parent_id: &str) -> BulkDeleteScope {
        BulkDeleteScope {
            author_id: principal.user_id.clone(),
            parent_id: parent_id.to_string(),
        }
    }

    fn is_author<R: OwnedResource + ?Sized>(principal: &Principal, record: &R) -> bool {
        record.author_id() == principal.user_id
    }

    fn is_assignee<R: OwnedResource + ?Sized>(principal: &Principal, record: &R) -> bool {
        record.assignee_id() == Some(principal.user_id.as_str())
    }
}

/// Same predicate as single delete (caller is the author), applied as a
/// silent filter instead of a hard denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteScope {
    pub author_id: String,
    pub parent_id: String,
}

impl BulkDeleteScope {
    pub fn matches<R: OwnedResource + ?Sized>(&self, record: &R) -> bool {
        record.author_id() == self.author_id && record.parent_id() == self.parent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    struct TestResource {
        author: String,
        assignee: Option<String>,
        parent: String,
    }

    impl OwnedResource for TestResource {
        fn resource_kind(&self) -> &'static str {
            "task"
        }

        fn author_id(&self) -> &str {
            &self.author
        }

        fn assignee_id(&self) -> Option<&str> {
            self.assignee.as_deref()
        }

        fn parent_id(&self) -> &str {
            &self.parent
        }
    }

    fn record() -> TestResource {
        TestResource {
            author: "A".to_string(),
            assignee: Some("B".to_string()),
            parent: "P".to_string(),
        }
    }

    fn caller(user_id: &str, role: Role) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            member_id: format!("member-{user_id}"),
            role,
        }
    }

    #[test]
    fn update_allowed_for_author_and_assignee() {
        let r = record();
        assert!(ResourceAuthorizer::authorize(&caller("A", Role::Member), Mutation::Update, &r).is_ok());
        assert!(ResourceAuthorizer::authorize(&caller("B", Role::Member), Mutation::Update, &r).is_ok());
        assert_eq!(
            ResourceAuthorizer::authorize(&caller("X", Role::Member), Mutation::Update, &r),
            Err(OwnershipError::UpdateDenied("task"))
        );
    }

    #[test]
    fn unassigned_record_only_updatable_by_author() {
        let mut r = record();
        r.assignee = None;
        assert!(ResourceAuthorizer::authorize(&caller("A", Role::Member), Mutation::Update, &r).is_ok());
        assert!(ResourceAuthorizer::authorize(&caller("B", Role::Member), Mutation::Update, &r).is_err());
    }

    #[test]
    fn delete_allowed_only_for_author() {
        let r = record();
        assert!(ResourceAuthorizer::authorize(&caller("A", Role::Member), Mutation::Delete, &r).is_ok());
        assert_eq!(
            ResourceAuthorizer::authorize(&caller("B", Role::Member), Mutation::Delete, &r),
            Err(OwnershipError::DeleteDenied("task"))
        );
        assert!(ResourceAuthorizer::authorize(&caller("X", Role::Member), Mutation::Delete, &r).is_err());
    }

    #[test]
    fn roles_do_not_bypass_ownership() {
        let r = record();
        let owner = caller("X", Role::Owner);
        assert!(ResourceAuthorizer::authorize(&owner, Mutation::Update, &r).is_err());
        assert!(ResourceAuthorizer::authorize(&owner, Mutation::Delete, &r).is_err());
    }

    #[test]
    fn create_and_read_are_unrestricted() {
        let r = record();
        let stranger = caller("X", Role::Member);
        assert!(ResourceAuthorizer::authorize(&stranger, Mutation::Read, &r).is_ok());
        assert!(ResourceAuthorizer::authorize(&stranger, Mutation::Create, &r).is_ok());
        assert_eq!(ResourceAuthorizer::creator_id(&stranger), "X");
    }

    #[test]
    fn bulk_scope_requires_author_and_parent() {
        let r = record();

        let scope = ResourceAuthorizer::bulk_delete_scope(&caller("A", Role::Member), "P");
        assert!(scope.matches(&r));

        let other_parent = ResourceAuthorizer::bulk_delete_scope(&caller("A", Role::Member), "Q");
        assert!(!other_parent.matches(&r));

        let assignee = ResourceAuthorizer::bulk_delete_scope(&caller("B", Role::Member), "P");
        assert!(!assignee.matches(&r));
    }

    #[test]
    fn denial_messages_are_stable() {
        assert_eq!(
            OwnershipError::UpdateDenied("task").to_string(),
            "You do not have permission to update this task"
        );
        assert_eq!(
            OwnershipError::DeleteDenied("task").to_string(),
            "Only the author can delete this task"
        );
    }
}

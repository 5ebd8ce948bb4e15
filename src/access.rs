//! Effective-permission resolution.
//!
//! One resolver answers "what may this user do on this resource" for every
//! handler, aggregating group grants across the organization -> group ->
//! resource chain with the creator override. The functions are pure reads
//! over registry snapshots; callers fetch fresh snapshots per request and
//! evaluate a check and the mutation it authorizes against the same
//! snapshot.

use serde::Serialize;

use crate::board::BoardRecord;
use crate::directory::{DirectoryRegistry, GroupRole, OrgRole};
use crate::error::{Error, Result};
use crate::grant::GrantRegistry;
use crate::permission::{meets, PermissionLevel};
use crate::project::ProjectRecord;

/// What the resolver needs to know about a resource: its identity, the
/// organization that owns it, and its creator.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub id: String,
    pub org_id: String,
    pub creator: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Board,
}

impl From<&ProjectRecord> for ResourceView {
    fn from(project: &ProjectRecord) -> Self {
        ResourceView {
            id: project.id.clone(),
            org_id: project.org_id.clone(),
            creator: project.creator.clone(),
            kind: ResourceKind::Project,
        }
    }
}

impl From<&BoardRecord> for ResourceView {
    fn from(board: &BoardRecord) -> Self {
        ResourceView {
            id: board.id.clone(),
            org_id: board.org_id.clone(),
            creator: board.creator.clone(),
            kind: ResourceKind::Board,
        }
    }
}

/// Whether the user holds any membership in the organization. Handlers
/// check this as a precondition independently of group grants.
pub fn is_org_member(directory: &DirectoryRegistry, org_id: &str, user: &str) -> bool {
    directory
        .find_org(org_id)
        .map(|org| org.is_member(user))
        .unwrap_or(false)
}

/// The user's effective permission on a resource, or `None` for no access.
///
/// The creator short-circuits to admin before anything else is consulted:
/// no grant manipulation can revoke it. Otherwise the result is the maximum
/// level among grants whose group the user belongs to, restricted to groups
/// of the owning organization - and only if the user is a member of that
/// organization at all, so a group grant alone confers nothing.
pub fn resolve(
    directory: &DirectoryRegistry,
    grants: &GrantRegistry,
    user: &str,
    resource: &ResourceView,
) -> Option<PermissionLevel> {
    let user = user.trim();
    if user.is_empty() {
        return None;
    }

    if resource.creator == user {
        return Some(PermissionLevel::Admin);
    }

    let org = directory.find_org(&resource.org_id)?;
    if !org.is_member(user) {
        return None;
    }

    org.groups_of(user)
        .iter()
        .filter_map(|group| grants.find(&resource.id, &group.id))
        .map(|grant| grant.level)
        .max()
}

/// Convenience wrapper over [`resolve`]: does the user's effective level
/// satisfy `required`? `None` compares below `read`.
pub fn authorize_at_least(
    directory: &DirectoryRegistry,
    grants: &GrantRegistry,
    user: &str,
    resource: &ResourceView,
    required: PermissionLevel,
) -> bool {
    meets(resolve(directory, grants, user, resource), required)
}

/// Like [`authorize_at_least`] but producing the `Forbidden` error handlers
/// propagate. The resource is already looked up by this point, so an
/// absence was already reported as not-found, never as forbidden.
pub fn require_at_least(
    directory: &DirectoryRegistry,
    grants: &GrantRegistry,
    user: &str,
    resource: &ResourceView,
    required: PermissionLevel,
) -> Result<()> {
    if authorize_at_least(directory, grants, user, resource, required) {
        return Ok(());
    }
    Err(Error::Forbidden {
        user: user.to_string(),
        resource: resource.id.clone(),
        required: required.to_string(),
    })
}

/// False iff the user is the sole remaining admin of the group. Evaluated
/// by mutation paths against the same snapshot the change applies to.
pub fn can_demote_or_remove_group_admin(
    directory: &DirectoryRegistry,
    group_id: &str,
    user: &str,
) -> Result<bool> {
    let (_, group) = directory
        .find_group(group_id)
        .ok_or_else(|| Error::GroupNotFound(group_id.to_string()))?;

    let is_admin = group
        .member(user)
        .map(|m| m.role == GroupRole::Admin)
        .unwrap_or(false);
    if !is_admin {
        return Ok(true);
    }
    Ok(group.admin_count() > 1)
}

/// False iff the user is the sole remaining owner of the organization.
pub fn can_demote_or_remove_org_owner(
    directory: &DirectoryRegistry,
    org_id: &str,
    user: &str,
) -> Result<bool> {
    let org = directory
        .find_org(org_id)
        .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))?;

    let is_owner = org
        .member(user)
        .map(|m| m.role == OrgRole::Owner)
        .unwrap_or(false);
    if !is_owner {
        return Ok(true);
    }
    Ok(org.owner_count() > 1)
}

/// Whether the user may administer the organization itself (create groups,
/// manage memberships, grant access). Owners and org admins qualify.
pub fn is_org_admin(directory: &DirectoryRegistry, org_id: &str, user: &str) -> bool {
    directory
        .find_org(org_id)
        .and_then(|org| org.member(user))
        .map(|m| matches!(m.role, OrgRole::Owner | OrgRole::Admin))
        .unwrap_or(false)
}

/// Whether the user may administer a resource: effective admin on the
/// resource itself, or an owner/admin of the owning organization. This is
/// the handler-level check for grant management and structural changes;
/// [`resolve`] itself never consults org roles.
pub fn can_administer(
    directory: &DirectoryRegistry,
    grants: &GrantRegistry,
    user: &str,
    resource: &ResourceView,
) -> bool {
    is_org_admin(directory, &resource.org_id, user)
        || authorize_at_least(directory, grants, user, resource, PermissionLevel::Admin)
}

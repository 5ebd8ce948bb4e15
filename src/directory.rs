//! Organizations, memberships, and groups.
//!
//! The directory is the identity/membership side of the platform: who is in
//! which organization with which role, and which groups exist inside each
//! organization. Grants attach to groups (see `grant`); the resolver reads
//! the directory and the grants together.
//!
//! Mutations run through [`DirectoryStore`] as a single locked
//! read-validate-write cycle, so the last-owner and last-admin guards are
//! evaluated against the same snapshot that the mutation is applied to.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access;
use crate::error::{Error, Result};
use crate::ident::{self, GROUP_PREFIX, ORG_PREFIX};
use crate::storage::Storage;

/// Role of a user inside an organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(OrgRole::Owner),
            "admin" => Ok(OrgRole::Admin),
            "member" => Ok(OrgRole::Member),
            other => Err(Error::InvalidArgument(format!(
                "unknown organization role '{other}' (expected owner|admin|member)"
            ))),
        }
    }
}

/// Role of a user inside a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            other => Err(Error::InvalidArgument(format!(
                "unknown group role '{other}' (expected admin|member)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgMemberRecord {
    pub user: String,
    pub role: OrgRole,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMemberRecord {
    pub user: String,
    pub role: GroupRole,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    pub members: Vec<GroupMemberRecord>,
    pub created_at: DateTime<Utc>,
}

impl GroupRecord {
    pub fn member(&self, user: &str) -> Option<&GroupMemberRecord> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == GroupRole::Admin)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgRecord {
    pub id: String,
    pub name: String,
    pub members: Vec<OrgMemberRecord>,
    pub groups: Vec<GroupRecord>,
    pub created_at: DateTime<Utc>,
}

impl OrgRecord {
    pub fn member(&self, user: &str) -> Option<&OrgMemberRecord> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.member(user).is_some()
    }

    pub fn owner_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == OrgRole::Owner)
            .count()
    }

    pub fn group(&self, group_id: &str) -> Option<&GroupRecord> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Groups in this organization that `user` currently belongs to, any role.
    pub fn groups_of(&self, user: &str) -> Vec<&GroupRecord> {
        self.groups
            .iter()
            .filter(|g| g.member(user).is_some())
            .collect()
    }
}

/// The whole membership directory: every organization with its members and
/// groups. This is the snapshot the permission resolver reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryRegistry {
    pub orgs: Vec<OrgRecord>,
}

impl DirectoryRegistry {
    pub fn find_org(&self, org_id: &str) -> Option<&OrgRecord> {
        self.orgs.iter().find(|o| o.id == org_id)
    }

    pub fn find_org_mut(&mut self, org_id: &str) -> Option<&mut OrgRecord> {
        self.orgs.iter_mut().find(|o| o.id == org_id)
    }

    /// The organization owning a group, plus the group itself.
    pub fn find_group(&self, group_id: &str) -> Option<(&OrgRecord, &GroupRecord)> {
        for org in &self.orgs {
            if let Some(group) = org.group(group_id) {
                return Some((org, group));
            }
        }
        None
    }

    pub fn org_ids(&self) -> Vec<&str> {
        self.orgs.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn group_ids(&self) -> Vec<&str> {
        self.orgs
            .iter()
            .flat_map(|o| o.groups.iter().map(|g| g.id.as_str()))
            .collect()
    }

    /// Structural invariants the registry must satisfy after any mutation:
    /// unique ids, one membership per (org, user), at least one owner per
    /// org, at least one admin in any non-empty group.
    pub fn validate(&self) -> Result<()> {
        let mut org_ids = HashSet::new();
        let mut group_ids = HashSet::new();

        for org in &self.orgs {
            if !org_ids.insert(org.id.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate organization id: {}",
                    org.id
                )));
            }

            let mut users = HashSet::new();
            for member in &org.members {
                if !users.insert(member.user.as_str()) {
                    return Err(Error::InvariantViolation(format!(
                        "duplicate membership for {} in {}",
                        member.user, org.id
                    )));
                }
            }

            if !org.members.is_empty() && org.owner_count() == 0 {
                return Err(Error::InvariantViolation(format!(
                    "organization {} must retain at least one owner",
                    org.id
                )));
            }

            for group in &org.groups {
                if !group_ids.insert(group.id.as_str()) {
                    return Err(Error::InvariantViolation(format!(
                        "duplicate group id: {}",
                        group.id
                    )));
                }

                let mut members = HashSet::new();
                for member in &group.members {
                    if !members.insert(member.user.as_str()) {
                        return Err(Error::InvariantViolation(format!(
                            "duplicate membership for {} in {}",
                            member.user, group.id
                        )));
                    }
                }

                if !group.members.is_empty() && group.admin_count() == 0 {
                    return Err(Error::InvariantViolation(format!(
                        "group {} must retain at least one admin",
                        group.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Store for the membership directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    storage: Storage,
}

impl DirectoryStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn snapshot(&self) -> Result<DirectoryRegistry> {
        self.storage.read_or_default(&self.storage.directory_file())
    }

    fn update<R>(&self, f: impl FnOnce(&mut DirectoryRegistry) -> Result<R>) -> Result<R> {
        let path = self.storage.directory_file();
        self.storage.update(&path, |registry: &mut DirectoryRegistry| {
            let result = f(registry)?;
            registry.validate()?;
            Ok(result)
        })
    }

    // =========================================================================
    // Organizations
    // =========================================================================

    /// Create an organization; the creator becomes its first owner.
    pub fn create_org(&self, name: &str, creator: &str) -> Result<OrgRecord> {
        let name = require_non_empty(name, "organization name")?;
        let creator = require_non_empty(creator, "user")?;
        self.update(|registry| {
            let existing: HashSet<String> =
                registry.orgs.iter().map(|o| o.id.clone()).collect();
            let id = ident::generate_id(ORG_PREFIX, &existing);
            let now = Utc::now();
            let record = OrgRecord {
                id: id.clone(),
                name: name.to_string(),
                members: vec![OrgMemberRecord {
                    user: creator.to_string(),
                    role: OrgRole::Owner,
                    added_at: now,
                }],
                groups: Vec::new(),
                created_at: now,
            };
            registry.orgs.push(record.clone());
            Ok(record)
        })
    }

    pub fn get_org(&self, org_id: &str) -> Result<OrgRecord> {
        let registry = self.snapshot()?;
        registry
            .find_org(org_id)
            .cloned()
            .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))
    }

    pub fn list_orgs(&self) -> Result<Vec<OrgRecord>> {
        Ok(self.snapshot()?.orgs)
    }

    pub fn resolve_org_id(&self, input: &str) -> Result<String> {
        let registry = self.snapshot()?;
        ident::resolve_id(input, registry.org_ids())?
            .ok_or_else(|| Error::OrgNotFound(input.trim().to_string()))
    }

    pub fn resolve_group_id(&self, input: &str) -> Result<String> {
        let registry = self.snapshot()?;
        ident::resolve_id(input, registry.group_ids())?
            .ok_or_else(|| Error::GroupNotFound(input.trim().to_string()))
    }

    // =========================================================================
    // Organization memberships
    // =========================================================================

    pub fn add_org_member(&self, org_id: &str, user: &str, role: OrgRole) -> Result<()> {
        let user = require_non_empty(user, "user")?;
        self.update(|registry| {
            let org = registry
                .find_org_mut(org_id)
                .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))?;
            if org.is_member(user) {
                return Err(Error::InvalidArgument(format!(
                    "{user} is already a member of {org_id}"
                )));
            }
            org.members.push(OrgMemberRecord {
                user: user.to_string(),
                role,
                added_at: Utc::now(),
            });
            Ok(())
        })
    }

    pub fn set_org_role(&self, org_id: &str, user: &str, role: OrgRole) -> Result<()> {
        self.update(|registry| {
            // Guard against demoting the sole owner, on the same snapshot
            // the change is applied to.
            if role != OrgRole::Owner
                && !access::can_demote_or_remove_org_owner(registry, org_id, user)?
            {
                return Err(Error::InvariantViolation(format!(
                    "{user} is the only owner of {org_id}"
                )));
            }
            let org = registry
                .find_org_mut(org_id)
                .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))?;
            let member = org
                .members
                .iter_mut()
                .find(|m| m.user == user)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!("{user} is not a member of {org_id}"))
                })?;
            member.role = role;
            Ok(())
        })
    }

    pub fn remove_org_member(&self, org_id: &str, user: &str) -> Result<()> {
        self.update(|registry| {
            if !access::can_demote_or_remove_org_owner(registry, org_id, user)? {
                return Err(Error::InvariantViolation(format!(
                    "{user} is the only owner of {org_id}"
                )));
            }
            let org = registry
                .find_org_mut(org_id)
                .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))?;
            let before = org.members.len();
            org.members.retain(|m| m.user != user);
            if org.members.len() == before {
                return Err(Error::InvalidArgument(format!(
                    "{user} is not a member of {org_id}"
                )));
            }
            // Group memberships inside the org do not survive removal.
            for group in &mut org.groups {
                group.members.retain(|m| m.user != user);
            }
            Ok(())
        })
    }

    // =========================================================================
    // Groups
    // =========================================================================

    pub fn create_group(&self, org_id: &str, name: &str) -> Result<GroupRecord> {
        let name = require_non_empty(name, "group name")?;
        self.update(|registry| {
            let existing: HashSet<String> = registry
                .group_ids()
                .into_iter()
                .map(|id| id.to_string())
                .collect();
            let org = registry
                .find_org_mut(org_id)
                .ok_or_else(|| Error::OrgNotFound(org_id.to_string()))?;
            let record = GroupRecord {
                id: ident::generate_id(GROUP_PREFIX, &existing),
                name: name.to_string(),
                members: Vec::new(),
                created_at: Utc::now(),
            };
            org.groups.push(record.clone());
            Ok(record)
        })
    }

    pub fn add_group_member(&self, group_id: &str, user: &str, role: GroupRole) -> Result<()> {
        let user = require_non_empty(user, "user")?;
        self.update(|registry| {
            let group = find_group_mut(registry, group_id)?;
            if group.member(user).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "{user} is already a member of {group_id}"
                )));
            }
            group.members.push(GroupMemberRecord {
                user: user.to_string(),
                role,
                added_at: Utc::now(),
            });
            Ok(())
        })
    }

    pub fn set_group_role(&self, group_id: &str, user: &str, role: GroupRole) -> Result<()> {
        self.update(|registry| {
            if role != GroupRole::Admin
                && !access::can_demote_or_remove_group_admin(registry, group_id, user)?
            {
                return Err(Error::InvariantViolation(format!(
                    "{user} is the only admin of {group_id}"
                )));
            }
            let group = find_group_mut(registry, group_id)?;
            let member = group
                .members
                .iter_mut()
                .find(|m| m.user == user)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!("{user} is not a member of {group_id}"))
                })?;
            member.role = role;
            Ok(())
        })
    }

    pub fn remove_group_member(&self, group_id: &str, user: &str) -> Result<()> {
        self.update(|registry| {
            if !access::can_demote_or_remove_group_admin(registry, group_id, user)? {
                return Err(Error::InvariantViolation(format!(
                    "{user} is the only admin of {group_id}"
                )));
            }
            let group = find_group_mut(registry, group_id)?;
            let before = group.members.len();
            group.members.retain(|m| m.user != user);
            if group.members.len() == before {
                return Err(Error::InvalidArgument(format!(
                    "{user} is not a member of {group_id}"
                )));
            }
            Ok(())
        })
    }
}

fn find_group_mut<'a>(
    registry: &'a mut DirectoryRegistry,
    group_id: &str,
) -> Result<&'a mut GroupRecord> {
    for org in &mut registry.orgs {
        if let Some(group) = org.groups.iter_mut().find(|g| g.id == group_id) {
            return Ok(group);
        }
    }
    Err(Error::GroupNotFound(group_id.to_string()))
}

fn require_non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} cannot be empty")));
    }
    Ok(trimmed)
}

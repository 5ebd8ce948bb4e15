//! Resource grants: (group, resource) -> permission level.
//!
//! A resource (project or board) holds at most one grant per group; granting
//! again replaces the level rather than duplicating the row. Grants carry no
//! authority by themselves - the resolver combines them with the directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::permission::PermissionLevel;
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRecord {
    pub resource_id: String,
    pub group_id: String,
    pub level: PermissionLevel,
    pub granted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantRegistry {
    pub grants: Vec<GrantRecord>,
}

impl GrantRegistry {
    pub fn find(&self, resource_id: &str, group_id: &str) -> Option<&GrantRecord> {
        self.grants
            .iter()
            .find(|g| g.resource_id == resource_id && g.group_id == group_id)
    }

    /// All grants attached to a resource.
    pub fn for_resource<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> impl Iterator<Item = &'a GrantRecord> {
        self.grants.iter().filter(move |g| g.resource_id == resource_id)
    }

    /// Insert or replace the grant for (resource, group).
    /// Returns true when a new grant was created.
    pub fn upsert(&mut self, record: GrantRecord) -> bool {
        if let Some(existing) = self
            .grants
            .iter_mut()
            .find(|g| g.resource_id == record.resource_id && g.group_id == record.group_id)
        {
            existing.level = record.level;
            existing.granted_at = record.granted_at;
            existing.granted_by = record.granted_by;
            false
        } else {
            self.grants.push(record);
            true
        }
    }

    pub fn remove(&mut self, resource_id: &str, group_id: &str) -> Option<GrantRecord> {
        let idx = self
            .grants
            .iter()
            .position(|g| g.resource_id == resource_id && g.group_id == group_id)?;
        Some(self.grants.remove(idx))
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for grant in &self.grants {
            if !seen.insert((grant.resource_id.as_str(), grant.group_id.as_str())) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate grant for group {} on {}",
                    grant.group_id, grant.resource_id
                )));
            }
        }
        Ok(())
    }
}

/// Store for resource grants.
#[derive(Debug, Clone)]
pub struct GrantStore {
    storage: Storage,
}

impl GrantStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn snapshot(&self) -> Result<GrantRegistry> {
        self.storage.read_or_default(&self.storage.grants_file())
    }

    fn update<R>(&self, f: impl FnOnce(&mut GrantRegistry) -> Result<R>) -> Result<R> {
        let path = self.storage.grants_file();
        self.storage.update(&path, |registry: &mut GrantRegistry| {
            let result = f(registry)?;
            registry.validate()?;
            Ok(result)
        })
    }

    /// Grant (or re-grant at a new level) a group on a resource.
    /// Returns true when the grant was newly created.
    pub fn set_grant(
        &self,
        resource_id: &str,
        group_id: &str,
        level: PermissionLevel,
        granted_by: Option<String>,
    ) -> Result<bool> {
        self.update(|registry| {
            Ok(registry.upsert(GrantRecord {
                resource_id: resource_id.to_string(),
                group_id: group_id.to_string(),
                level,
                granted_at: Utc::now(),
                granted_by,
            }))
        })
    }

    pub fn remove_grant(&self, resource_id: &str, group_id: &str) -> Result<()> {
        self.update(|registry| {
            registry.remove(resource_id, group_id).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "no grant for group {group_id} on {resource_id}"
                ))
            })?;
            Ok(())
        })
    }

    pub fn list_for_resource(&self, resource_id: &str) -> Result<Vec<GrantRecord>> {
        let registry = self.snapshot()?;
        Ok(registry.for_resource(resource_id).cloned().collect())
    }
}

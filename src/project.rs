//! Project entities.
//!
//! Projects are grant targets: groups receive permission levels on them and
//! the creator holds an implicit, non-revocable admin. Beyond that they are
//! plain named records with an archive flag.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ident::{self, PROJECT_PREFIX};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub org_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub creator: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRegistry {
    pub projects: Vec<ProjectRecord>,
}

impl ProjectRegistry {
    pub fn find(&self, project_id: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn find_mut(&mut self, project_id: &str) -> Option<&mut ProjectRecord> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for project in &self.projects {
            if !ids.insert(project.id.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate project id: {}",
                    project.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProjectStore {
    storage: Storage,
}

impl ProjectStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn snapshot(&self) -> Result<ProjectRegistry> {
        self.storage.read_or_default(&self.storage.projects_file())
    }

    fn update<R>(&self, f: impl FnOnce(&mut ProjectRegistry) -> Result<R>) -> Result<R> {
        let path = self.storage.projects_file();
        self.storage.update(&path, |registry: &mut ProjectRegistry| {
            let result = f(registry)?;
            registry.validate()?;
            Ok(result)
        })
    }

    pub fn create(
        &self,
        org_id: &str,
        name: &str,
        description: Option<String>,
        creator: &str,
    ) -> Result<ProjectRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "project name cannot be empty".to_string(),
            ));
        }
        self.update(|registry| {
            let existing: HashSet<String> =
                registry.projects.iter().map(|p| p.id.clone()).collect();
            let now = Utc::now();
            let record = ProjectRecord {
                id: ident::generate_id(PROJECT_PREFIX, &existing),
                org_id: org_id.to_string(),
                name: name.to_string(),
                description: normalize_description(description),
                creator: creator.to_string(),
                archived: false,
                created_at: now,
                updated_at: now,
            };
            registry.projects.push(record.clone());
            Ok(record)
        })
    }

    pub fn get(&self, project_id: &str) -> Result<ProjectRecord> {
        let registry = self.snapshot()?;
        registry
            .find(project_id)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
    }

    pub fn list(&self, org_id: Option<&str>, include_archived: bool) -> Result<Vec<ProjectRecord>> {
        let mut projects = self.snapshot()?.projects;
        if let Some(org_id) = org_id {
            projects.retain(|p| p.org_id == org_id);
        }
        if !include_archived {
            projects.retain(|p| !p.archived);
        }
        Ok(projects)
    }

    pub fn edit(
        &self,
        project_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<bool> {
        self.update(|registry| {
            let project = registry
                .find_mut(project_id)
                .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;

            let next_name = name.as_deref().map(str::trim);
            if let Some(next) = next_name {
                if next.is_empty() {
                    return Err(Error::InvalidArgument(
                        "project name cannot be empty".to_string(),
                    ));
                }
            }
            let has_description_input = description.is_some();
            let next_description = normalize_description(description);

            let name_changed = next_name.map(|n| n != project.name).unwrap_or(false);
            let description_changed =
                has_description_input && next_description != project.description;
            if !name_changed && !description_changed {
                return Ok(false);
            }

            if let Some(next) = next_name {
                if name_changed {
                    project.name = next.to_string();
                }
            }
            if has_description_input {
                project.description = next_description;
            }
            project.updated_at = Utc::now();
            Ok(true)
        })
    }

    pub fn set_archived(&self, project_id: &str, archived: bool) -> Result<bool> {
        self.update(|registry| {
            let project = registry
                .find_mut(project_id)
                .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;
            if project.archived == archived {
                return Ok(false);
            }
            project.archived = archived;
            project.updated_at = Utc::now();
            Ok(true)
        })
    }

    pub fn resolve_project_id(&self, input: &str) -> Result<String> {
        let registry = self.snapshot()?;
        let ids: Vec<&str> = registry.projects.iter().map(|p| p.id.as_str()).collect();
        ident::resolve_id(input, ids)?
            .ok_or_else(|| Error::ProjectNotFound(input.trim().to_string()))
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    let description = description?;
    if description.trim().is_empty() {
        None
    } else {
        Some(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, ProjectStore) {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        (dir, ProjectStore::new(storage))
    }

    #[test]
    fn create_records_creator() {
        let (_dir, store) = setup_store();
        let project = store
            .create("org-1", "Atlas", Some("desc".to_string()), "alice")
            .expect("create");
        assert_eq!(project.creator, "alice");
        assert!(project.id.starts_with("prj-"));

        let fetched = store.get(&project.id).expect("get");
        assert_eq!(fetched.name, "Atlas");
    }

    #[test]
    fn list_excludes_archived_by_default() {
        let (_dir, store) = setup_store();
        let project = store.create("org-1", "Atlas", None, "alice").expect("create");
        store.set_archived(&project.id, true).expect("archive");

        assert!(store.list(Some("org-1"), false).expect("list").is_empty());
        assert_eq!(store.list(Some("org-1"), true).expect("list all").len(), 1);
    }

    #[test]
    fn list_filters_by_org() {
        let (_dir, store) = setup_store();
        store.create("org-1", "Atlas", None, "alice").expect("create");
        store.create("org-2", "Borealis", None, "bob").expect("create");

        assert_eq!(store.list(Some("org-1"), false).expect("list").len(), 1);
        assert_eq!(store.list(None, false).expect("list").len(), 2);
    }

    #[test]
    fn edit_reports_whether_anything_changed() {
        let (_dir, store) = setup_store();
        let project = store.create("org-1", "Atlas", None, "alice").expect("create");

        let changed = store
            .edit(&project.id, Some("Atlas".to_string()), None)
            .expect("edit");
        assert!(!changed);

        let changed = store
            .edit(&project.id, Some("Atlas v2".to_string()), None)
            .expect("edit");
        assert!(changed);
    }
}

//! Storage layer for huddle
//!
//! All durable state lives under one data directory:
//!
//! ```text
//! <data-dir>/
//!   huddle.toml            # optional configuration
//!   user                   # persisted acting-user identity
//!   directory.json         # organizations, memberships, groups
//!   grants.json            # (group, resource) permission grants
//!   projects.json          # project registry
//!   boards/
//!     <board-id>.json      # one file per board: columns, sprints, tasks
//!     <board-id>.json.lock
//! ```
//!
//! Registries are read and written whole, as pretty JSON, atomically
//! (temp + rename) while holding the file's `.lock`. Giving each board its
//! own file is what makes the lock scope per-board rather than global.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

const DIRECTORY_FILE: &str = "directory.json";
const GRANTS_FILE: &str = "grants.json";
const PROJECTS_FILE: &str = "projects.json";
const BOARDS_DIR: &str = "boards";
const USER_FILE: &str = "user";
const CONFIG_FILE: &str = "huddle.toml";

/// Storage manager for huddle state
#[derive(Debug, Clone)]
pub struct Storage {
    data_root: PathBuf,
}

impl Storage {
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    /// Resolve the data directory: explicit flag, then `HUDDLE_DATA_DIR`,
    /// then the platform data dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path.to_path_buf()));
        }

        if let Ok(env_dir) = std::env::var("HUDDLE_DATA_DIR") {
            let trimmed = env_dir.trim();
            if !trimmed.is_empty() {
                return Ok(Self::new(PathBuf::from(trimmed)));
            }
        }

        let dirs = directories::ProjectDirs::from("", "", "huddle").ok_or_else(|| {
            Error::OperationFailed("could not determine a data directory".to_string())
        })?;
        Ok(Self::new(dirs.data_dir().to_path_buf()))
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn directory_file(&self) -> PathBuf {
        self.data_root.join(DIRECTORY_FILE)
    }

    pub fn grants_file(&self) -> PathBuf {
        self.data_root.join(GRANTS_FILE)
    }

    pub fn projects_file(&self) -> PathBuf {
        self.data_root.join(PROJECTS_FILE)
    }

    pub fn boards_dir(&self) -> PathBuf {
        self.data_root.join(BOARDS_DIR)
    }

    pub fn board_file(&self, board_id: &str) -> PathBuf {
        self.boards_dir().join(format!("{board_id}.json"))
    }

    pub fn user_file(&self) -> PathBuf {
        self.data_root.join(USER_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_root.join(CONFIG_FILE)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the data directory structure.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_root)?;
        fs::create_dir_all(self.boards_dir())?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_root.exists()
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Read a registry file, or its default when the file is absent.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        self.read_json(path)
    }

    /// Run a locked read-modify-write cycle on a registry file.
    ///
    /// This is the transaction boundary for every mutation: the lock is held
    /// across load, mutate, and the atomic write, so the read-max /
    /// write-max-plus-one patterns in the ordering engine are serialized
    /// against other writers on the same file.
    pub fn update<T, R, F>(&self, path: &Path, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let _lock = FileLock::acquire(lock_path_for(path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut value: T = self.read_or_default(path)?;
        let result = f(&mut value)?;

        let json = serde_json::to_string_pretty(&value)?;
        lock::write_atomic(path, json.as_bytes())?;

        Ok(result)
    }

    /// List the board ids that have a state file.
    pub fn list_board_ids(&self) -> Result<Vec<String>> {
        let dir = self.boards_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    // =========================================================================
    // Acting-user persistence
    // =========================================================================

    /// Read the persisted acting-user identity
    pub fn read_user(&self) -> Option<String> {
        let path = self.user_file();
        fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Write the acting-user identity
    pub fn write_user(&self, user: &str) -> Result<()> {
        fs::create_dir_all(&self.data_root)?;
        lock::write_atomic(self.user_file(), user.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counter {
        value: u64,
    }

    #[test]
    fn storage_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let storage = Storage::new(root.clone());

        assert_eq!(storage.directory_file(), root.join("directory.json"));
        assert_eq!(storage.grants_file(), root.join("grants.json"));
        assert_eq!(storage.projects_file(), root.join("projects.json"));
        assert_eq!(
            storage.board_file("brd-abc"),
            root.join("boards/brd-abc.json")
        );
    }

    #[test]
    fn update_creates_and_persists() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        let path = storage.directory_file();

        let out = storage
            .update::<Counter, _, _>(&path, |counter| {
                counter.value += 1;
                Ok(counter.value)
            })
            .unwrap();
        assert_eq!(out, 1);

        let read_back: Counter = storage.read_or_default(&path).unwrap();
        assert_eq!(read_back.value, 1);
    }

    #[test]
    fn update_failure_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        let path = storage.grants_file();

        storage
            .update::<Counter, _, _>(&path, |counter| {
                counter.value = 7;
                Ok(())
            })
            .unwrap();

        let result = storage.update::<Counter, (), _>(&path, |counter| {
            counter.value = 99;
            Err(Error::InvariantViolation("nope".to_string()))
        });
        assert!(result.is_err());

        let read_back: Counter = storage.read_or_default(&path).unwrap();
        assert_eq!(read_back.value, 7);
    }

    #[test]
    fn list_board_ids_scans_state_files() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.init().unwrap();

        storage
            .update::<Counter, _, _>(&storage.board_file("brd-b"), |_| Ok(()))
            .unwrap();
        storage
            .update::<Counter, _, _>(&storage.board_file("brd-a"), |_| Ok(()))
            .unwrap();

        let ids = storage.list_board_ids().unwrap();
        assert_eq!(ids, vec!["brd-a".to_string(), "brd-b".to_string()]);
    }

    #[test]
    fn user_persistence() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());

        assert!(storage.read_user().is_none());
        storage.write_user("alice").unwrap();
        assert_eq!(storage.read_user(), Some("alice".to_string()));
    }
}

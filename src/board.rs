//! Boards: columns, sprints, and tasks.
//!
//! Each board persists as its own JSON file under `boards/`, with its own
//! lock file. That file is the serialization boundary: every mutating
//! operation runs lock -> load -> compute -> validate -> atomic write, so
//! task numbering and position assignment are safe against concurrent
//! writers on the same board while boards never contend with each other.
//!
//! The structural rules themselves (numbering, default column, reorder,
//! WIP limits) live in `ordering`; this module owns the records and the
//! locked persistence cycle around them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BoardsConfig;
use crate::error::{Error, Result};
use crate::ident::{self, BOARD_PREFIX, COLUMN_PREFIX, SPRINT_PREFIX};
use crate::lock::{lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::ordering;
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub id: String,
    pub name: String,
    pub position: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Globally unique task id.
    pub id: String,
    /// Board-scoped sequential number; assigned once, never reused.
    pub number: u64,
    pub title: String,
    pub column_id: String,
    /// None = backlog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    /// Position within the column; dense on append, not compacted on delete.
    pub position: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub creator: String,
    pub columns: Vec<ColumnRecord>,
    pub sprints: Vec<SprintRecord>,
    pub tasks: Vec<TaskRecord>,
    /// High-water mark of issued task numbers. Survives task deletion so a
    /// number is never handed out twice.
    #[serde(default)]
    pub last_task_number: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardRecord {
    pub fn column(&self, column_id: &str) -> Option<&ColumnRecord> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut ColumnRecord> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut TaskRecord> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn sprint(&self, sprint_id: &str) -> Option<&SprintRecord> {
        self.sprints.iter().find(|s| s.id == sprint_id)
    }

    pub fn tasks_in_column<'a>(&'a self, column_id: &'a str) -> impl Iterator<Item = &'a TaskRecord> {
        self.tasks.iter().filter(move |t| t.column_id == column_id)
    }

    /// Columns in display order.
    pub fn columns_sorted(&self) -> Vec<&ColumnRecord> {
        let mut columns: Vec<&ColumnRecord> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.position);
        columns
    }

    /// Resolve a column from user input: exact id, exact (case-insensitive)
    /// name, then unambiguous id prefix.
    pub fn resolve_column(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("column cannot be empty".to_string()));
        }

        if let Some(column) = self.columns.iter().find(|c| c.id == trimmed) {
            return Ok(column.id.clone());
        }

        let by_name: Vec<&ColumnRecord> = self
            .columns
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(trimmed))
            .collect();
        if by_name.len() == 1 {
            return Ok(by_name[0].id.clone());
        }
        if by_name.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "ambiguous column name '{trimmed}'"
            )));
        }

        let ids: Vec<&str> = self.columns.iter().map(|c| c.id.as_str()).collect();
        ident::resolve_id(trimmed, ids)?
            .ok_or_else(|| Error::ColumnNotFound(trimmed.to_string()))
    }

    /// Resolve a task from user input: `#n`, a bare number, exact id, or an
    /// unambiguous id prefix.
    pub fn resolve_task(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("task cannot be empty".to_string()));
        }

        let numeric = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if let Ok(number) = numeric.parse::<u64>() {
            return self
                .tasks
                .iter()
                .find(|t| t.number == number)
                .map(|t| t.id.clone())
                .ok_or_else(|| Error::TaskNotFound(format!("#{number}")));
        }

        let ids: Vec<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        ident::resolve_id(trimmed, ids)?
            .ok_or_else(|| Error::TaskNotFound(trimmed.to_string()))
    }

    /// Resolve a sprint from user input: exact id, exact name, id prefix.
    pub fn resolve_sprint(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("sprint cannot be empty".to_string()));
        }

        if let Some(sprint) = self.sprints.iter().find(|s| s.id == trimmed) {
            return Ok(sprint.id.clone());
        }

        let by_name: Vec<&SprintRecord> = self
            .sprints
            .iter()
            .filter(|s| s.name.eq_ignore_ascii_case(trimmed))
            .collect();
        if by_name.len() == 1 {
            return Ok(by_name[0].id.clone());
        }
        if by_name.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "ambiguous sprint name '{trimmed}'"
            )));
        }

        let ids: Vec<&str> = self.sprints.iter().map(|s| s.id.as_str()).collect();
        ident::resolve_id(trimmed, ids)?
            .ok_or_else(|| Error::SprintNotFound(trimmed.to_string()))
    }
}

/// Store managing one file per board.
#[derive(Debug, Clone)]
pub struct BoardStore {
    storage: Storage,
}

impl BoardStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a board with the configured starter columns; the first column
    /// becomes the default.
    pub fn create(
        &self,
        org_id: &str,
        name: &str,
        creator: &str,
        config: &BoardsConfig,
    ) -> Result<BoardRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "board name cannot be empty".to_string(),
            ));
        }

        let existing: HashSet<String> = self.storage.list_board_ids()?.into_iter().collect();
        let board_id = ident::generate_id(BOARD_PREFIX, &existing);

        let mut column_ids = HashSet::new();
        let now = Utc::now();
        let columns = config
            .default_columns
            .iter()
            .enumerate()
            .map(|(position, column_name)| {
                let id = ident::generate_id(COLUMN_PREFIX, &column_ids);
                column_ids.insert(id.clone());
                ColumnRecord {
                    id,
                    name: column_name.clone(),
                    position: position as u64,
                    wip_limit: config.default_wip_limit,
                    is_default: position == 0,
                }
            })
            .collect();

        let board = BoardRecord {
            id: board_id,
            org_id: org_id.to_string(),
            name: name.to_string(),
            creator: creator.to_string(),
            columns,
            sprints: Vec::new(),
            tasks: Vec::new(),
            last_task_number: 0,
            created_at: now,
            updated_at: now,
        };

        let path = self.storage.board_file(&board.id);
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;
        self.storage.write_json(&path, &board)?;
        Ok(board)
    }

    pub fn load(&self, board_id: &str) -> Result<BoardRecord> {
        let path = self.storage.board_file(board_id);
        if !path.exists() {
            return Err(Error::BoardNotFound(board_id.to_string()));
        }
        self.storage.read_json(&path)
    }

    pub fn list(&self) -> Result<Vec<BoardRecord>> {
        let mut boards = Vec::new();
        for id in self.storage.list_board_ids()? {
            boards.push(self.load(&id)?);
        }
        Ok(boards)
    }

    pub fn list_for_org(&self, org_id: &str) -> Result<Vec<BoardRecord>> {
        let mut boards = self.list()?;
        boards.retain(|b| b.org_id == org_id);
        Ok(boards)
    }

    pub fn resolve_board_id(&self, input: &str) -> Result<String> {
        let ids = self.storage.list_board_ids()?;
        ident::resolve_id(input, ids.iter().map(|s| s.as_str()))?
            .ok_or_else(|| Error::BoardNotFound(input.trim().to_string()))
    }

    /// Locked read-modify-write on one board. This is the per-board
    /// transaction every ordering operation runs inside.
    pub fn update<R>(
        &self,
        board_id: &str,
        f: impl FnOnce(&mut BoardRecord) -> Result<R>,
    ) -> Result<R> {
        let path = self.storage.board_file(board_id);
        if !path.exists() {
            return Err(Error::BoardNotFound(board_id.to_string()));
        }

        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut board: BoardRecord = self.storage.read_json(&path)?;
        let result = f(&mut board)?;
        board.updated_at = Utc::now();
        self.storage.write_json(&path, &board)?;
        Ok(result)
    }

    // =========================================================================
    // Columns
    // =========================================================================

    pub fn add_column(
        &self,
        board_id: &str,
        name: &str,
        wip_limit: Option<u32>,
    ) -> Result<ColumnRecord> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "column name cannot be empty".to_string(),
            ));
        }
        self.update(board_id, |board| {
            let existing: HashSet<String> =
                board.columns.iter().map(|c| c.id.clone()).collect();
            let position = board
                .columns
                .iter()
                .map(|c| c.position + 1)
                .max()
                .unwrap_or(0);
            let column = ColumnRecord {
                id: ident::generate_id(COLUMN_PREFIX, &existing),
                name,
                position,
                wip_limit,
                is_default: board.columns.is_empty(),
            };
            board.columns.push(column.clone());
            Ok(column)
        })
    }

    pub fn set_wip_limit(
        &self,
        board_id: &str,
        column: &str,
        wip_limit: Option<u32>,
    ) -> Result<ColumnRecord> {
        if wip_limit == Some(0) {
            return Err(Error::InvalidArgument(
                "wip limit must be > 0 (omit it for unlimited)".to_string(),
            ));
        }
        self.update(board_id, |board| {
            let column_id = board.resolve_column(column)?;
            let column = board
                .column_mut(&column_id)
                .ok_or_else(|| Error::ColumnNotFound(column_id.clone()))?;
            column.wip_limit = wip_limit;
            Ok(column.clone())
        })
    }

    pub fn set_default_column(&self, board_id: &str, column: &str) -> Result<ColumnRecord> {
        self.update(board_id, |board| {
            let column_id = board.resolve_column(column)?;
            ordering::set_default_column(board, &column_id)?;
            board
                .column(&column_id)
                .cloned()
                .ok_or_else(|| Error::ColumnNotFound(column_id.clone()))
        })
    }

    pub fn reorder_columns(&self, board_id: &str, columns: &[String]) -> Result<()> {
        self.update(board_id, |board| {
            let mut resolved = Vec::with_capacity(columns.len());
            for input in columns {
                resolved.push(board.resolve_column(input)?);
            }
            ordering::reorder_columns(board, &resolved)
        })
    }

    pub fn delete_column(&self, board_id: &str, column: &str) -> Result<ColumnRecord> {
        self.update(board_id, |board| {
            let column_id = board.resolve_column(column)?;
            ordering::delete_column(board, &column_id)
        })
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Create a task: explicit column or the board's default, next task
    /// number, appended to the end of the column.
    pub fn create_task(
        &self,
        board_id: &str,
        title: &str,
        column: Option<&str>,
        sprint: Option<&str>,
        created_by: Option<String>,
    ) -> Result<TaskRecord> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument(
                "task title cannot be empty".to_string(),
            ));
        }
        self.update(board_id, |board| {
            let column_id = match column {
                Some(input) => board.resolve_column(input)?,
                None => ordering::resolve_default_column(board)?.id.clone(),
            };
            let sprint_id = match sprint {
                Some(input) => Some(board.resolve_sprint(input)?),
                None => None,
            };

            ordering::ensure_column_capacity(board, &column_id)?;

            let number = ordering::next_task_number(board);
            let position = ordering::next_position_in_column(board, &column_id);
            let task = TaskRecord {
                id: Uuid::new_v4().to_string(),
                number,
                title,
                column_id,
                sprint_id,
                position,
                created_at: Utc::now(),
                created_by,
            };
            board.tasks.push(task.clone());
            board.last_task_number = number;
            Ok(task)
        })
    }

    pub fn move_task(&self, board_id: &str, task: &str, column: &str) -> Result<TaskRecord> {
        self.update(board_id, |board| {
            let task_id = board.resolve_task(task)?;
            let column_id = board.resolve_column(column)?;
            ordering::move_task(board, &task_id, &column_id)?;
            board
                .task(&task_id)
                .cloned()
                .ok_or_else(|| Error::TaskNotFound(task_id.clone()))
        })
    }

    pub fn assign_sprint(
        &self,
        board_id: &str,
        task: &str,
        sprint: Option<&str>,
    ) -> Result<TaskRecord> {
        self.update(board_id, |board| {
            let task_id = board.resolve_task(task)?;
            let sprint_id = match sprint {
                Some(input) => Some(board.resolve_sprint(input)?),
                None => None,
            };
            ordering::assign_sprint(board, &task_id, sprint_id.as_deref())?;
            board
                .task(&task_id)
                .cloned()
                .ok_or_else(|| Error::TaskNotFound(task_id.clone()))
        })
    }

    /// Delete a task. Its number is retired, not recycled, and positions in
    /// the column are left as they are.
    pub fn delete_task(&self, board_id: &str, task: &str) -> Result<TaskRecord> {
        self.update(board_id, |board| {
            let task_id = board.resolve_task(task)?;
            let idx = board
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
            Ok(board.tasks.remove(idx))
        })
    }

    // =========================================================================
    // Sprints
    // =========================================================================

    pub fn create_sprint(&self, board_id: &str, name: &str) -> Result<SprintRecord> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "sprint name cannot be empty".to_string(),
            ));
        }
        self.update(board_id, |board| {
            let existing: HashSet<String> =
                board.sprints.iter().map(|s| s.id.clone()).collect();
            let sprint = SprintRecord {
                id: ident::generate_id(SPRINT_PREFIX, &existing),
                name,
                created_at: Utc::now(),
            };
            board.sprints.push(sprint.clone());
            Ok(sprint)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, BoardStore) {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().expect("init");
        (dir, BoardStore::new(storage))
    }

    fn default_config() -> BoardsConfig {
        BoardsConfig::default()
    }

    #[test]
    fn create_board_seeds_default_columns() {
        let (_dir, store) = setup_store();
        let board = store
            .create("org-1", "Launch", "alice", &default_config())
            .expect("create");

        assert_eq!(board.columns.len(), 3);
        let defaults: Vec<&ColumnRecord> =
            board.columns.iter().filter(|c| c.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "Backlog");
        assert_eq!(
            board.columns_sorted().iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn update_on_missing_board_is_not_found() {
        let (_dir, store) = setup_store();
        let err = store
            .update("brd-missing", |_| Ok(()))
            .expect_err("missing board");
        assert!(matches!(err, Error::BoardNotFound(_)));
    }

    #[test]
    fn tasks_default_into_the_default_column() {
        let (_dir, store) = setup_store();
        let board = store
            .create("org-1", "Launch", "alice", &default_config())
            .expect("create");

        let task = store
            .create_task(&board.id, "First", None, None, Some("alice".to_string()))
            .expect("task");
        let loaded = store.load(&board.id).expect("load");
        let default_column = loaded.columns.iter().find(|c| c.is_default).expect("default");
        assert_eq!(task.column_id, default_column.id);
        assert_eq!(task.number, 1);
        assert_eq!(task.position, 0);
    }

    #[test]
    fn resolve_task_accepts_number_forms() {
        let (_dir, store) = setup_store();
        let board = store
            .create("org-1", "Launch", "alice", &default_config())
            .expect("create");
        let task = store
            .create_task(&board.id, "First", None, None, None)
            .expect("task");

        let loaded = store.load(&board.id).expect("load");
        assert_eq!(loaded.resolve_task("1").expect("number"), task.id);
        assert_eq!(loaded.resolve_task("#1").expect("hash"), task.id);
        assert_eq!(loaded.resolve_task(&task.id).expect("id"), task.id);
        assert!(matches!(
            loaded.resolve_task("#9"),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn columns_resolve_by_name_case_insensitively() {
        let (_dir, store) = setup_store();
        let board = store
            .create("org-1", "Launch", "alice", &default_config())
            .expect("create");
        let loaded = store.load(&board.id).expect("load");
        let backlog = loaded.resolve_column("backlog").expect("name");
        assert_eq!(loaded.column(&backlog).expect("column").name, "Backlog");
    }

    #[test]
    fn board_ids_resolve_by_prefix() {
        let (_dir, store) = setup_store();
        let board = store
            .create("org-1", "Launch", "alice", &default_config())
            .expect("create");
        let resolved = store.resolve_board_id(&board.id[..6]).expect("resolve");
        assert_eq!(resolved, board.id);
    }
}

//! Board ordering engine.
//!
//! Pure structural rules over a [`BoardRecord`]: default-column selection,
//! task numbering, per-column positions, column reordering and deletion,
//! WIP limits, and the sprint/backlog visibility convention. Nothing here
//! touches storage; `BoardStore` runs these inside the per-board lock so
//! every read-max / write-max-plus-one sequence is serialized against other
//! writers on the same board.

use crate::board::{BoardRecord, ColumnRecord, TaskRecord};
use crate::error::{Error, Result};

/// The column new tasks land in when none is specified: the flagged
/// default, or the lowest-positioned column if the flag is missing
/// (a data anomaly this resolves rather than propagates).
pub fn resolve_default_column(board: &BoardRecord) -> Result<&ColumnRecord> {
    if let Some(column) = board.columns.iter().find(|c| c.is_default) {
        return Ok(column);
    }
    board
        .columns
        .iter()
        .min_by_key(|c| c.position)
        .ok_or_else(|| {
            Error::InvariantViolation(format!("board {} has no columns", board.id))
        })
}

/// One greater than the highest task number ever issued on this board.
/// Deleted tasks keep their number retired via the persisted high-water
/// mark, so numbers are never reused. Starts at 1 on a fresh board.
pub fn next_task_number(board: &BoardRecord) -> u64 {
    let live_max = board.tasks.iter().map(|t| t.number).max().unwrap_or(0);
    board.last_task_number.max(live_max) + 1
}

/// One greater than the highest current position in the column, 0 if empty.
/// Positions are per-column, not global to the board.
pub fn next_position_in_column(board: &BoardRecord, column_id: &str) -> u64 {
    board
        .tasks_in_column(column_id)
        .map(|t| t.position + 1)
        .max()
        .unwrap_or(0)
}

/// Flag `column_id` as the board's default, clearing every other flag in
/// the same mutation. Idempotent: a second call leaves exactly one flag set.
pub fn set_default_column(board: &mut BoardRecord, column_id: &str) -> Result<()> {
    if board.column(column_id).is_none() {
        return Err(Error::ColumnNotFound(column_id.to_string()));
    }
    for column in &mut board.columns {
        column.is_default = column.id == column_id;
    }
    Ok(())
}

/// Assign positions `0..n-1` following the supplied total order.
///
/// The supplied ids must be exactly the board's column set: no partial
/// reorders, no silently dropped columns. On mismatch nothing changes.
pub fn reorder_columns(board: &mut BoardRecord, ordered_ids: &[String]) -> Result<()> {
    let mut supplied = std::collections::HashSet::new();
    for id in ordered_ids {
        if !supplied.insert(id.as_str()) {
            return Err(Error::InvariantViolation(format!(
                "column {id} appears twice in the requested order"
            )));
        }
    }

    if supplied.len() != board.columns.len() {
        return Err(Error::InvariantViolation(format!(
            "requested order names {} columns, board has {}",
            supplied.len(),
            board.columns.len()
        )));
    }
    for column in &board.columns {
        if !supplied.contains(column.id.as_str()) {
            return Err(Error::InvariantViolation(format!(
                "requested order is missing column {}",
                column.id
            )));
        }
    }

    for (position, id) in ordered_ids.iter().enumerate() {
        if let Some(column) = board.column_mut(id) {
            column.position = position as u64;
        }
    }
    Ok(())
}

/// Delete a column. Rejected while it holds any task, or when it is the
/// board's only column. Remaining positions are renumbered densely; if the
/// deleted column was the default, the lowest-positioned survivor takes
/// the flag.
pub fn delete_column(board: &mut BoardRecord, column_id: &str) -> Result<ColumnRecord> {
    let idx = board
        .columns
        .iter()
        .position(|c| c.id == column_id)
        .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;

    if board.tasks_in_column(column_id).next().is_some() {
        return Err(Error::InvariantViolation(format!(
            "column {column_id} still holds tasks"
        )));
    }
    if board.columns.len() == 1 {
        return Err(Error::InvariantViolation(
            "a board cannot be reduced below one column".to_string(),
        ));
    }

    let removed = board.columns.remove(idx);

    let mut order: Vec<String> = {
        let mut remaining: Vec<&ColumnRecord> = board.columns.iter().collect();
        remaining.sort_by_key(|c| c.position);
        remaining.iter().map(|c| c.id.clone()).collect()
    };
    for (position, id) in order.drain(..).enumerate() {
        if let Some(column) = board.column_mut(&id) {
            column.position = position as u64;
            if removed.is_default {
                column.is_default = position == 0;
            }
        }
    }

    Ok(removed)
}

/// Reject the mutation when the column is at its WIP limit.
pub fn ensure_column_capacity(board: &BoardRecord, column_id: &str) -> Result<()> {
    let column = board
        .column(column_id)
        .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;
    if let Some(limit) = column.wip_limit {
        let current = board.tasks_in_column(column_id).count();
        if current >= limit as usize {
            return Err(Error::InvariantViolation(format!(
                "column {} is at its WIP limit of {limit}",
                column.name
            )));
        }
    }
    Ok(())
}

/// Move a task to another column on the same board, appending it to the end
/// of the destination's current ordering. Positions in the source column are
/// not renumbered. Moving a task onto its own column is a no-op.
pub fn move_task(board: &mut BoardRecord, task_id: &str, target_column_id: &str) -> Result<()> {
    if board.column(target_column_id).is_none() {
        return Err(Error::ColumnNotFound(target_column_id.to_string()));
    }
    let current_column = board
        .task(task_id)
        .map(|t| t.column_id.clone())
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

    if current_column == target_column_id {
        return Ok(());
    }

    ensure_column_capacity(board, target_column_id)?;
    let position = next_position_in_column(board, target_column_id);

    let task = board
        .task_mut(task_id)
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
    task.column_id = target_column_id.to_string();
    task.position = position;
    Ok(())
}

/// Assign a task to a sprint, or back to the backlog with `None`.
pub fn assign_sprint(
    board: &mut BoardRecord,
    task_id: &str,
    sprint_id: Option<&str>,
) -> Result<()> {
    if let Some(sprint_id) = sprint_id {
        if board.sprint(sprint_id).is_none() {
            return Err(Error::SprintNotFound(sprint_id.to_string()));
        }
    }
    let task = board
        .task_mut(task_id)
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
    task.sprint_id = sprint_id.map(|s| s.to_string());
    Ok(())
}

/// Sprint-scoped task views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SprintFilter {
    /// Every task on the board.
    All,
    /// Only tasks with no sprint assignment.
    Backlog,
    /// Tasks assigned to the sprint, plus every backlog task. A task is
    /// "in" a sprint only when explicitly assigned; unassigned tasks stay
    /// visible in every sprint view rather than disappearing from them.
    Sprint(String),
}

/// Tasks matching the filter, ordered by column position, then position
/// within the column, then task number.
pub fn filter_tasks<'a>(board: &'a BoardRecord, filter: &SprintFilter) -> Vec<&'a TaskRecord> {
    let mut tasks: Vec<&TaskRecord> = board
        .tasks
        .iter()
        .filter(|task| match filter {
            SprintFilter::All => true,
            SprintFilter::Backlog => task.sprint_id.is_none(),
            SprintFilter::Sprint(sprint_id) => {
                task.sprint_id.as_deref() == Some(sprint_id.as_str())
                    || task.sprint_id.is_none()
            }
        })
        .collect();

    let column_position = |column_id: &str| {
        board
            .column(column_id)
            .map(|c| c.position)
            .unwrap_or(u64::MAX)
    };
    tasks.sort_by(|a, b| {
        column_position(&a.column_id)
            .cmp(&column_position(&b.column_id))
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| a.number.cmp(&b.number))
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::board::SprintRecord;

    fn column(id: &str, position: u64, is_default: bool) -> ColumnRecord {
        ColumnRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            position,
            wip_limit: None,
            is_default,
        }
    }

    fn board_fixture() -> BoardRecord {
        BoardRecord {
            id: "brd-test".to_string(),
            org_id: "org-test".to_string(),
            name: "Test".to_string(),
            creator: "alice".to_string(),
            columns: vec![
                column("col-a", 0, true),
                column("col-b", 1, false),
                column("col-c", 2, false),
            ],
            sprints: Vec::new(),
            tasks: Vec::new(),
            last_task_number: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn push_task(board: &mut BoardRecord, column_id: &str) -> u64 {
        let number = next_task_number(board);
        let position = next_position_in_column(board, column_id);
        board.tasks.push(TaskRecord {
            id: format!("task-{number}"),
            number,
            title: format!("Task {number}"),
            column_id: column_id.to_string(),
            sprint_id: None,
            position,
            created_at: Utc::now(),
            created_by: None,
        });
        board.last_task_number = number;
        number
    }

    #[test]
    fn numbering_starts_at_one_and_is_monotonic() {
        let mut board = board_fixture();
        assert_eq!(next_task_number(&board), 1);

        let numbers: Vec<u64> = (0..5).map(|_| push_task(&mut board, "col-a")).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deleted_numbers_are_never_reissued() {
        let mut board = board_fixture();
        for _ in 0..3 {
            push_task(&mut board, "col-a");
        }

        // Drop the highest-numbered task: the next number must still advance.
        board.tasks.retain(|t| t.number != 3);
        assert_eq!(next_task_number(&board), 4);

        board.tasks.retain(|t| t.number != 2);
        let number = push_task(&mut board, "col-a");
        assert_eq!(number, 4);
    }

    #[test]
    fn positions_are_per_column_and_not_compacted() {
        let mut board = board_fixture();
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-b");

        assert_eq!(
            board
                .tasks_in_column("col-a")
                .map(|t| t.position)
                .collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(next_position_in_column(&board, "col-b"), 1);

        // Deleting the middle task leaves a hole; the next append lands
        // after the hole, not inside it.
        board.tasks.retain(|t| t.number != 2);
        assert_eq!(next_position_in_column(&board, "col-a"), 3);
    }

    #[test]
    fn default_column_resolution_prefers_the_flag() {
        let board = board_fixture();
        assert_eq!(resolve_default_column(&board).expect("default").id, "col-a");
    }

    #[test]
    fn default_column_falls_back_to_lowest_position() {
        let mut board = board_fixture();
        for column in &mut board.columns {
            column.is_default = false;
        }
        board.columns[0].position = 9;
        assert_eq!(resolve_default_column(&board).expect("default").id, "col-b");
    }

    #[test]
    fn set_default_is_an_atomic_swap_and_idempotent() {
        let mut board = board_fixture();
        set_default_column(&mut board, "col-c").expect("set default");
        set_default_column(&mut board, "col-c").expect("set again");

        let defaults: Vec<&str> = board
            .columns
            .iter()
            .filter(|c| c.is_default)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["col-c"]);
    }

    #[test]
    fn set_default_unknown_column_is_not_found() {
        let mut board = board_fixture();
        assert!(matches!(
            set_default_column(&mut board, "col-x"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn reorder_assigns_dense_positions() {
        let mut board = board_fixture();
        reorder_columns(
            &mut board,
            &[
                "col-c".to_string(),
                "col-a".to_string(),
                "col-b".to_string(),
            ],
        )
        .expect("reorder");

        let order: Vec<&str> = board.columns_sorted().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["col-c", "col-a", "col-b"]);
        let positions: Vec<u64> = board.columns_sorted().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn partial_reorder_is_rejected_and_changes_nothing() {
        let mut board = board_fixture();
        let before: Vec<(String, u64)> = board
            .columns
            .iter()
            .map(|c| (c.id.clone(), c.position))
            .collect();

        let err = reorder_columns(&mut board, &["col-c".to_string(), "col-a".to_string()])
            .expect_err("partial reorder");
        assert!(matches!(err, Error::InvariantViolation(_)));

        let after: Vec<(String, u64)> = board
            .columns
            .iter()
            .map(|c| (c.id.clone(), c.position))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reorder_rejects_duplicates_and_foreign_columns() {
        let mut board = board_fixture();
        let err = reorder_columns(
            &mut board,
            &[
                "col-a".to_string(),
                "col-a".to_string(),
                "col-b".to_string(),
            ],
        )
        .expect_err("duplicate");
        assert!(matches!(err, Error::InvariantViolation(_)));

        let err = reorder_columns(
            &mut board,
            &[
                "col-a".to_string(),
                "col-b".to_string(),
                "col-x".to_string(),
            ],
        )
        .expect_err("foreign column");
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn delete_column_guards() {
        let mut board = board_fixture();
        push_task(&mut board, "col-b");

        let err = delete_column(&mut board, "col-b").expect_err("holds tasks");
        assert!(matches!(err, Error::InvariantViolation(_)));

        delete_column(&mut board, "col-c").expect("empty column");
        delete_column(&mut board, "col-a").expect("still two columns");

        let err = delete_column(&mut board, "col-b").expect_err("sole column");
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn deleting_the_default_column_reassigns_the_flag() {
        let mut board = board_fixture();
        delete_column(&mut board, "col-a").expect("delete default");

        let defaults: Vec<&str> = board
            .columns
            .iter()
            .filter(|c| c.is_default)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["col-b"]);
        let positions: Vec<u64> = board.columns_sorted().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn move_appends_to_destination_and_leaves_source_positions() {
        let mut board = board_fixture();
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-b");

        move_task(&mut board, "task-1", "col-b").expect("move");

        let moved = board.task("task-1").expect("task");
        assert_eq!(moved.column_id, "col-b");
        assert_eq!(moved.position, 1);

        // Source keeps its hole at position 0.
        let remaining: Vec<u64> = board
            .tasks_in_column("col-a")
            .map(|t| t.position)
            .collect();
        assert_eq!(remaining, vec![1]);
    }

    #[test]
    fn move_onto_own_column_is_a_no_op() {
        let mut board = board_fixture();
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");

        move_task(&mut board, "task-1", "col-a").expect("no-op move");
        assert_eq!(board.task("task-1").expect("task").position, 0);
    }

    #[test]
    fn wip_limit_blocks_moves_into_a_full_column() {
        let mut board = board_fixture();
        board.column_mut("col-b").expect("column").wip_limit = Some(1);
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-b");

        let err = move_task(&mut board, "task-1", "col-b").expect_err("full column");
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert_eq!(board.task("task-1").expect("task").column_id, "col-a");
    }

    #[test]
    fn backlog_tasks_stay_visible_in_every_sprint_view() {
        let mut board = board_fixture();
        board.sprints.push(SprintRecord {
            id: "spr-1".to_string(),
            name: "Sprint 1".to_string(),
            created_at: Utc::now(),
        });
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");
        push_task(&mut board, "col-a");
        assign_sprint(&mut board, "task-1", Some("spr-1")).expect("assign");

        let in_sprint: Vec<u64> = filter_tasks(&board, &SprintFilter::Sprint("spr-1".to_string()))
            .iter()
            .map(|t| t.number)
            .collect();
        // Task 1 is assigned; tasks 2 and 3 ride along from the backlog.
        assert_eq!(in_sprint, vec![1, 2, 3]);

        let backlog: Vec<u64> = filter_tasks(&board, &SprintFilter::Backlog)
            .iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(backlog, vec![2, 3]);

        let all = filter_tasks(&board, &SprintFilter::All);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn assigning_an_unknown_sprint_is_not_found() {
        let mut board = board_fixture();
        push_task(&mut board, "col-a");
        assert!(matches!(
            assign_sprint(&mut board, "task-1", Some("spr-x")),
            Err(Error::SprintNotFound(_))
        ));
    }
}

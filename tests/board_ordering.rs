//! End-to-end board ordering walks through the real per-board store.

mod support;

use huddle::config::BoardsConfig;
use huddle::error::Error;
use huddle::ordering::{self, SprintFilter};

use support::TestEnv;

fn three_column_config() -> BoardsConfig {
    BoardsConfig {
        default_columns: vec![
            "Backlog".to_string(),
            "To Do".to_string(),
            "Done".to_string(),
        ],
        default_wip_limit: None,
    }
}

/// Three tasks land in the default column with numbers 1..3 and positions
/// 0..2; deleting #2 retires its number, and the next task gets number 4
/// appended after the surviving positions (holes are not compacted).
#[test]
fn numbering_survives_deletion() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");

    for title in ["one", "two", "three"] {
        boards
            .create_task(&board.id, title, None, None, None)
            .expect("task");
    }

    let loaded = boards.load(&board.id).expect("load");
    let backlog = loaded.columns.iter().find(|c| c.is_default).expect("default");
    assert_eq!(backlog.name, "Backlog");
    let mut placed: Vec<(u64, u64)> = loaded
        .tasks_in_column(&backlog.id)
        .map(|t| (t.number, t.position))
        .collect();
    placed.sort();
    assert_eq!(placed, vec![(1, 0), (2, 1), (3, 2)]);

    boards.delete_task(&board.id, "#2").expect("delete");

    let task = boards
        .create_task(&board.id, "four", None, None, None)
        .expect("task");
    assert_eq!(task.number, 4);
    assert_eq!(task.position, 3);

    let loaded = boards.load(&board.id).expect("load");
    let mut positions: Vec<u64> = loaded
        .tasks_in_column(&backlog.id)
        .map(|t| t.position)
        .collect();
    positions.sort();
    // The hole at position 1 persists until an explicit reorder.
    assert_eq!(positions, vec![0, 2, 3]);
}

/// Even deleting the highest-numbered task never frees its number: the
/// persisted high-water mark outlives the row.
#[test]
fn highest_number_stays_retired() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");

    boards
        .create_task(&board.id, "one", None, None, None)
        .expect("task");
    boards
        .create_task(&board.id, "two", None, None, None)
        .expect("task");
    boards.delete_task(&board.id, "#2").expect("delete");

    let task = boards
        .create_task(&board.id, "three", None, None, None)
        .expect("task");
    assert_eq!(task.number, 3);
}

#[test]
fn default_column_swap_is_atomic_under_the_board_lock() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");

    let loaded = boards.load(&board.id).expect("load");
    let done = loaded.resolve_column("Done").expect("done");

    boards.set_default_column(&board.id, &done).expect("set");
    boards.set_default_column(&board.id, &done).expect("idempotent");

    let loaded = boards.load(&board.id).expect("load");
    let defaults: Vec<&str> = loaded
        .columns
        .iter()
        .filter(|c| c.is_default)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(defaults, vec!["Done"]);

    let task = boards
        .create_task(&board.id, "lands in done", None, None, None)
        .expect("task");
    assert_eq!(task.column_id, done);
}

#[test]
fn reorder_requires_the_exact_column_set() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");

    let before = boards.load(&board.id).expect("load");
    let ids: Vec<String> = before.columns_sorted().iter().map(|c| c.id.clone()).collect();

    let err = boards
        .reorder_columns(&board.id, &ids[..2].to_vec())
        .expect_err("missing column");
    assert!(matches!(err, Error::InvariantViolation(_)));

    // Positions are exactly as they were.
    let after = boards.load(&board.id).expect("load");
    let before_positions: Vec<(String, u64)> = before
        .columns
        .iter()
        .map(|c| (c.id.clone(), c.position))
        .collect();
    let after_positions: Vec<(String, u64)> = after
        .columns
        .iter()
        .map(|c| (c.id.clone(), c.position))
        .collect();
    assert_eq!(before_positions, after_positions);

    // The full set reorders fine.
    let reversed: Vec<String> = ids.iter().rev().cloned().collect();
    boards
        .reorder_columns(&board.id, &reversed)
        .expect("full reorder");
    let after = boards.load(&board.id).expect("load");
    let names: Vec<&str> = after
        .columns_sorted()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Done", "To Do", "Backlog"]);
}

#[test]
fn column_deletion_guards_hold_through_the_store() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");

    boards
        .create_task(&board.id, "occupies backlog", None, None, None)
        .expect("task");

    let err = boards
        .delete_column(&board.id, "Backlog")
        .expect_err("column holds a task");
    assert!(matches!(err, Error::InvariantViolation(_)));

    boards.delete_column(&board.id, "To Do").expect("empty");
    boards.delete_column(&board.id, "Done").expect("empty");

    let err = boards
        .delete_column(&board.id, "Backlog")
        .expect_err("sole column");
    assert!(matches!(err, Error::InvariantViolation(_)));
}

#[test]
fn wip_limit_blocks_creation_and_moves() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");
    boards
        .set_wip_limit(&board.id, "To Do", Some(1))
        .expect("wip");

    boards
        .create_task(&board.id, "fits", Some("To Do"), None, None)
        .expect("first task");

    let err = boards
        .create_task(&board.id, "does not fit", Some("To Do"), None, None)
        .expect_err("over limit");
    assert!(matches!(err, Error::InvariantViolation(_)));

    // The rejected creation consumed no number: the next task is #2.
    let waiting = boards
        .create_task(&board.id, "waits in backlog", None, None, None)
        .expect("backlog task");
    assert_eq!(waiting.number, 2);
    let err = boards
        .move_task(&board.id, "#2", "To Do")
        .expect_err("move over limit");
    assert!(matches!(err, Error::InvariantViolation(_)));

    // Clearing the limit unblocks the move.
    boards.set_wip_limit(&board.id, "To Do", None).expect("clear");
    boards.move_task(&board.id, "#2", "To Do").expect("move");
}

#[test]
fn sprint_views_keep_backlog_tasks_visible() {
    let env = TestEnv::new();
    let boards = env.boards();
    let board = boards
        .create("org-1", "Launch", "alice", &three_column_config())
        .expect("board");
    let sprint = boards.create_sprint(&board.id, "Sprint 1").expect("sprint");

    boards
        .create_task(&board.id, "assigned", None, Some("Sprint 1"), None)
        .expect("task");
    boards
        .create_task(&board.id, "backlog", None, None, None)
        .expect("task");

    let loaded = boards.load(&board.id).expect("load");

    let sprint_view: Vec<u64> =
        ordering::filter_tasks(&loaded, &SprintFilter::Sprint(sprint.id.clone()))
            .iter()
            .map(|t| t.number)
            .collect();
    assert_eq!(sprint_view, vec![1, 2]);

    let backlog_view: Vec<u64> = ordering::filter_tasks(&loaded, &SprintFilter::Backlog)
        .iter()
        .map(|t| t.number)
        .collect();
    assert_eq!(backlog_view, vec![2]);

    // Unassigning brings the task back to the backlog view.
    boards
        .assign_sprint(&board.id, "#1", None)
        .expect("unassign");
    let loaded = boards.load(&board.id).expect("load");
    let backlog_view: Vec<u64> = ordering::filter_tasks(&loaded, &SprintFilter::Backlog)
        .iter()
        .map(|t| t.number)
        .collect();
    assert_eq!(backlog_view, vec![1, 2]);
}

/// Two boards never contend: numbering on one is independent of the other.
#[test]
fn numbering_is_scoped_per_board() {
    let env = TestEnv::new();
    let boards = env.boards();
    let first = boards
        .create("org-1", "Alpha", "alice", &three_column_config())
        .expect("board");
    let second = boards
        .create("org-1", "Beta", "alice", &three_column_config())
        .expect("board");

    boards
        .create_task(&first.id, "a1", None, None, None)
        .expect("task");
    boards
        .create_task(&first.id, "a2", None, None, None)
        .expect("task");
    let task = boards
        .create_task(&second.id, "b1", None, None, None)
        .expect("task");

    assert_eq!(task.number, 1);
}

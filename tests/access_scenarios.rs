//! End-to-end permission resolution walks through the real stores.

mod support;

use huddle::access::{self, ResourceView};
use huddle::directory::{GroupRole, OrgRole};
use huddle::permission::PermissionLevel;

use support::TestEnv;

/// Organization O has owner A; group G1 (admin A, member B) is granted
/// `write` on project P created by A. B resolves to write, A to admin via
/// the creator override, a stranger to none, and B drops to none after
/// leaving the group.
#[test]
fn group_grant_resolution_walk() {
    let env = TestEnv::new();
    let directory = env.directory();
    let grants = env.grants();
    let projects = env.projects();

    let org = directory.create_org("Acme", "alice").expect("org");
    directory
        .add_org_member(&org.id, "bob", OrgRole::Member)
        .expect("bob joins");
    let group = directory.create_group(&org.id, "Platform").expect("group");
    directory
        .add_group_member(&group.id, "alice", GroupRole::Admin)
        .expect("alice admin");
    directory
        .add_group_member(&group.id, "bob", GroupRole::Member)
        .expect("bob member");

    let project = projects
        .create(&org.id, "Atlas", None, "alice")
        .expect("project");
    grants
        .set_grant(&project.id, &group.id, PermissionLevel::Write, None)
        .expect("grant");

    let resource = ResourceView::from(&project);
    let dir_snapshot = directory.snapshot().expect("snapshot");
    let grant_snapshot = grants.snapshot().expect("snapshot");

    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &resource),
        Some(PermissionLevel::Write)
    );
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "alice", &resource),
        Some(PermissionLevel::Admin)
    );
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "carol", &resource),
        None
    );

    // Removing B from G1 severs the only grant path.
    directory
        .remove_group_member(&group.id, "bob")
        .expect("bob leaves");
    let dir_snapshot = directory.snapshot().expect("snapshot");
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &resource),
        None
    );
}

/// Upserting the same group at a higher level and adding a second granted
/// group both raise the resolved level; nothing lowers it but removal.
#[test]
fn resolution_is_monotonic_in_grants() {
    let env = TestEnv::new();
    let directory = env.directory();
    let grants = env.grants();
    let projects = env.projects();

    let org = directory.create_org("Acme", "alice").expect("org");
    directory
        .add_org_member(&org.id, "bob", OrgRole::Member)
        .expect("bob joins");
    let readers = directory.create_group(&org.id, "Readers").expect("group");
    let writers = directory.create_group(&org.id, "Writers").expect("group");
    for group in [&readers, &writers] {
        directory
            .add_group_member(&group.id, "bob", GroupRole::Admin)
            .expect("bob in group");
    }

    let project = projects
        .create(&org.id, "Atlas", None, "alice")
        .expect("project");
    let resource = ResourceView::from(&project);

    grants
        .set_grant(&project.id, &readers.id, PermissionLevel::Read, None)
        .expect("read grant");
    let dir_snapshot = directory.snapshot().expect("snapshot");
    assert_eq!(
        access::resolve(
            &dir_snapshot,
            &grants.snapshot().expect("snapshot"),
            "bob",
            &resource
        ),
        Some(PermissionLevel::Read)
    );

    grants
        .set_grant(&project.id, &writers.id, PermissionLevel::Admin, None)
        .expect("admin grant");
    assert_eq!(
        access::resolve(
            &dir_snapshot,
            &grants.snapshot().expect("snapshot"),
            "bob",
            &resource
        ),
        Some(PermissionLevel::Admin)
    );

    // Re-granting the readers group lower changes nothing while the admin
    // grant stands: max aggregation, never first-or-last.
    grants
        .set_grant(&project.id, &readers.id, PermissionLevel::Read, None)
        .expect("regrant");
    assert_eq!(
        access::resolve(
            &dir_snapshot,
            &grants.snapshot().expect("snapshot"),
            "bob",
            &resource
        ),
        Some(PermissionLevel::Admin)
    );
}

/// Losing organization membership cuts group-grant access even while the
/// group membership rows still exist.
#[test]
fn org_membership_is_a_precondition_for_grants() {
    let env = TestEnv::new();
    let directory = env.directory();
    let grants = env.grants();
    let boards = env.boards();

    let org = directory.create_org("Acme", "alice").expect("org");
    directory
        .add_org_member(&org.id, "bob", OrgRole::Member)
        .expect("bob joins");
    let group = directory.create_group(&org.id, "Platform").expect("group");
    directory
        .add_group_member(&group.id, "bob", GroupRole::Admin)
        .expect("bob in group");

    let board = boards
        .create(&org.id, "Launch", "alice", &env.boards_config())
        .expect("board");
    grants
        .set_grant(&board.id, &group.id, PermissionLevel::Admin, None)
        .expect("grant");

    let resource = ResourceView::from(&board);
    let grant_snapshot = grants.snapshot().expect("snapshot");

    let dir_snapshot = directory.snapshot().expect("snapshot");
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &resource),
        Some(PermissionLevel::Admin)
    );

    // Simulate the anomaly of a lingering group row without org membership:
    // remove bob from the org, then put the group row back.
    directory.remove_org_member(&org.id, "bob").expect("bob out");
    directory
        .add_group_member(&group.id, "bob", GroupRole::Admin)
        .expect("stale group row");

    let dir_snapshot = directory.snapshot().expect("snapshot");
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &resource),
        None
    );

    // The creator override survives anything, including leaving the org.
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "alice", &resource),
        Some(PermissionLevel::Admin)
    );
}

/// Boards and projects resolve independently: a grant on one resource says
/// nothing about another.
#[test]
fn grants_do_not_leak_across_resources() {
    let env = TestEnv::new();
    let directory = env.directory();
    let grants = env.grants();
    let projects = env.projects();

    let org = directory.create_org("Acme", "alice").expect("org");
    directory
        .add_org_member(&org.id, "bob", OrgRole::Member)
        .expect("bob joins");
    let group = directory.create_group(&org.id, "Platform").expect("group");
    directory
        .add_group_member(&group.id, "bob", GroupRole::Admin)
        .expect("bob in group");

    let granted = projects
        .create(&org.id, "Atlas", None, "alice")
        .expect("project");
    let other = projects
        .create(&org.id, "Borealis", None, "alice")
        .expect("project");
    grants
        .set_grant(&granted.id, &group.id, PermissionLevel::Write, None)
        .expect("grant");

    let dir_snapshot = directory.snapshot().expect("snapshot");
    let grant_snapshot = grants.snapshot().expect("snapshot");

    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &ResourceView::from(&granted)),
        Some(PermissionLevel::Write)
    );
    assert_eq!(
        access::resolve(&dir_snapshot, &grant_snapshot, "bob", &ResourceView::from(&other)),
        None
    );
}

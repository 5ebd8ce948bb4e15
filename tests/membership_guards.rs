//! Last-admin and last-owner guard walks through the directory store.

mod support;

use huddle::access;
use huddle::directory::{GroupRole, OrgRole};
use huddle::error::Error;

use support::TestEnv;

#[test]
fn sole_group_admin_guard_flips_with_a_second_admin() {
    let env = TestEnv::new();
    let directory = env.directory();

    let org = directory.create_org("Acme", "alice").expect("org");
    let group = directory.create_group(&org.id, "Platform").expect("group");
    directory
        .add_group_member(&group.id, "alice", GroupRole::Admin)
        .expect("alice admin");
    directory
        .add_group_member(&group.id, "bob", GroupRole::Member)
        .expect("bob member");

    let snapshot = directory.snapshot().expect("snapshot");
    assert!(!access::can_demote_or_remove_group_admin(&snapshot, &group.id, "alice").unwrap());

    directory
        .set_group_role(&group.id, "bob", GroupRole::Admin)
        .expect("promote bob");

    // With two admins, either may step down.
    let snapshot = directory.snapshot().expect("snapshot");
    assert!(access::can_demote_or_remove_group_admin(&snapshot, &group.id, "alice").unwrap());
    assert!(access::can_demote_or_remove_group_admin(&snapshot, &group.id, "bob").unwrap());
}

#[test]
fn guard_and_mutation_agree_under_the_same_snapshot() {
    let env = TestEnv::new();
    let directory = env.directory();

    let org = directory.create_org("Acme", "alice").expect("org");
    let group = directory.create_group(&org.id, "Platform").expect("group");
    directory
        .add_group_member(&group.id, "alice", GroupRole::Admin)
        .expect("alice admin");

    // The store evaluates the same guard inside its locked update, so the
    // rejected mutation leaves the registry untouched.
    let err = directory
        .set_group_role(&group.id, "alice", GroupRole::Member)
        .expect_err("sole admin demotion");
    assert!(matches!(err, Error::InvariantViolation(_)));

    let snapshot = directory.snapshot().expect("snapshot");
    let (_, group) = snapshot.find_group(&group.id).expect("group");
    assert_eq!(group.admin_count(), 1);
}

#[test]
fn sole_owner_guard_protects_the_organization() {
    let env = TestEnv::new();
    let directory = env.directory();

    let org = directory.create_org("Acme", "alice").expect("org");
    directory
        .add_org_member(&org.id, "bob", OrgRole::Member)
        .expect("bob joins");

    let snapshot = directory.snapshot().expect("snapshot");
    assert!(!access::can_demote_or_remove_org_owner(&snapshot, &org.id, "alice").unwrap());
    assert!(access::can_demote_or_remove_org_owner(&snapshot, &org.id, "bob").unwrap());

    let err = directory
        .remove_org_member(&org.id, "alice")
        .expect_err("sole owner removal");
    assert!(matches!(err, Error::InvariantViolation(_)));

    directory
        .set_org_role(&org.id, "bob", OrgRole::Owner)
        .expect("second owner");
    directory
        .remove_org_member(&org.id, "alice")
        .expect("alice may leave now");

    let snapshot = directory.snapshot().expect("snapshot");
    let org = snapshot.find_org(&org.id).expect("org");
    assert_eq!(org.owner_count(), 1);
}

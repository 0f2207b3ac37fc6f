//! Migrations that stop before the first step.

use crate::prelude::*;

#[test]
fn missing_store_is_a_no_op() {
    let project = Project::numbered(3);

    project.migrate_to("Model 3").passes().message_count(1);

    assert!(project.ls("data").is_empty());
    assert!(project.ls("scratch").is_empty());
}

#[test]
fn current_store_needs_no_migration() {
    let project = Project::numbered(1);
    project.create_store("Model 1", entities([("Item", vec![full_item(1, 1)])]));

    project
        .migrate_to("Model 1")
        .passes()
        .messages_eq(&["No migration necessary: store already matches Model 1"]);

    assert_eq!(project.load().records("Item").to_vec(), vec![full_item(1, 1)]);
    assert!(project.journal_steps().is_empty());
    assert!(project.ls("scratch").is_empty());
}

#[test]
fn store_from_unknown_version_is_left_alone() {
    let project = Project::numbered(3);
    JsonStoreDriver::new()
        .create(
            &project.store_path(),
            &json_kind(),
            &numbered_model(9),
            entities([("Item", vec![full_item(1, 9)])]),
        )
        .unwrap();

    project
        .migrate_to("Model 3")
        .fails()
        .message_count(1)
        .last_message_has("fewer than 2 schema versions")
        .last_message_has("matches no schema version");

    assert!(project.load().metadata.matches(&numbered_model(9)));
}

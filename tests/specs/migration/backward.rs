//! Downgrades walk the inventory in reverse.

use crate::prelude::*;

#[test]
fn downgrade_walks_back_one_version_at_a_time() {
    let project = Project::numbered(5);
    project.create_store("Model 5", entities([("Item", vec![full_item(1, 5)])]));

    project.migrate_to("Model 2").passes().steps_through(&[5, 4, 3, 2]);

    assert!(project.store_is_at("Model 2"));
    // Fields newer than Model 2 are dropped
    assert_eq!(project.load().records("Item").to_vec(), vec![full_item(1, 2)]);
}

#[test]
fn upgrade_then_downgrade_restores_original_records() {
    let project = Project::numbered(4);
    let original = vec![full_item(1, 2), full_item(2, 2)];
    project.create_store("Model 2", entities([("Item", original.clone())]));

    project.migrate_to("Model 4").passes();
    project.migrate_to("Model 2").passes().steps_through(&[4, 3, 2]);

    assert_eq!(project.load().records("Item").to_vec(), original);
    let journal = project.journal_steps();
    assert_eq!(journal.len(), 4);
    assert_eq!(journal[3], ("Model 3".to_string(), "Model 2".to_string()));
}

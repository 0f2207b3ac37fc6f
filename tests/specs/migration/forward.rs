//! Upgrades through every intermediate version.

use crate::prelude::*;
use sw_core::{EntityMapping, SchemaMapping};

#[test]
fn upgrade_visits_each_version_in_order() {
    let project = Project::numbered(28);
    project.create_store(
        "Model 20",
        entities([("Item", vec![full_item(1, 20), full_item(2, 20)])]),
    );

    let versions: Vec<usize> = (20..=28).collect();
    project.migrate_to("Model 28").passes().steps_through(&versions);

    assert!(project.store_is_at("Model 28"));
    let journal = project.journal_steps();
    assert_eq!(journal.len(), 8);
    assert_eq!(journal[0], ("Model 20".to_string(), "Model 21".to_string()));
    assert_eq!(journal[7], ("Model 27".to_string(), "Model 28".to_string()));
}

#[test]
fn upgrade_preserves_fields_present_in_both_versions() {
    let project = Project::numbered(8);
    project.create_store(
        "Model 3",
        entities([("Item", vec![full_item(1, 3), full_item(2, 3), full_item(5, 3)])]),
    );

    project.migrate_to("Model 8").passes().message_count(5);

    assert_eq!(
        project.load().records("Item").to_vec(),
        vec![full_item(1, 3), full_item(2, 3), full_item(5, 3)]
    );
}

#[test]
fn registered_mapping_is_used_for_its_step_only() {
    let project = Project::numbered(3);
    project.create_store("Model 1", entities([("Item", vec![full_item(1, 1)])]));
    // Model 2 -> Model 3 starts Item over empty
    let reset = SchemaMapping::between(
        project.schema("Model 2"),
        project.schema("Model 3"),
        vec![EntityMapping::added("Item")],
    );

    project
        .migrate_with(
            JsonStoreDriver::new().with_mapping(reset),
            project.schema("Model 3"),
        )
        .passes()
        .steps_through(&[1, 2, 3]);

    assert!(project.store_is_at("Model 3"));
    assert_eq!(project.load().count("Item"), 0);
}

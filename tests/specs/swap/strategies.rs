//! What the swap leaves on disk under each strategy.

use crate::prelude::*;

fn migrated_project(strategy: SwapStrategy) -> Project {
    let project = Project::numbered(4).strategy(strategy);
    project.create_store("Model 1", entities([("Item", vec![full_item(1, 1)])]));
    project.file("data/library.store-shm", "stale sidecar");
    project.file("data/catalog.store", "another store");

    project.migrate_to("Model 4").passes().steps_through(&[1, 2, 3, 4]);
    project
}

#[test]
fn staged_swap_leaves_only_the_new_store() {
    let project = migrated_project(SwapStrategy::Staged);

    assert_eq!(
        project.ls("data"),
        vec!["catalog.store", "library.store", "library.store-journal"]
    );
    assert!(project.ls("scratch").is_empty());
    assert!(project.store_is_at("Model 4"));
}

#[test]
fn in_place_swap_leaves_only_the_new_store() {
    let project = migrated_project(SwapStrategy::InPlace);

    assert_eq!(
        project.ls("data"),
        vec!["catalog.store", "library.store", "library.store-journal"]
    );
    assert!(project.ls("scratch").is_empty());
    assert!(project.store_is_at("Model 4"));
}

#[test]
fn journal_travels_with_the_store() {
    let project = migrated_project(SwapStrategy::Staged);

    assert_eq!(
        project.journal_steps(),
        vec![
            ("Model 1".to_string(), "Model 2".to_string()),
            ("Model 2".to_string(), "Model 3".to_string()),
            ("Model 3".to_string(), "Model 4".to_string()),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(project.path().join("data/catalog.store")).unwrap(),
        "another store"
    );
}

#[test]
fn directory_sharing_the_store_stem_is_left_alone() {
    for strategy in [SwapStrategy::Staged, SwapStrategy::InPlace] {
        let project = Project::numbered(3).strategy(strategy);
        project.create_store("Model 1", entities([("Item", vec![full_item(1, 1)])]));
        project.file("data/library/notes.txt", "keep me");

        project.migrate_to("Model 3").passes().steps_through(&[1, 2, 3]);

        assert_eq!(
            project.ls("data"),
            vec!["library", "library.store", "library.store-journal"],
            "{strategy:?}"
        );
        assert_eq!(
            std::fs::read_to_string(project.path().join("data/library/notes.txt")).unwrap(),
            "keep me"
        );
    }
}

#[test]
fn store_left_in_backup_dir_is_not_mistaken_for_missing() {
    let project = Project::numbered(3);
    project.create_store("Model 1", entities([("Item", vec![full_item(1, 1)])]));
    let backup = project.path().join("data/.library.backup-deadbeef");
    std::fs::create_dir(&backup).unwrap();
    for name in project.ls("data") {
        if name.starts_with("library.store") {
            std::fs::rename(project.path().join("data").join(&name), backup.join(&name)).unwrap();
        }
    }

    project
        .migrate_to("Model 3")
        .fails()
        .message_count(1)
        .last_message_has(".library.backup-deadbeef");

    assert_eq!(project.ls("data/.library.backup-deadbeef").len(), 2);
}

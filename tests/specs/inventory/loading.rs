//! Inventories and configuration loaded from TOML files.

use crate::prelude::*;
use sw_core::InventoryError;

const INVENTORY: &str = r#"
[[version]]
name = "Notes 1"
file = "notes_1.toml"

[[version]]
name = "Notes 2"
file = "notes_2.toml"
"#;

const NOTES_1: &str = r#"
[entities.Note.fields.body]
kind = "string"

[entities.Note.fields.words]
kind = "integer"
"#;

const NOTES_2: &str = r#"
[entities.Note.fields.body]
kind = "string"

[entities.Note.fields.words]
kind = "float"

[entities.Note.fields.pinned]
kind = "bool"
default = false
"#;

fn notes_project() -> Project {
    let mut project = Project::empty();
    project.file("schemas/inventory.toml", INVENTORY);
    project.file("schemas/notes_1.toml", NOTES_1);
    project.file("schemas/notes_2.toml", NOTES_2);
    project.load_inventory("schemas");
    project
}

#[test]
fn inventory_directory_drives_migration() {
    let project = notes_project();
    assert_eq!(
        project
            .inventory()
            .versions()
            .map(|v| v.name)
            .collect::<Vec<_>>(),
        vec!["Notes 1".to_string(), "Notes 2".to_string()]
    );
    project.create_store(
        "Notes 1",
        entities([(
            "Note",
            vec![Record::new(1).with("body", "hello").with("words", 1)],
        )]),
    );

    project
        .migrate_to("Notes 2")
        .passes()
        .messages_eq(&["Migrating from Notes 1 to Notes 2"]);

    assert_eq!(
        project.load().records("Note").to_vec(),
        vec![Record::new(1)
            .with("body", "hello")
            .with("words", 1.0)
            .with("pinned", false)]
    );
    assert_eq!(
        project.journal_steps(),
        vec![("Notes 1".to_string(), "Notes 2".to_string())]
    );
}

#[test]
fn duplicate_version_names_are_rejected() {
    let project = Project::empty();
    project.file(
        "schemas/inventory.toml",
        "[[version]]\nname = \"Notes 1\"\nfile = \"notes_1.toml\"\n\n\
         [[version]]\nname = \"Notes 1\"\nfile = \"notes_1.toml\"\n",
    );
    project.file("schemas/notes_1.toml", NOTES_1);

    let err = SchemaInventory::load(&project.path().join("schemas")).unwrap_err();

    assert!(matches!(err, InventoryError::DuplicateVersion(name) if name == "Notes 1"));
}

#[test]
fn identical_versions_under_different_names_are_rejected() {
    let project = Project::empty();
    project.file(
        "schemas/inventory.toml",
        "[[version]]\nname = \"Notes 1\"\nfile = \"notes_1.toml\"\n\n\
         [[version]]\nname = \"Notes 1b\"\nfile = \"notes_1.toml\"\n",
    );
    project.file("schemas/notes_1.toml", NOTES_1);

    let err = SchemaInventory::load(&project.path().join("schemas")).unwrap_err();

    assert!(matches!(
        err,
        InventoryError::DuplicateIdentity { first, second } if first == "Notes 1" && second == "Notes 1b"
    ));
}

#[test]
fn config_file_chooses_scratch_dir_and_strategy() {
    let project = notes_project();
    let scratch = project.path().join("custom-scratch");
    project.file(
        "stepwise.toml",
        &format!(
            "scratch_dir = {:?}\nswap_strategy = \"in_place\"\n",
            scratch.display().to_string()
        ),
    );
    let config = MigratorConfig::load(&project.path().join("stepwise.toml")).unwrap();
    assert_eq!(config.swap_strategy, SwapStrategy::InPlace);
    project.create_store(
        "Notes 1",
        entities([(
            "Note",
            vec![Record::new(1).with("body", "hi").with("words", 1)],
        )]),
    );

    let result = Migrator::new(JsonStoreDriver::new(), &config).iterative_migrate(
        &project.store_path(),
        &json_kind(),
        project.schema("Notes 2"),
        project.inventory(),
    );

    assert!(result.success, "{:?}", result.debug_messages);
    assert!(project.store_is_at("Notes 2"));
    assert!(scratch.is_dir());
    assert!(project.ls("custom-scratch").is_empty());
    assert!(!project.scratch_dir().exists());
}

//! Entity-level changes between versions: removal, renames, and failures.

use crate::prelude::*;

fn linked_inventory() -> SchemaInventory {
    let model_26 = SchemaDescriptor::new("Model 26")
        .entity(
            "Parent",
            EntityDef::new()
                .field("name", FieldDef::new(FieldKind::String))
                .field("child", FieldDef::reference("Child").optional()),
        )
        .entity(
            "Child",
            EntityDef::new().field("label", FieldDef::new(FieldKind::String)),
        );
    let model_27 = SchemaDescriptor::new("Model 27").entity(
        "Parent",
        EntityDef::new().field("name", FieldDef::new(FieldKind::String)),
    );
    SchemaInventory::new(vec![model_26, model_27]).unwrap()
}

#[test]
fn removed_entity_takes_its_records_along() {
    let project = Project::with_inventory(linked_inventory());
    project.create_store(
        "Model 26",
        entities([
            (
                "Parent",
                vec![Record::new(1).with("name", "parent").with("child", 1)],
            ),
            ("Child", vec![Record::new(1).with("label", "child")]),
        ]),
    );

    project
        .migrate_to("Model 27")
        .passes()
        .messages_eq(&["Migrating from Model 26 to Model 27"]);

    let contents = project.load();
    assert_eq!(contents.count("Parent"), 1);
    assert_eq!(contents.count("Child"), 0);
    assert_eq!(
        contents.records("Parent").to_vec(),
        vec![Record::new(1).with("name", "parent")]
    );
}

fn renaming_inventory() -> SchemaInventory {
    let author = EntityDef::new().field("name", FieldDef::new(FieldKind::String));
    SchemaInventory::new(vec![
        SchemaDescriptor::new("Catalog 1").entity("Author", author.clone()),
        SchemaDescriptor::new("Catalog 2").entity("Writer", author.renamed_from("Author")),
    ])
    .unwrap()
}

#[test]
fn renamed_entity_keeps_ids_both_ways() {
    let project = Project::with_inventory(renaming_inventory());
    let authors = vec![
        Record::new(4).with("name", "Butler"),
        Record::new(9).with("name", "Jemisin"),
    ];
    project.create_store("Catalog 1", entities([("Author", authors.clone())]));

    project.migrate_to("Catalog 2").passes();
    assert_eq!(project.load().records("Writer").to_vec(), authors);

    project.migrate_to("Catalog 1").passes();
    assert_eq!(project.load().records("Author").to_vec(), authors);
    assert_eq!(project.load().count("Writer"), 0);
}

/// Scores 3 makes `score` required, which item 2 does not have.
fn scoring_inventory() -> SchemaInventory {
    let item = EntityDef::new().field("name", FieldDef::new(FieldKind::String));
    SchemaInventory::new(vec![
        SchemaDescriptor::new("Scores 1").entity(
            "Item",
            item.clone()
                .field("score", FieldDef::new(FieldKind::Integer).optional()),
        ),
        SchemaDescriptor::new("Scores 2").entity(
            "Item",
            item.clone()
                .field("score", FieldDef::new(FieldKind::Integer).optional())
                .field("rating", FieldDef::new(FieldKind::Float).optional()),
        ),
        SchemaDescriptor::new("Scores 3").entity(
            "Item",
            item.field("score", FieldDef::new(FieldKind::Integer))
                .field("rating", FieldDef::new(FieldKind::Float).optional()),
        ),
    ])
    .unwrap()
}

#[test]
fn failed_step_leaves_store_at_last_completed_version() {
    let project = Project::with_inventory(scoring_inventory());
    project.create_store(
        "Scores 1",
        entities([(
            "Item",
            vec![
                Record::new(1).with("name", "scored").with("score", 10),
                Record::new(2).with("name", "unscored"),
            ],
        )]),
    );

    project
        .migrate_to("Scores 3")
        .fails()
        .message_count(3)
        .last_message_has("Migration from Scores 2 to Scores 3 failed")
        .last_message_has("[record Item#2]");

    assert!(project.store_is_at("Scores 2"));
    assert_eq!(project.load().count("Item"), 2);
    assert!(project.ls("scratch").is_empty());
    assert_eq!(
        project.ls("data"),
        vec!["library.store", "library.store-journal"]
    );
}

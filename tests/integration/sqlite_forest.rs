#![allow(missing_docs)]

mod support;

use nestset::{
    query, verify_forest, write_transaction, NestedSet, NestedSetError, NestedSetOptions, Node,
    NodeId, PropertyValue, Result, Schema, SqliteStore, TreeStore,
};
use rusqlite::Connection;

use support::{build_electronics, layout, open_db};

fn checked() -> NestedSet {
    NestedSet::new(NestedSetOptions::default().verify_after_mutation(true))
}

fn committed(conn: &Connection, schema: &Schema) -> Result<Vec<Node>> {
    let store = SqliteStore::new(conn, schema)?;
    store.scan(&Default::default())
}

fn row(name: &str, left: i64, right: i64, level: i64) -> (String, i64, i64, i64) {
    (name.to_string(), left, right, level)
}

#[test]
fn electronics_catalogue_round_trips_through_sqlite() -> Result<()> {
    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    write_transaction(&mut conn, &schema, |store| build_electronics(&tree, store))?;

    let rows = committed(&conn, &schema)?;
    assert_eq!(
        layout(&rows),
        vec![
            row("Electronics", 1, 22, 0),
            row("Television", 2, 9, 1),
            row("Tube", 3, 4, 2),
            row("LCD", 5, 6, 2),
            row("Plasma", 7, 8, 2),
            row("Game Consoles", 10, 11, 1),
            row("Portable Electronics", 12, 21, 1),
            row("MP3 Players", 13, 16, 2),
            row("Flash", 14, 15, 3),
            row("CD Players", 17, 18, 2),
            row("2 Way Radios", 19, 20, 2),
        ]
    );
    let report = verify_forest(&SqliteStore::new(&conn, &schema)?)?;
    assert!(report.success, "{:?}", report.findings);
    assert_eq!(report.counts.nodes, 11);
    Ok(())
}

#[test]
fn moves_and_deletes_keep_the_table_packed() -> Result<()> {
    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    let ids = write_transaction(&mut conn, &schema, |store| build_electronics(&tree, store))?;

    write_transaction(&mut conn, &schema, |store| {
        tree.reparent(store, ids["LCD"], Some(ids["MP3 Players"]))
    })?;
    let rows = committed(&conn, &schema)?;
    let lcd = rows.iter().find(|n| n.name == "LCD").expect("LCD row");
    assert_eq!((lcd.interval.left, lcd.interval.right, lcd.interval.level), (14, 15, 3));
    assert_eq!(lcd.parent_id, Some(ids["MP3 Players"]));

    write_transaction(&mut conn, &schema, |store| {
        tree.reparent(store, ids["MP3 Players"], None)
    })?;
    write_transaction(&mut conn, &schema, |store| {
        tree.delete(store, ids["Television"])
    })?;
    let rows = committed(&conn, &schema)?;
    assert_eq!(
        layout(&rows),
        vec![
            row("Electronics", 1, 10, 0),
            row("Game Consoles", 2, 3, 1),
            row("Portable Electronics", 4, 9, 1),
            row("CD Players", 5, 6, 2),
            row("2 Way Radios", 7, 8, 2),
            row("MP3 Players", 11, 16, 0),
            row("Flash", 12, 13, 1),
            row("LCD", 14, 15, 1),
        ]
    );
    Ok(())
}

#[test]
fn failed_mutation_rolls_back_every_write() -> Result<()> {
    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    let ids = write_transaction(&mut conn, &schema, |store| build_electronics(&tree, store))?;
    let before = layout(&committed(&conn, &schema)?);

    let err = write_transaction(&mut conn, &schema, |store| {
        tree.insert(store, Node::child_of(ids["Tube"], "CRT"))?;
        tree.insert(store, Node::child_of(NodeId(4040), "orphan"))
    })
    .unwrap_err();
    assert!(matches!(err, NestedSetError::ParentNotFound(NodeId(4040))));

    let err = write_transaction(&mut conn, &schema, |store| {
        tree.reparent(store, ids["Television"], Some(ids["Plasma"]))
    })
    .unwrap_err();
    assert!(matches!(err, NestedSetError::CyclicMove { .. }));

    assert_eq!(layout(&committed(&conn, &schema)?), before);
    Ok(())
}

#[test]
fn custom_column_binding_from_toml() -> Result<()> {
    let schema = Schema::from_toml_str(
        r#"
        table = "taxons"
        id = "taxon_id"
        parent_id = "parent_taxon_id"
        left = "tree_left"
        right = "tree_right"
        level = "tree_level"
        "#,
    )?;
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    write_transaction(&mut conn, &schema, |store| {
        let root = tree.insert(store, Node::new("Animalia"))?.node.id;
        let chordata = tree.insert(store, Node::child_of(root, "Chordata"))?.node.id;
        tree.insert(store, Node::child_of(chordata, "Mammalia"))?;
        tree.insert(store, Node::child_of(root, "Arthropoda"))?;
        Ok(())
    })?;

    let raw: Vec<(String, i64, i64)> = conn
        .prepare("SELECT name, tree_left, tree_right FROM taxons ORDER BY tree_left")?
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<rusqlite::Result<_>>()?;
    assert_eq!(
        raw,
        vec![
            ("Animalia".to_string(), 1, 8),
            ("Chordata".to_string(), 2, 5),
            ("Mammalia".to_string(), 3, 4),
            ("Arthropoda".to_string(), 6, 7),
        ]
    );
    Ok(())
}

#[test]
fn payload_survives_interval_shifts() -> Result<()> {
    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    let root = write_transaction(&mut conn, &schema, |store| {
        let root = tree.insert(
            store,
            Node::new("catalog")
                .with_property("visible", PropertyValue::Bool(true))
                .with_property("rank", PropertyValue::Int(-3))
                .with_property("weight", PropertyValue::Float(1.5))
                .with_property("icon", PropertyValue::Bytes(vec![0x89, 0x50, 0x4e, 0x47])),
        )?;
        tree.insert(store, Node::child_of(root.node.id, "child"))?;
        Ok(root.node.id)
    })?;

    let store = SqliteStore::new(&conn, &schema)?;
    let node = store.get_by_id(root)?.expect("root row");
    assert_eq!(node.interval.right, 4);
    assert_eq!(node.properties["visible"], PropertyValue::Bool(true));
    assert_eq!(node.properties["rank"], PropertyValue::Int(-3));
    assert_eq!(node.properties["weight"], PropertyValue::Float(1.5));
    assert_eq!(
        node.properties["icon"],
        PropertyValue::Bytes(vec![0x89, 0x50, 0x4e, 0x47])
    );
    Ok(())
}

#[test]
fn hierarchy_queries_over_sqlite() -> Result<()> {
    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    let ids = write_transaction(&mut conn, &schema, |store| build_electronics(&tree, store))?;

    let store = SqliteStore::new(&conn, &schema)?;
    let names = |nodes: Vec<Node>| nodes.into_iter().map(|n| n.name).collect::<Vec<_>>();
    assert_eq!(
        names(query::ancestors(&store, ids["Flash"])?),
        ["Electronics", "Portable Electronics", "MP3 Players"]
    );
    assert_eq!(
        names(query::children(&store, ids["Television"])?),
        ["Tube", "LCD", "Plasma"]
    );
    assert_eq!(query::descendants(&store, ids["Electronics"], None)?.len(), 10);
    assert!(query::is_descendant_of(&store, ids["Flash"], ids["Portable Electronics"])?);
    Ok(())
}

#[test]
fn sql_keywords_are_usable_as_names() -> Result<()> {
    let schema = Schema::from_toml_str(
        r#"
        table = "order"
        parent_id = "group"
        left = "from"
        right = "to"
        level = "index"
        "#,
    )?;
    let (_dir, mut conn) = open_db(&schema);
    let tree = checked();
    let ids = write_transaction(&mut conn, &schema, |store| build_electronics(&tree, store))?;
    write_transaction(&mut conn, &schema, |store| {
        tree.reparent(store, ids["LCD"], Some(ids["MP3 Players"]))?;
        tree.delete(store, ids["Tube"])
    })?;

    let store = SqliteStore::new(&conn, &schema)?;
    let report = verify_forest(&store)?;
    assert!(report.success, "{:?}", report.findings);
    assert_eq!(report.counts.nodes, 10);
    let lcd = store.get_by_id(ids["LCD"])?.expect("LCD row");
    assert_eq!(lcd.parent_id, Some(ids["MP3 Players"]));
    Ok(())
}

#![allow(dead_code)]

use std::collections::HashMap;

use nestset::{NestedSet, Node, NodeId, Schema, TreeStore};
use rusqlite::Connection;
use tempfile::TempDir;

/// Creates the forest table described by `schema`.
pub fn create_table(conn: &Connection, schema: &Schema) -> rusqlite::Result<()> {
    let q = |name: &str| format!("\"{name}\"");
    conn.execute_batch(&format!(
        "CREATE TABLE {table} (
            {id} INTEGER PRIMARY KEY AUTOINCREMENT,
            {parent} INTEGER NULL,
            {left} INTEGER NOT NULL,
            {right} INTEGER NOT NULL,
            {level} INTEGER NOT NULL,
            {name} TEXT NOT NULL,
            {props} TEXT NOT NULL DEFAULT '{{}}'
        );
        CREATE INDEX {lft_index} ON {table} ({left});
        CREATE INDEX {rgt_index} ON {table} ({right});",
        table = q(&schema.table),
        id = q(&schema.id),
        parent = q(&schema.parent_id),
        left = q(&schema.left),
        right = q(&schema.right),
        level = q(&schema.level),
        name = q(&schema.name),
        props = q(&schema.properties),
        lft_index = q(&format!("{}_lft", schema.table)),
        rgt_index = q(&format!("{}_rgt", schema.table)),
    ))
}

/// Opens a fresh on-disk database with the forest table in place.
pub fn open_db(schema: &Schema) -> (TempDir, Connection) {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = Connection::open(dir.path().join("forest.db")).expect("open sqlite");
    create_table(&conn, schema).expect("create table");
    (dir, conn)
}

/// `(name, left, right, level)` rows ordered by `left`.
pub fn layout(nodes: &[Node]) -> Vec<(String, i64, i64, i64)> {
    nodes
        .iter()
        .map(|n| {
            (
                n.name.clone(),
                n.interval.left,
                n.interval.right,
                n.interval.level,
            )
        })
        .collect()
}

/// The electronics catalogue as `(name, parent name)` in insertion order.
pub const ELECTRONICS: [(&str, Option<&str>); 11] = [
    ("Electronics", None),
    ("Television", Some("Electronics")),
    ("Tube", Some("Television")),
    ("LCD", Some("Television")),
    ("Plasma", Some("Television")),
    ("Game Consoles", Some("Electronics")),
    ("Portable Electronics", Some("Electronics")),
    ("MP3 Players", Some("Portable Electronics")),
    ("Flash", Some("MP3 Players")),
    ("CD Players", Some("Portable Electronics")),
    ("2 Way Radios", Some("Portable Electronics")),
];

/// Inserts [`ELECTRONICS`] through `tree` and returns name -> id.
pub fn build_electronics<S: TreeStore<Node = Node>>(
    tree: &NestedSet,
    store: &mut S,
) -> nestset::Result<HashMap<&'static str, NodeId>> {
    let mut ids = HashMap::new();
    for (name, parent) in ELECTRONICS {
        let node = match parent {
            Some(parent) => Node::child_of(ids[parent], name),
            None => Node::new(name),
        };
        ids.insert(name, tree.insert(store, node)?.node.id);
    }
    Ok(ids)
}

#![allow(missing_docs)]

mod support;

use nestset::{
    write_transaction, MemoryForest, NestedSet, NestedSetOptions, Node, Result, Schema,
    SqliteStore, TreeStore,
};

use support::{build_electronics, layout, open_db};

/// A scripted mutation addressed by node name.
enum Step {
    Insert(&'static str, Option<&'static str>),
    Delete(&'static str),
    Reparent(&'static str, Option<&'static str>),
}

const SCRIPT: &[Step] = &[
    Step::Reparent("Portable Electronics", Some("LCD")),
    Step::Insert("OLED", Some("Television")),
    Step::Reparent("LCD", Some("Game Consoles")),
    Step::Reparent("Flash", None),
    Step::Insert("Handheld", Some("Game Consoles")),
    Step::Delete("MP3 Players"),
    Step::Reparent("Television", Some("Flash")),
    Step::Insert("Accessories", None),
    Step::Reparent("Game Consoles", Some("Accessories")),
    Step::Delete("Tube"),
];

fn run_script<S: TreeStore<Node = Node>>(tree: &NestedSet, store: &mut S) -> Result<()> {
    let mut ids = build_electronics(tree, store)?;
    for step in SCRIPT {
        match *step {
            Step::Insert(name, parent) => {
                let node = match parent {
                    Some(parent) => Node::child_of(ids[parent], name),
                    None => Node::new(name),
                };
                let id = tree.insert(store, node)?.node.id;
                ids.insert(name, id);
            }
            Step::Delete(name) => {
                tree.delete(store, ids[name])?;
            }
            Step::Reparent(name, parent) => {
                let parent = parent.map(|p| ids[p]);
                tree.reparent(store, ids[name], parent)?;
            }
        }
    }
    Ok(())
}

#[test]
fn memory_and_sqlite_produce_identical_forests() -> Result<()> {
    let tree = NestedSet::new(NestedSetOptions::default().verify_after_mutation(true));

    let forest = MemoryForest::new();
    let mut tx = forest.begin_write();
    run_script(&tree, &mut tx)?;
    tx.commit();
    let in_memory = layout(&forest.snapshot());

    let schema = Schema::default();
    let (_dir, mut conn) = open_db(&schema);
    write_transaction(&mut conn, &schema, |store| run_script(&tree, store))?;
    let on_disk = layout(&SqliteStore::new(&conn, &schema)?.scan(&Default::default())?);

    assert_eq!(in_memory, on_disk);
    assert_eq!(in_memory.len(), 12);
    Ok(())
}

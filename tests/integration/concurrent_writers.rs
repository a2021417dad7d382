#![allow(missing_docs)]

mod support;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use nestset::{
    query, verify_forest, write_transaction, MemoryForest, NestedSet, NestedSetOptions, Node,
    Result, Schema, SqliteStore, TreeStore,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;

const WRITERS: usize = 4;
const OPS_PER_WRITER: usize = 40;

fn checked() -> NestedSet {
    NestedSet::new(NestedSetOptions::default().verify_after_mutation(true))
}

/// Applies one random structural mutation, never choosing a cyclic move.
fn random_op<S: TreeStore<Node = Node>>(
    tree: &NestedSet,
    store: &mut S,
    rng: &mut ChaCha8Rng,
    label: &str,
) -> Result<()> {
    let nodes = store.scan(&Default::default())?;
    if nodes.is_empty() || rng.gen_bool(0.1) {
        tree.insert(store, Node::new(label))?;
        return Ok(());
    }
    let pick = nodes[rng.gen_range(0..nodes.len())].id;
    match rng.gen_range(0..10) {
        0..=4 => {
            tree.insert(store, Node::child_of(pick, label))?;
        }
        5..=6 if nodes.len() > 8 => {
            tree.delete(store, pick)?;
        }
        _ => {
            let target = nodes[rng.gen_range(0..nodes.len())].id;
            let cyclic = target == pick || query::is_descendant_of(store, target, pick)?;
            let parent = if cyclic { None } else { Some(target) };
            tree.reparent(store, pick, parent)?;
        }
    }
    Ok(())
}

#[test]
fn memory_writers_serialize_on_the_forest_lock() -> Result<()> {
    let forest: MemoryForest<Node> = MemoryForest::new();
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let forest = forest.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> Result<()> {
                let tree = checked();
                let mut rng = ChaCha8Rng::seed_from_u64(0x5eed + writer as u64);
                barrier.wait();
                for op in 0..OPS_PER_WRITER {
                    let mut tx = forest.begin_write();
                    random_op(&tree, &mut tx, &mut rng, &format!("w{writer}-{op}"))?;
                    tx.commit();
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread panicked")?;
    }

    let report = {
        let tx = forest.begin_write();
        verify_forest(&tx)?
    };
    assert!(report.success, "{:?}", report.findings);
    assert_eq!(report.counts.nodes as usize, forest.len());
    Ok(())
}

#[test]
fn sqlite_writers_serialize_on_immediate_transactions() -> Result<()> {
    let schema = Schema::default();
    let (dir, conn) = support::open_db(&schema);
    drop(conn);
    let path = dir.path().join("forest.db");

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            let schema = schema.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> Result<()> {
                let mut conn = Connection::open(&path)?;
                conn.busy_timeout(Duration::from_secs(30))?;
                let tree = checked();
                let mut rng = ChaCha8Rng::seed_from_u64(0xfeed + writer as u64);
                barrier.wait();
                for op in 0..OPS_PER_WRITER / 2 {
                    let label = format!("w{writer}-{op}");
                    write_transaction(&mut conn, &schema, |store| {
                        random_op(&tree, store, &mut rng, &label)
                    })?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread panicked")?;
    }

    let conn = Connection::open(&path)?;
    let store = SqliteStore::new(&conn, &schema)?;
    let report = verify_forest(&store)?;
    assert!(report.success, "{:?}", report.findings);
    assert!(report.counts.nodes > 0);
    Ok(())
}

#[test]
fn snapshot_readers_only_see_committed_state() -> Result<()> {
    let forest: MemoryForest<Node> = MemoryForest::new();
    let tree = checked();
    let mut tx = forest.begin_write();
    let root = tree.insert(&mut tx, Node::new("root"))?.node.id;
    tx.commit();

    let mut tx = forest.begin_write();
    tree.insert(&mut tx, Node::child_of(root, "pending"))?;
    let reader = {
        let forest = forest.clone();
        thread::spawn(move || forest.snapshot())
    };
    let seen = reader.join().expect("reader thread panicked");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].interval.right, 2);

    tx.commit();
    let seen = forest.snapshot();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].interval.right, 4);
    Ok(())
}

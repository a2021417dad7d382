//! SQLite adapter for [`Node`] rows.
//!
//! The adapter borrows a connection the caller has already placed inside a
//! transaction; it never begins or ends one itself. [`write_transaction`] is
//! the caller-side helper that opens the exclusive writer transaction the
//! maintainer needs.

use std::collections::BTreeMap;

use base64::Engine;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, Row, TransactionBehavior};
use tracing::{trace, warn};

use super::{Assign, Changeset, Predicate, Schema, TreeStore};
use crate::model::{Node, PropertyValue};
use crate::types::{Interval, NestedSetError, NodeId, Result};

const BYTES_TAG: &str = "$bytes";
const FLOAT_TAG: &str = "$float";

/// Transaction-scoped [`TreeStore`] over a SQLite table described by a [`Schema`].
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    schema: &'conn Schema,
    columns: String,
}

impl<'conn> SqliteStore<'conn> {
    /// Binds the adapter to a connection that is inside the caller's transaction.
    pub fn new(conn: &'conn Connection, schema: &'conn Schema) -> Result<Self> {
        schema.validate()?;
        let columns = [
            &schema.id,
            &schema.parent_id,
            &schema.left,
            &schema.right,
            &schema.level,
            &schema.name,
            &schema.properties,
        ]
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(", ");
        Ok(Self {
            conn,
            schema,
            columns,
        })
    }

    /// The column binding in use.
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    fn query_nodes(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params_from_iter(params), row_to_node)?;
        let mut nodes = Vec::new();
        for node in rows {
            nodes.push(node?);
        }
        Ok(nodes)
    }

    fn where_clause(&self, predicate: &Predicate, params: &mut Vec<Value>) -> String {
        if predicate.clauses().is_empty() {
            return String::new();
        }
        let mut parts = Vec::with_capacity(predicate.clauses().len());
        for (field, cmp, value) in predicate.clauses() {
            params.push(Value::Integer(*value));
            parts.push(format!(
                "{} {} ?{}",
                quote(self.schema.column(*field)),
                cmp.sql(),
                params.len()
            ));
        }
        format!(" WHERE {}", parts.join(" AND "))
    }

    fn set_clause(&self, changes: &Changeset, params: &mut Vec<Value>) -> String {
        let mut parts = Vec::with_capacity(changes.assignments().len() + 1);
        for (field, assign) in changes.assignments() {
            let column = quote(self.schema.column(*field));
            let operand = match assign {
                Assign::Value(v) | Assign::Add(v) | Assign::NegateAdd(v) => *v,
            };
            params.push(Value::Integer(operand));
            let n = params.len();
            let expr = match assign {
                Assign::Value(_) => format!("?{n}"),
                Assign::Add(_) => format!("{column} + ?{n}"),
                Assign::NegateAdd(_) => format!("-({column} + ?{n})"),
            };
            parts.push(format!("{column} = {expr}"));
        }
        if let Some(parent) = changes.parent_assignment() {
            params.push(match parent {
                Some(id) => Value::Integer(id.0 as i64),
                None => Value::Null,
            });
            parts.push(format!("{} = ?{}", quote(&self.schema.parent_id), params.len()));
        }
        parts.join(", ")
    }
}

impl TreeStore for SqliteStore<'_> {
    type Node = Node;

    fn get_by_id(&self, id: NodeId) -> Result<Option<Node>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.columns, quote(&self.schema.table), quote(&self.schema.id)
        );
        Ok(self
            .query_nodes(&sql, vec![Value::Integer(id.0 as i64)])?
            .into_iter()
            .next())
    }

    fn get_max_right(&self) -> Result<Option<Node>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} DESC LIMIT 1",
            self.columns, quote(&self.schema.table), quote(&self.schema.right)
        );
        Ok(self.query_nodes(&sql, Vec::new())?.into_iter().next())
    }

    fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>> {
        let mut params = Vec::new();
        let filter = self.where_clause(predicate, &mut params);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} ASC",
            self.columns, quote(&self.schema.table), filter, quote(&self.schema.left)
        );
        self.query_nodes(&sql, params)
    }

    fn create(&mut self, node: &Node) -> Result<NodeId> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            quote(&self.schema.table),
            quote(&self.schema.parent_id),
            quote(&self.schema.left),
            quote(&self.schema.right),
            quote(&self.schema.level),
            quote(&self.schema.name),
            quote(&self.schema.properties)
        );
        let parent = match node.parent_id {
            Some(id) => Value::Integer(id.0 as i64),
            None => Value::Null,
        };
        let params = vec![
            parent,
            Value::Integer(node.interval.left),
            Value::Integer(node.interval.right),
            Value::Integer(node.interval.level),
            Value::Text(node.name.clone()),
            Value::Text(properties_to_json(&node.properties)?),
        ];
        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(params))?;
        let id = NodeId(self.conn.last_insert_rowid() as u64);
        trace!(node = %id, interval = %node.interval, "sqlite row created");
        Ok(id)
    }

    fn update_fields(&mut self, id: NodeId, changes: &Changeset) -> Result<()> {
        if changes.is_empty() {
            return match self.get_by_id(id)? {
                Some(_) => Ok(()),
                None => Err(NestedSetError::NotFound(id)),
            };
        }
        let mut params = Vec::new();
        let set = self.set_clause(changes, &mut params);
        params.push(Value::Integer(id.0 as i64));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote(&self.schema.table),
            set,
            quote(&self.schema.id),
            params.len()
        );
        let touched = self
            .conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(params))?;
        if touched == 0 {
            return Err(NestedSetError::NotFound(id));
        }
        Ok(())
    }

    fn update_where(&mut self, predicate: &Predicate, changes: &Changeset) -> Result<u64> {
        if changes.is_empty() {
            return Ok(0);
        }
        let mut params = Vec::new();
        let set = self.set_clause(changes, &mut params);
        let filter = self.where_clause(predicate, &mut params);
        let sql = format!("UPDATE {} SET {}{}", quote(&self.schema.table), set, filter);
        let touched = self
            .conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(params))?;
        trace!(%predicate, rows = touched, "sqlite range update");
        Ok(touched as u64)
    }

    fn delete_where(&mut self, predicate: &Predicate) -> Result<u64> {
        let mut params = Vec::new();
        let filter = self.where_clause(predicate, &mut params);
        let sql = format!("DELETE FROM {}{}", quote(&self.schema.table), filter);
        let removed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(params))?;
        trace!(%predicate, rows = removed, "sqlite range delete");
        Ok(removed as u64)
    }
}

/// Runs `f` inside an `IMMEDIATE` transaction, the single writer for the forest.
///
/// Commits when `f` succeeds; rolls back and returns the original error otherwise.
pub fn write_transaction<T>(
    conn: &mut Connection,
    schema: &Schema,
    f: impl FnOnce(&mut SqliteStore<'_>) -> Result<T>,
) -> Result<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = {
        let mut store = SqliteStore::new(&tx, schema)?;
        f(&mut store)
    };
    match outcome {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "rollback after failed tree mutation also failed");
            }
            Err(err)
        }
    }
}

/// Identifiers are validated by [`Schema::validate`], so quoting never needs escaping.
fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<Node> {
    let id: i64 = row.get(0)?;
    let parent: Option<i64> = row.get(1)?;
    let properties_json: String = row.get(6)?;
    let properties = json_to_properties(&properties_json)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?;
    Ok(Node {
        id: NodeId(id as u64),
        parent_id: parent.map(|p| NodeId(p as u64)),
        interval: Interval::new(row.get(2)?, row.get(3)?, row.get(4)?),
        name: row.get(5)?,
        properties,
    })
}

fn properties_to_json(properties: &BTreeMap<String, PropertyValue>) -> Result<String> {
    let mut map = serde_json::Map::new();
    for (key, value) in properties {
        map.insert(key.clone(), property_value_to_json(value));
    }
    Ok(serde_json::to_string(&map)?)
}

fn property_value_to_json(value: &PropertyValue) -> serde_json::Value {
    match value {
        PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
        PropertyValue::Int(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
        // JSON numbers cannot hold NaN or the infinities.
        PropertyValue::Float(f) => match serde_json::Number::from_f64(*f) {
            Some(n) => serde_json::Value::Number(n),
            None => tagged(FLOAT_TAG, f.to_string()),
        },
        PropertyValue::String(s) => serde_json::Value::String(s.clone()),
        PropertyValue::Bytes(bytes) => tagged(
            BYTES_TAG,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        ),
    }
}

fn tagged(tag: &str, payload: String) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(tag.to_string(), serde_json::Value::String(payload));
    serde_json::Value::Object(map)
}

fn json_to_properties(
    json: &str,
) -> std::result::Result<BTreeMap<String, PropertyValue>, serde_json::Error> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
    Ok(map
        .into_iter()
        .map(|(key, value)| (key, json_to_property_value(value)))
        .collect())
}

fn json_to_property_value(value: serde_json::Value) -> PropertyValue {
    match value {
        serde_json::Value::Bool(b) => PropertyValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                PropertyValue::Int(i)
            } else {
                PropertyValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => PropertyValue::String(s),
        serde_json::Value::Object(map) => {
            let decoded = match (map.len(), map.iter().next()) {
                (1, Some((tag, serde_json::Value::String(payload)))) => match tag.as_str() {
                    BYTES_TAG => base64::engine::general_purpose::STANDARD
                        .decode(payload)
                        .ok()
                        .map(PropertyValue::Bytes),
                    FLOAT_TAG => payload.parse::<f64>().ok().map(PropertyValue::Float),
                    _ => None,
                },
                _ => None,
            };
            decoded
                .unwrap_or_else(|| PropertyValue::String(serde_json::Value::Object(map).to_string()))
        }
        other => PropertyValue::String(other.to_string()),
    }
}

//! Column binding for SQL-backed forests.

use serde::Deserialize;

use super::Field;
use crate::types::{NestedSetError, Result};

/// Names the table and columns that hold each semantic field of a node row.
///
/// Resolved once when a store is built; every statement the adapter issues
/// is assembled from these names.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Schema {
    /// Table holding the forest.
    pub table: String,
    /// Integer primary key column.
    pub id: String,
    /// Nullable parent reference column.
    pub parent_id: String,
    /// Opening boundary column.
    pub left: String,
    /// Closing boundary column.
    pub right: String,
    /// Depth column.
    pub level: String,
    /// Display name column.
    pub name: String,
    /// JSON payload column.
    pub properties: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            table: "nodes".into(),
            id: "id".into(),
            parent_id: "parent_id".into(),
            left: "lft".into(),
            right: "rgt".into(),
            level: "lvl".into(),
            name: "name".into(),
            properties: "properties".into(),
        }
    }
}

impl Schema {
    /// Uses `table` with the default column names.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Parses a binding from TOML; omitted keys keep their defaults.
    ///
    /// ```
    /// let schema = nestset::Schema::from_toml_str(r#"
    ///     table = "taxons"
    ///     left = "tree_left"
    ///     right = "tree_right"
    ///     level = "tree_level"
    /// "#).unwrap();
    /// assert_eq!(schema.table, "taxons");
    /// assert_eq!(schema.parent_id, "parent_id");
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let schema: Schema =
            toml::from_str(raw).map_err(|err| NestedSetError::Config(err.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Rejects names that are not plain SQL identifiers or that collide.
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("table", &self.table),
            ("id", &self.id),
            ("parent_id", &self.parent_id),
            ("left", &self.left),
            ("right", &self.right),
            ("level", &self.level),
            ("name", &self.name),
            ("properties", &self.properties),
        ];
        for (role, name) in columns {
            if !is_identifier(name) {
                return Err(NestedSetError::InvalidSchema(format!(
                    "{role} column `{name}` is not a plain identifier"
                )));
            }
        }
        let mut seen: Vec<&str> = Vec::with_capacity(columns.len() - 1);
        for (role, name) in &columns[1..] {
            if seen.contains(&name.as_str()) {
                return Err(NestedSetError::InvalidSchema(format!(
                    "{role} column `{name}` is bound twice"
                )));
            }
            seen.push(name);
        }
        Ok(())
    }

    /// Column holding `field`.
    pub fn column(&self, field: Field) -> &str {
        match field {
            Field::Left => &self.left,
            Field::Right => &self.right,
            Field::Level => &self.level,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

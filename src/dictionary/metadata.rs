//! Core data structures for an extracted data dictionary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Metadata for a single column, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Catalog type name (e.g. "integer", "character varying")
    pub data_type: String,

    /// Whether the column accepts NULL
    pub is_nullable: bool,

    /// Default expression as text, if the column has one
    pub default_value: Option<String>,
}

impl ColumnInfo {
    pub fn new(data_type: impl Into<String>, is_nullable: bool, default_value: Option<String>) -> Self {
        Self {
            data_type: data_type.into(),
            is_nullable,
            default_value,
        }
    }
}

/// Columns and primary key of one table.
///
/// Every entry of `primary_keys` is also a key of `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Columns in declaration order
    pub columns: IndexMap<String, ColumnInfo>,

    /// Primary key columns in key order
    pub primary_keys: Vec<String>,
}

impl TableInfo {
    /// Build a table from its column listing and its key column names.
    ///
    /// Key columns missing from `columns` are dropped, as are repeated key
    /// entries.
    pub fn new(columns: IndexMap<String, ColumnInfo>, primary_keys: Vec<String>) -> Self {
        let mut keys: Vec<String> = Vec::with_capacity(primary_keys.len());
        for key in primary_keys {
            if !columns.contains_key(&key) {
                tracing::warn!("Primary key column '{key}' not found among table columns, skipping");
                continue;
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Self {
            columns,
            primary_keys: keys,
        }
    }

    /// Whether `column` is part of the primary key.
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|k| k == column)
    }
}

/// Qualified table name (`schema.table`) to table metadata, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDictionary {
    tables: IndexMap<String, TableInfo>,
}

impl DataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table under its qualified name. Returns the previous entry for
    /// that name, if any.
    pub fn insert(&mut self, schema: &str, table: &str, info: TableInfo) -> Option<TableInfo> {
        self.tables.insert(qualified_name(schema, table), info)
    }

    pub fn get(&self, qualified: &str) -> Option<&TableInfo> {
        self.tables.get(qualified)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Qualified names in extraction order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Tables in extraction order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, TableInfo> {
        self.tables.iter()
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

impl<'a> IntoIterator for &'a DataDictionary {
    type Item = (&'a String, &'a TableInfo);
    type IntoIter = indexmap::map::Iter<'a, String, TableInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// `schema.table`
///
/// A part containing `.` or `"` is double-quoted the way PostgreSQL quotes
/// identifiers, so `"a.b".c` and `a."b.c"` stay distinct.
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_part(schema), quote_part(table))
}

fn quote_part(name: &str) -> Cow<'_, str> {
    if name.contains(['.', '"']) {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(data_type: &str) -> ColumnInfo {
        ColumnInfo::new(data_type, true, None)
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("public", "users"), "public.users");
        assert_eq!(qualified_name("a.b", "c"), r#""a.b".c"#);
        assert_eq!(qualified_name("a", "b.c"), r#"a."b.c""#);
        assert_eq!(qualified_name("public", r#"say "hi""#), r#"public."say ""hi""""#);
    }

    #[test]
    fn test_dotted_names_do_not_collide() {
        let mut dict = DataDictionary::new();
        assert!(dict.insert("a.b", "c", TableInfo::default()).is_none());
        assert!(dict.insert("a", "b.c", TableInfo::default()).is_none());
        assert_eq!(dict.len(), 2);
        assert!(dict.get(r#""a.b".c"#).is_some());
        assert!(dict.get(r#"a."b.c""#).is_some());
    }

    #[test]
    fn test_table_info_drops_unknown_key_columns() {
        let mut columns = IndexMap::new();
        columns.insert("id".to_owned(), column("integer"));
        columns.insert("name".to_owned(), column("text"));

        let table = TableInfo::new(
            columns,
            vec!["id".to_owned(), "ghost".to_owned(), "id".to_owned()],
        );

        assert_eq!(table.primary_keys, vec!["id".to_owned()]);
        assert!(table.is_primary_key("id"));
        assert!(!table.is_primary_key("name"));
    }

    #[test]
    fn test_dictionary_keeps_insertion_order() {
        let mut dict = DataDictionary::new();
        dict.insert("s2", "b", TableInfo::default());
        dict.insert("s1", "a", TableInfo::default());

        let names: Vec<&str> = dict.table_names().collect();
        assert_eq!(names, vec!["s2.b", "s1.a"]);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_dictionary_serializes_as_map() -> serde_json::Result<()> {
        let mut columns = IndexMap::new();
        columns.insert("id".to_owned(), ColumnInfo::new("integer", false, None));
        let mut dict = DataDictionary::new();
        dict.insert("public", "users", TableInfo::new(columns, vec!["id".to_owned()]));

        let json = serde_json::to_value(&dict)?;
        assert_eq!(json["public.users"]["primary_keys"][0], "id");
        assert_eq!(json["public.users"]["columns"]["id"]["is_nullable"], false);
        assert!(json["public.users"]["columns"]["id"]["default_value"].is_null());
        Ok(())
    }
}

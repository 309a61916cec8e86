//! Walks the catalog of a database and builds a [`DataDictionary`].

use super::metadata::{ColumnInfo, DataDictionary, TableInfo, qualified_name};
use crate::error::{Result, ResultExt as _};
use indexmap::IndexMap;

/// One row of a column listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_value: Option<String>,
}

/// Read access to the catalog of a live database session.
///
/// Implementations scope every lookup by schema. An unknown schema or table
/// yields an empty listing, not an error.
#[expect(async_fn_in_trait, reason = "only used through generics, never boxed")]
pub trait CatalogSource {
    /// Names of the tables in `schema`.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// Columns of `schema.table` in declaration order.
    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<CatalogColumn>>;

    /// Names of the primary-key columns of `schema.table`, in key order.
    async fn list_primary_keys(&self, schema: &str, table: &str) -> Result<Vec<String>>;
}

/// Build the dictionary for `schemas`, in the order given.
///
/// The first failing query aborts the extraction; no partial dictionary is
/// returned.
///
/// # Errors
///
/// Returns the error of the first catalog query that fails.
pub async fn extract<C, S>(catalog: &C, schemas: &[S]) -> Result<DataDictionary>
where
    C: CatalogSource,
    S: AsRef<str>,
{
    let mut dictionary = DataDictionary::new();

    for schema in schemas {
        let schema = schema.as_ref();
        let tables = catalog
            .list_tables(schema)
            .await
            .with_context(|| format!("Failed to list tables of schema '{schema}'"))?;

        tracing::info!("Schema '{schema}': {} table(s)", tables.len());

        for table in tables {
            let info = extract_table(catalog, schema, &table).await?;
            tracing::debug!(
                "{}: {} column(s), primary key {:?}",
                qualified_name(schema, &table),
                info.columns.len(),
                info.primary_keys
            );
            if dictionary.insert(schema, &table, info).is_some() {
                tracing::warn!(
                    "Table {} listed twice, keeping the last listing",
                    qualified_name(schema, &table)
                );
            }
        }
    }

    Ok(dictionary)
}

async fn extract_table<C: CatalogSource>(catalog: &C, schema: &str, table: &str) -> Result<TableInfo> {
    let columns = catalog
        .list_columns(schema, table)
        .await
        .with_context(|| format!("Failed to list columns of {}", qualified_name(schema, table)))?;

    let columns: IndexMap<String, ColumnInfo> = columns
        .into_iter()
        .map(|c| {
            (
                c.name,
                ColumnInfo::new(c.data_type, c.is_nullable, c.default_value),
            )
        })
        .collect();

    let primary_keys = catalog
        .list_primary_keys(schema, table)
        .await
        .with_context(|| {
            format!(
                "Failed to list primary key of {}",
                qualified_name(schema, table)
            )
        })?;

    Ok(TableInfo::new(columns, primary_keys))
}

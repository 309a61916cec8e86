//! Text of the title and column rows, shared by every output format.

use super::metadata::{ColumnInfo, TableInfo};

pub const DOCUMENT_TITLE: &str = "Data Dictionary";

/// Written in place of a missing default value.
pub const NO_DEFAULT: &str = "None";

pub fn table_title(qualified_name: &str) -> String {
    format!("Tabela: {qualified_name}")
}

/// `YES`/`NO`, as the catalog reports it.
pub fn nullability(is_nullable: bool) -> &'static str {
    if is_nullable { "YES" } else { "NO" }
}

pub fn column_line(name: &str, column: &ColumnInfo, is_primary_key: bool) -> String {
    let mut line = format!(
        "Coluna: {name}, Tipo de Dados: {}, Nulo: {}, Valor Padrão: {}",
        column.data_type,
        nullability(column.is_nullable),
        column.default_value.as_deref().unwrap_or(NO_DEFAULT)
    );
    if is_primary_key {
        line.push_str(", Chave Primária: Sim");
    }
    line
}

/// One line per column of `table`, in column order.
pub fn column_lines(table: &TableInfo) -> Vec<String> {
    table
        .columns
        .iter()
        .map(|(name, column)| column_line(name, column, table.is_primary_key(name)))
        .collect()
}

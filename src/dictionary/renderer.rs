//! Markdown rendering for data dictionaries.
//!
//! Generates the same content as the PDF document in a form that diffs well
//! and renders on any code host.

use super::labels;
use super::metadata::DataDictionary;
use chrono::{DateTime, Utc};

/// Render a data dictionary as Markdown documentation.
///
/// Generates:
/// - a title and generation timestamp
/// - one section per table, in dictionary order, with its primary key and
///   one bullet per column
pub fn render_markdown(dict: &DataDictionary, generated_at: DateTime<Utc>) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", labels::DOCUMENT_TITLE));
    md.push_str(&format!(
        "> **Generated:** {}  \n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "> **Tables:** {} | **Columns:** {}\n\n",
        dict.len(),
        dict.column_count()
    ));

    if dict.is_empty() {
        md.push_str("*No tables found.*\n");
        return md;
    }

    for (name, table) in dict {
        md.push_str(&format!("## {}\n\n", labels::table_title(name)));

        if table.primary_keys.is_empty() {
            md.push_str("**Primary Key:** *none*\n\n");
        } else {
            let keys: Vec<String> = table.primary_keys.iter().map(|k| format!("`{k}`")).collect();
            md.push_str(&format!("**Primary Key:** {}\n\n", keys.join(", ")));
        }

        for line in labels::column_lines(table) {
            md.push_str(&format!("- {line}\n"));
        }
        md.push_str("\n---\n\n");
    }

    md
}

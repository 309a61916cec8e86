//! Data dictionary extraction and rendering.
//!
//! A [`DataDictionary`] maps each qualified table name (`schema.table`) to its
//! columns and primary key. It is built by [`extract`] from any
//! [`CatalogSource`] and rendered as PDF, Markdown or JSON.
//!
//! ## Usage
//!
//! ```no_run
//! use pgdict::dictionary::{extract, pdf};
//! # use pgdict::dictionary::CatalogSource;
//! use std::path::Path;
//!
//! # async fn example(catalog: &impl CatalogSource) -> pgdict::error::Result<()> {
//! let dictionary = extract(catalog, &["public", "billing"]).await?;
//! pdf::render(&dictionary, Path::new("data_dictionary.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod extractor;
pub mod labels;
pub mod layout;
pub mod metadata;
pub mod pdf;
pub mod renderer;
pub mod storage;

pub use extractor::{CatalogColumn, CatalogSource, extract};
pub use metadata::{ColumnInfo, DataDictionary, TableInfo, qualified_name};
pub use renderer::render_markdown;
pub use storage::{save_json, write_atomically};

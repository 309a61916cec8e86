//! # pgdict - data dictionaries for PostgreSQL
//!
//! pgdict reaches a PostgreSQL database through an SSH tunnel, reads the
//! catalog of the requested schemas, and writes a data dictionary: one block
//! per table listing every column with its type, nullability and default,
//! and its primary key.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pgdict::config::AppConfig;
//!
//! # async fn example() -> pgdict::error::Result<()> {
//! // SSH_*, POSTGRES_* and optional DICTIONARY_* variables, or a .env file
//! let config = AppConfig::load(None)?;
//! let report = pgdict::pipeline::generate(&config).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`config`]: configuration from the environment
//! - [`tunnel`]: SSH local port forwarding
//! - [`db`]: the database session and its catalog queries
//! - [`dictionary`]: the dictionary model, extraction and rendering
//! - [`pipeline`]: the end-to-end run
//! - [`error`]: error types
//! - [`logging`]: console and file logging

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod db;
pub mod dictionary;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod tunnel;

//! The end-to-end run: tunnel → database → extract → close → render → write.
//!
//! # Example
//!
//! ```no_run
//! use pgdict::config::AppConfig;
//! use pgdict::pipeline::generate;
//!
//! # async fn example() -> pgdict::error::Result<()> {
//! let config = AppConfig::load(None)?;
//! let report = generate(&config).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

use crate::config::{AppConfig, OutputFormat};
use crate::db::DbClient;
use crate::dictionary::{self, DataDictionary, pdf};
use crate::error::Result;
use crate::tunnel::SshTunnel;
use secrecy::ExposeSecret as _;
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const APPLICATION_NAME: &str = "pgdict";
const TUNNEL_LOCAL_HOST: &str = "127.0.0.1";

/// Report generated after a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the document was written
    pub output: PathBuf,

    pub format: OutputFormat,

    /// Number of tables documented
    pub tables: usize,

    /// Number of columns documented, across all tables
    pub columns: usize,

    /// Wall time of the whole run
    pub duration: Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Documented {} table(s), {} column(s) in {:.2}s -> {}",
            self.tables,
            self.columns,
            self.duration.as_secs_f64(),
            self.output.display()
        )
    }
}

/// Extract the configured schemas and write the document.
///
/// # Errors
///
/// Returns the first tunnel, database, render or I/O error. Nothing is
/// written unless extraction succeeded.
pub async fn generate(config: &AppConfig) -> Result<RunReport> {
    let started = Instant::now();

    let dictionary = extract_via_tunnel(config).await?;

    let output = config.output_path();
    write_output(&dictionary, config.format, &output)?;

    Ok(RunReport {
        output,
        format: config.format,
        tables: dictionary.len(),
        columns: dictionary.column_count(),
        duration: started.elapsed(),
    })
}

/// Open the tunnel and a database session, extract, and close both whatever
/// the outcome.
///
/// # Errors
///
/// Returns a `Tunnel` or `Database` error; no partial dictionary is returned.
pub async fn extract_via_tunnel(config: &AppConfig) -> Result<DataDictionary> {
    let tunnel = SshTunnel::open(
        &config.tunnel,
        &config.database.host,
        config.database.port,
        config.connect_timeout,
    )
    .await?;

    let result = extract_from_database(config, tunnel.local_port()).await;
    tunnel.close().await;
    result
}

async fn extract_from_database(config: &AppConfig, local_port: u16) -> Result<DataDictionary> {
    let db = &config.database;
    let options = PgConnectOptions::new()
        .host(TUNNEL_LOCAL_HOST)
        .port(local_port)
        .username(&db.user)
        .password(db.password.expose_secret())
        .database(&db.database)
        .application_name(APPLICATION_NAME);

    let client = DbClient::connect(options, config.connect_timeout).await?;
    tracing::info!("Connected to database '{}' as '{}'", db.database, db.user);

    let result = dictionary::extract(&client, &config.schemas).await;
    client.close().await;
    result
}

/// Render `dictionary` in `format` to `path`.
///
/// # Errors
///
/// Returns a `Render` or `Io` error.
pub fn write_output(dictionary: &DataDictionary, format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Pdf => pdf::render(dictionary, path),
        OutputFormat::Markdown => {
            let markdown = dictionary::render_markdown(dictionary, chrono::Utc::now());
            dictionary::write_atomically(path, markdown.as_bytes())
        }
        OutputFormat::Json => dictionary::save_json(dictionary, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let report = RunReport {
            output: PathBuf::from("data_dictionary.pdf"),
            format: OutputFormat::Pdf,
            tables: 3,
            columns: 17,
            duration: Duration::from_millis(1500),
        };
        assert_eq!(
            report.summary(),
            "Documented 3 table(s), 17 column(s) in 1.50s -> data_dictionary.pdf"
        );
    }
}
